use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use giga_data::{linspace, save_data, Data, SaveOptions};
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

/// Settings for the synthetic sweeps; every field has a default.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct SampleConfig {
    /// Sample temperatures in kelvin, one sweep each.
    temperatures: Vec<f64>,
    /// Field sweeps run from `-max_field` to `max_field` tesla.
    max_field: f64,
    points: usize,
    /// Zero-field resistance in ohms.
    r0: f64,
    noise: f64,
    seed: u64,
    output_dir: PathBuf,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            temperatures: vec![1.75, 2.0, 2.25, 2.5, 2.75, 3.0],
            max_field: 14.0,
            points: 701,
            r0: 120.0,
            noise: 0.05,
            seed: 42,
            output_dir: PathBuf::from("."),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SampleConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text).context("parsing config")
        }
        None => Ok(SampleConfig::default()),
    }
}

/// Quadratic magnetoresistance that weakens with temperature.
fn resistance(field: f64, temperature: f64, r0: f64) -> f64 {
    r0 * (1.0 + 0.02 * field.powi(2) / temperature)
}

fn write_parquet(path: &Path, data: &Data) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("field", DataType::Float64, false),
        Field::new("resistance", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(data.x().to_vec())),
            Arc::new(Float64Array::from(data.y().to_vec())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise).context("invalid noise level")?;

    let field = linspace(-config.max_field, config.max_field, config.points);

    let mut sweeps = Vec::with_capacity(config.temperatures.len());
    let mut names = Vec::with_capacity(config.temperatures.len());
    for &temp in &config.temperatures {
        let r = field.mapv(|b| resistance(b, temp, config.r0) + noise.sample(&mut rng));
        let sweep = Data::from_columns(field.clone(), r)?;

        let name = format!("{temp:.2}K");
        let parquet_path = config.output_dir.join(format!("sweep_{name}.parquet"));
        write_parquet(&parquet_path, &sweep)?;
        log::info!("Wrote {}", parquet_path.display());

        sweeps.push(sweep);
        names.push(name);
    }

    let csv_path = config.output_dir.join("sweeps.csv");
    let options = SaveOptions {
        x_name: "Field".to_string(),
        y_name: "Resistance".to_string(),
        ..SaveOptions::default()
    };
    save_data(&csv_path, &sweeps, &names, &options)?;

    println!(
        "Wrote {} sweeps ({} points each) to {}",
        sweeps.len(),
        config.points,
        csv_path.display()
    );
    Ok(())
}
