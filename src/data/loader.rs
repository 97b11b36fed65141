use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use ndarray::Array1;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{Data, DataOptions, StripSort};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which columns hold x and y, and the clean-up applied after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Column holding x; the first column when `None`.
    pub x_column: Option<String>,
    /// Column holding y; the second column when `None`.
    pub y_column: Option<String>,
    /// Field delimiter for text tables.
    pub delimiter: char,
    pub strip_sort: StripSort,
    pub interp_full: Option<f64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            x_column: None,
            y_column: None,
            delimiter: ',',
            strip_sort: StripSort::None,
            interp_full: None,
        }
    }
}

impl LoadOptions {
    /// Select x and y by column name.
    pub fn columns(x: &str, y: &str) -> Self {
        Self {
            x_column: Some(x.to_string()),
            y_column: Some(y.to_string()),
            ..Self::default()
        }
    }

    fn data_options(&self) -> DataOptions {
        DataOptions {
            strip_sort: self.strip_sort,
            interp_full: self.interp_full,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one x/y series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – header row, one numeric column per field
/// * `.json`         – `{ "x": [...], "y": [...] }` or `[[x, y], ...]`
/// * `.parquet`      – flat numeric columns
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Data> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (x, y) = match ext.as_str() {
        "csv" | "txt" => load_csv(path, options)?,
        "json" => load_json(path, options)?,
        "parquet" | "pq" => load_parquet(path, options)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let data = Data::from_columns(Array1::from_vec(x), Array1::from_vec(y))?
        .with_options(&options.data_options())
        .with_context(|| format!("preparing data from {}", path.display()))?;
    log::info!("Loaded {} rows from {}", data.len(), path.display());
    Ok(data)
}

/// Position of the requested column among `names`, or `fallback` when unnamed.
fn column_index(names: &[String], wanted: Option<&str>, fallback: usize) -> Result<usize> {
    match wanted {
        Some(name) => names
            .iter()
            .position(|n| n == name)
            .with_context(|| format!("missing '{name}' column, found {names:?}")),
        None => {
            if fallback >= names.len() {
                bail!(
                    "expected at least {} columns, found {}",
                    fallback + 1,
                    names.len()
                );
            }
            Ok(fallback)
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one sample per row.
/// Empty cells are read as NaN.
fn load_csv(path: &Path, options: &LoadOptions) -> Result<(Vec<f64>, Vec<f64>)> {
    let delimiter = u8::try_from(options.delimiter).context("delimiter must be a single byte")?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let x_idx = column_index(&headers, options.x_column.as_deref(), 0)?;
    let y_idx = column_index(&headers, options.y_column.as_deref(), 1)?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        x.push(parse_cell(record.get(x_idx).unwrap_or(""), row_no, &headers[x_idx])?);
        y.push(parse_cell(record.get(y_idx).unwrap_or(""), row_no, &headers[y_idx])?);
    }
    Ok((x, y))
}

fn parse_cell(s: &str, row: usize, col: &str) -> Result<f64> {
    if s.is_empty() {
        return Ok(f64::NAN);
    }
    s.parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Accepted JSON layouts:
///
/// ```json
/// { "x": [0.0, 0.1, ...], "y": [1.2, 1.3, ...] }
/// ```
///
/// or rows of pairs:
///
/// ```json
/// [[0.0, 1.2], [0.1, 1.3]]
/// ```
///
/// `null` entries are read as NaN.
fn load_json(path: &Path, options: &LoadOptions) -> Result<(Vec<f64>, Vec<f64>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match &root {
        JsonValue::Object(obj) => {
            let x_key = options.x_column.as_deref().unwrap_or("x");
            let y_key = options.y_column.as_deref().unwrap_or("y");
            let x = json_array_to_f64(obj.get(x_key), x_key)?;
            let y = json_array_to_f64(obj.get(y_key), y_key)?;
            if x.len() != y.len() {
                bail!("'{x_key}' has {} values but '{y_key}' has {}", x.len(), y.len());
            }
            Ok((x, y))
        }
        JsonValue::Array(rows) => {
            let mut x = Vec::with_capacity(rows.len());
            let mut y = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let pair = row
                    .as_array()
                    .filter(|p| p.len() == 2)
                    .with_context(|| format!("Row {i} is not an [x, y] pair"))?;
                x.push(json_number(&pair[0]).with_context(|| format!("Row {i}, x: not a number"))?);
                y.push(json_number(&pair[1]).with_context(|| format!("Row {i}, y: not a number"))?);
            }
            Ok((x, y))
        }
        _ => bail!("Expected a JSON object of columns or an array of [x, y] rows"),
    }
}

fn json_array_to_f64(val: Option<&JsonValue>, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| json_number(v).with_context(|| format!("{col}[{j}]: not a number")))
        .collect()
}

fn json_number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Null => Some(f64::NAN),
        other => other.as_f64(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat numeric columns.
///
/// Float64, Float32, Int64 and Int32 columns are accepted and widened to
/// `f64`; nulls become NaN. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<(Vec<f64>, Vec<f64>)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut x = Vec::new();
    let mut y = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

        let x_idx = column_index(&names, options.x_column.as_deref(), 0)?;
        let y_idx = column_index(&names, options.y_column.as_deref(), 1)?;

        extend_f64(&mut x, batch.column(x_idx))
            .with_context(|| format!("failed to read '{}'", names[x_idx]))?;
        extend_f64(&mut y, batch.column(y_idx))
            .with_context(|| format!("failed to read '{}'", names[y_idx]))?;
    }

    Ok((x, y))
}

/// Append a numeric Arrow column to `out`, widening to `f64`.
fn extend_f64(out: &mut Vec<f64>, col: &Arc<dyn Array>) -> Result<()> {
    match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)));
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
        }
        other => bail!("Expected a numeric column, got {other:?}"),
    }
    Ok(())
}
