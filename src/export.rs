use std::fs::File;
use std::io::Write;
use std::path::Path;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::data::Data;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Column naming and formatting for CSV export.
///
/// Each saved container contributes the columns
/// `{name}{name_space}{x_name}` and `{name}{name_space}{y_name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    pub x_name: String,
    pub y_name: String,
    pub name_space: String,
    pub delimiter: char,
    /// Text written for NaN, including the padding of short columns.
    pub na_rep: String,
    /// Write a leading row-number column with a blank header.
    pub index: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            x_name: "X".to_string(),
            y_name: "Y".to_string(),
            name_space: "_".to_string(),
            delimiter: ',',
            na_rep: String::new(),
            index: false,
        }
    }
}

impl SaveOptions {
    /// Defaults for [`save_dict`]: names joined with `/`.
    pub fn for_dict() -> Self {
        Self {
            name_space: "/".to_string(),
            ..Self::default()
        }
    }

    fn column_names(&self, name: &str) -> [String; 2] {
        [
            format!("{name}{}{}", self.name_space, self.x_name),
            format!("{name}{}{}", self.name_space, self.y_name),
        ]
    }
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

/// Write 1-D arrays as the columns of a delimited table.
///
/// Shorter arrays are padded with NaN to the length of the longest.
pub fn write_arrays<W: Write, S: AsRef<str>>(
    writer: W,
    arrays: &[ArrayView1<'_, f64>],
    column_names: &[S],
    options: &SaveOptions,
) -> Result<()> {
    if arrays.len() != column_names.len() {
        return Err(DataError::value(format!(
            "array_list and column_names are not the same length ({} and {})",
            arrays.len(),
            column_names.len()
        )));
    }
    if arrays.is_empty() {
        return Err(DataError::value("there are no arrays to save"));
    }
    let delimiter = u8::try_from(options.delimiter)
        .map_err(|_| DataError::value(format!("delimiter {:?} is not a single byte", options.delimiter)))?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let mut header: Vec<&str> = Vec::with_capacity(arrays.len() + 1);
    if options.index {
        header.push("");
    }
    header.extend(column_names.iter().map(|n| n.as_ref()));
    wtr.write_record(&header)?;

    let rows = arrays.iter().map(|a| a.len()).max().unwrap_or(0);
    let mut record: Vec<String> = Vec::with_capacity(header.len());
    for i in 0..rows {
        record.clear();
        if options.index {
            record.push(i.to_string());
        }
        for arr in arrays {
            let v = arr.get(i).copied().unwrap_or(f64::NAN);
            record.push(format_value(v, &options.na_rep));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// [`write_arrays`] into a new file at `path`.
pub fn save_arrays<S: AsRef<str>>(
    path: impl AsRef<Path>,
    arrays: &[ArrayView1<'_, f64>],
    column_names: &[S],
    options: &SaveOptions,
) -> Result<()> {
    let path = path.as_ref();
    write_arrays(File::create(path)?, arrays, column_names, options)?;
    log::info!("Wrote {} columns to {}", arrays.len(), path.display());
    Ok(())
}

fn format_value(v: f64, na_rep: &str) -> String {
    if v.is_nan() {
        na_rep.to_string()
    } else {
        format!("{v:?}")
    }
}

// ---------------------------------------------------------------------------
// Data containers
// ---------------------------------------------------------------------------

/// Write named containers side by side, an x and a y column per container.
pub fn write_data<W: Write>(writer: W, entries: &[(&str, &Data)], options: &SaveOptions) -> Result<()> {
    let mut arrays = Vec::with_capacity(entries.len() * 2);
    let mut names = Vec::with_capacity(entries.len() * 2);
    for (name, data) in entries {
        let (x, y) = data.both();
        arrays.push(x);
        arrays.push(y);
        names.extend(options.column_names(name));
    }
    write_arrays(writer, &arrays, &names, options)
}

/// Save a list of containers with one name each.
pub fn save_data<S: AsRef<str>>(
    path: impl AsRef<Path>,
    data_list: &[Data],
    data_names: &[S],
    options: &SaveOptions,
) -> Result<()> {
    if data_list.len() != data_names.len() {
        return Err(DataError::value(format!(
            "data_list and data_names are not the same length ({} and {})",
            data_list.len(),
            data_names.len()
        )));
    }
    let entries: Vec<(&str, &Data)> = data_names
        .iter()
        .map(|n| n.as_ref())
        .zip(data_list.iter())
        .collect();
    save_entries(path.as_ref(), &entries, options)
}

/// Save `(name, data)` pairs in iteration order, e.g. from a `BTreeMap`.
pub fn save_dict<'a, I, K>(path: impl AsRef<Path>, entries: I, options: &SaveOptions) -> Result<()>
where
    I: IntoIterator<Item = (K, &'a Data)>,
    K: AsRef<str> + 'a,
{
    let owned: Vec<(K, &Data)> = entries.into_iter().collect();
    let entries: Vec<(&str, &Data)> = owned.iter().map(|(k, d)| (k.as_ref(), *d)).collect();
    save_entries(path.as_ref(), &entries, options)
}

fn save_entries(path: &Path, entries: &[(&str, &Data)], options: &SaveOptions) -> Result<()> {
    write_data(File::create(path)?, entries, options)?;
    log::info!("Wrote {} data sets to {}", entries.len(), path.display());
    Ok(())
}

impl Data {
    /// Save x and y as two columns with the given headers.
    ///
    /// Formatting follows `options`; set `index` for a leading row-number
    /// column. The name fields of `options` are not used.
    pub fn to_csv(&self, path: impl AsRef<Path>, columns: [&str; 2], options: &SaveOptions) -> Result<()> {
        let (x, y) = self.both();
        save_arrays(path, &[x, y], &columns, options)
    }
}
