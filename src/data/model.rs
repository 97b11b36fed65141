use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{stack, Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2};
use serde::{Deserialize, Serialize};

use super::filter::{finite_rows, sorted_bounds, sorted_order, Selection};
use super::interp::InterpOptions;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Construction options
// ---------------------------------------------------------------------------

/// Clean-up applied while building a [`Data`].
///
/// Deserializes from a mode name or from a bool (`true` is `Both`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "StripSortRepr")]
pub enum StripSort {
    /// Leave the rows as given.
    #[default]
    None,
    /// Drop rows with a non-finite value, keep the order.
    Strip,
    /// Sort by ascending x, keep non-finite rows.
    Sort,
    /// Drop non-finite rows, then sort by x.
    Both,
}

impl From<bool> for StripSort {
    fn from(flag: bool) -> Self {
        if flag {
            StripSort::Both
        } else {
            StripSort::None
        }
    }
}

impl FromStr for StripSort {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "false" => Ok(StripSort::None),
            "strip" => Ok(StripSort::Strip),
            "sort" => Ok(StripSort::Sort),
            "both" | "true" | "strip_sort" => Ok(StripSort::Both),
            other => Err(DataError::value(format!(
                "strip_sort must be one of none, strip, sort or both; got '{other}'"
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StripSortRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<StripSortRepr> for StripSort {
    type Error = DataError;

    fn try_from(repr: StripSortRepr) -> Result<Self> {
        match repr {
            StripSortRepr::Flag(flag) => Ok(StripSort::from(flag)),
            StripSortRepr::Name(name) => name.parse(),
        }
    }
}

impl StripSort {
    fn strips(self) -> bool {
        matches!(self, StripSort::Strip | StripSort::Both)
    }

    fn sorts(self) -> bool {
        matches!(self, StripSort::Sort | StripSort::Both)
    }
}

/// Post-construction transforms, applied in order: strip, sort, resample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOptions {
    pub strip_sort: StripSort,
    /// Resample onto an even x grid with this step as the last step of construction.
    pub interp_full: Option<f64>,
}

// ---------------------------------------------------------------------------
// Data – the paired x/y series
// ---------------------------------------------------------------------------

/// A two-column table of `f64`: x (independent) in column 0, y (dependent) in column 1.
///
/// Every transformation returns a new `Data`. The only mutators are the
/// explicit setters and the in-place resampling methods, all of which rebuild
/// the backing matrix through the validating constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    values: Array2<f64>,
}

impl Default for Data {
    fn default() -> Self {
        Data {
            values: Array2::zeros((0, 2)),
        }
    }
}

impl Data {
    /// Wrap an N×2 matrix.
    pub fn new(values: Array2<f64>) -> Result<Self> {
        if values.ncols() != 2 {
            return Err(DataError::shape(format!(
                "values needs to be a two column array. values has the shape {:?}",
                values.shape()
            )));
        }
        let values = if values.is_standard_layout() {
            values
        } else {
            values.as_standard_layout().into_owned()
        };
        Ok(Data { values })
    }

    /// Build from dynamically shaped input.
    ///
    /// Without `split_y`, `values` must be 2-D with exactly two columns. With
    /// `split_y`, both must be 1-D and of equal size; `values` is then the x data.
    pub fn from_dyn(values: ArrayD<f64>, split_y: Option<ArrayD<f64>>) -> Result<Self> {
        match split_y {
            Some(y) => {
                if values.ndim() != 1 {
                    return Err(DataError::shape(format!(
                        "If x and y data are split both need to be 1D. values has shape {:?}",
                        values.shape()
                    )));
                }
                if y.ndim() != 1 {
                    return Err(DataError::shape(format!(
                        "If x and y data are split both need to be 1D. split_y has shape {:?}",
                        y.shape()
                    )));
                }
                let x = values
                    .into_dimensionality::<Ix1>()
                    .map_err(|e| DataError::shape(e.to_string()))?;
                let y = y
                    .into_dimensionality::<Ix1>()
                    .map_err(|e| DataError::shape(e.to_string()))?;
                Data::from_columns(x, y)
            }
            None => {
                if values.ndim() != 2 {
                    return Err(DataError::shape(format!(
                        "values needs to be a two column array. values has the shape {:?}",
                        values.shape()
                    )));
                }
                let values = values
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| DataError::shape(e.to_string()))?;
                Data::new(values)
            }
        }
    }

    /// Build from separate x and y columns of equal length.
    pub fn from_columns(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(DataError::shape(format!(
                "If x and y data are split both need to be the same size. \
                 x has size {} and y has size {}",
                x.len(),
                y.len()
            )));
        }
        let values =
            stack(Axis(1), &[x.view(), y.view()]).map_err(|e| DataError::shape(e.to_string()))?;
        Ok(Data { values })
    }

    /// Build from x and y slices of any type that widens to `f64`.
    pub fn from_xy<T: Copy + Into<f64>>(x: &[T], y: &[T]) -> Result<Self> {
        let x: Array1<f64> = x.iter().map(|&v| v.into()).collect();
        let y: Array1<f64> = y.iter().map(|&v| v.into()).collect();
        Data::from_columns(x, y)
    }

    /// Build from `[x, y]` rows.
    pub fn from_rows(rows: &[[f64; 2]]) -> Self {
        let mut values = Array2::zeros((rows.len(), 2));
        for (mut dst, src) in values.axis_iter_mut(Axis(0)).zip(rows) {
            dst[0] = src[0];
            dst[1] = src[1];
        }
        Data { values }
    }

    /// Wrap `values` and apply `options`.
    pub fn build(values: Array2<f64>, options: &DataOptions) -> Result<Self> {
        Data::new(values)?.with_options(options)
    }

    /// Apply the construction transforms in `options` to this container.
    pub fn with_options(self, options: &DataOptions) -> Result<Self> {
        let mut data = self;
        if options.strip_sort.strips() {
            let before = data.len();
            data = data.strip_nan();
            if data.len() < before {
                log::debug!("stripped {} non-finite rows", before - data.len());
            }
        }
        if options.strip_sort.sorts() {
            data = data.sort();
        }
        if let Some(step) = options.interp_full {
            data.resample_even_in_place(step, &InterpOptions::default())?;
        }
        Ok(data)
    }

    /// Replace y keeping x. The caller guarantees `y.len() == self.len()`.
    pub(crate) fn with_y(&self, y: Array1<f64>) -> Data {
        let mut values = self.values.clone();
        values.column_mut(1).assign(&y);
        Data { values }
    }

    // -- accessors --

    /// The x column.
    pub fn x(&self) -> ArrayView1<'_, f64> {
        self.values.column(0)
    }

    /// The y column.
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.values.column(1)
    }

    pub fn both(&self) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        (self.x(), self.y())
    }

    /// The full N×2 backing matrix.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// A container with no rows is "empty" (falsy).
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Iterate over `[x, y]` rows.
    pub fn rows(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.values.axis_iter(Axis(0)).map(|r| [r[0], r[1]])
    }

    /// Smallest x. NaN if any x is NaN or the container is empty.
    pub fn min_x(&self) -> f64 {
        nan_fold(self.x(), f64::min)
    }

    /// Largest x. NaN if any x is NaN or the container is empty.
    pub fn max_x(&self) -> f64 {
        nan_fold(self.x(), f64::max)
    }

    /// Average spacing in x, `(max_x - min_x) / len`.
    pub fn spacing_x(&self) -> f64 {
        (self.max_x() - self.min_x()) / self.len() as f64
    }

    // -- indexing --

    /// The `[x, y]` pair at `index`.
    pub fn row(&self, index: usize) -> Result<[f64; 2]> {
        if index >= self.len() {
            return Err(DataError::index(format!(
                "index {index} is out of bounds for Data of length {}",
                self.len()
            )));
        }
        Ok([self.values[[index, 0]], self.values[[index, 1]]])
    }

    /// A new container over the selected rows.
    pub fn select(&self, selection: impl Into<Selection>) -> Result<Data> {
        let rows = selection.into().resolve(self.len())?;
        Ok(Data {
            values: self.values.select(Axis(0), &rows),
        })
    }

    /// A new container over a contiguous range of rows.
    pub fn slice(&self, range: Range<usize>) -> Result<Data> {
        self.select(range)
    }

    // -- setters --

    /// Overwrite x at the selected rows.
    pub fn set_x(&mut self, selection: impl Into<Selection>, value: impl Into<SetValue>) -> Result<()> {
        self.set_column(0, selection.into(), value.into())
    }

    /// Overwrite y at the selected rows.
    pub fn set_y(&mut self, selection: impl Into<Selection>, value: impl Into<SetValue>) -> Result<()> {
        self.set_column(1, selection.into(), value.into())
    }

    fn set_column(&mut self, column: usize, selection: Selection, value: SetValue) -> Result<()> {
        let rows = selection.resolve(self.len())?;
        let mut values = self.values.clone();
        match value {
            SetValue::Scalar(v) => {
                for &r in &rows {
                    values[[r, column]] = v;
                }
            }
            SetValue::Array(arr) => {
                if arr.len() != rows.len() {
                    return Err(DataError::shape(format!(
                        "the selection has {} rows while the values to set have length {}",
                        rows.len(),
                        arr.len()
                    )));
                }
                for (&r, &v) in rows.iter().zip(arr.iter()) {
                    values[[r, column]] = v;
                }
            }
        }
        *self = Data::new(values)?;
        Ok(())
    }

    /// Overwrite whole rows with a two-column block.
    pub fn set_data(&mut self, selection: impl Into<Selection>, block: ArrayView2<'_, f64>) -> Result<()> {
        let rows = selection.into().resolve(self.len())?;
        if block.ncols() != 2 {
            return Err(DataError::shape(format!(
                "the array to set needs two columns, the shape given was {:?}",
                block.shape()
            )));
        }
        if block.nrows() != rows.len() {
            return Err(DataError::shape(format!(
                "the selection has {} rows while the data to set has {}",
                rows.len(),
                block.nrows()
            )));
        }
        let mut values = self.values.clone();
        for (&r, src) in rows.iter().zip(block.axis_iter(Axis(0))) {
            values.row_mut(r).assign(&src);
        }
        *self = Data::new(values)?;
        Ok(())
    }

    // -- transforms --

    /// Map `f` over the x values.
    pub fn apply_x(&self, f: impl Fn(f64) -> f64) -> Data {
        let mut values = self.values.clone();
        values.column_mut(0).mapv_inplace(f);
        Data { values }
    }

    /// Map `f` over the y values.
    pub fn apply_y(&self, f: impl Fn(f64) -> f64) -> Data {
        self.with_y(self.y().mapv(f))
    }

    /// Rows with `x_min <= x <= x_max`. Assumes x is ascending.
    pub fn x_cut(&self, x_min: f64, x_max: f64) -> Result<Data> {
        if x_min > x_max {
            return Err(DataError::range(format!(
                "x_min ({x_min}) should be smaller than x_max ({x_max})"
            )));
        }
        let bounds = sorted_bounds(self.x(), x_min, x_max);
        self.slice(bounds)
    }

    /// Drop rows containing NaN or infinite values.
    pub fn strip_nan(&self) -> Data {
        let rows = finite_rows(self.values.view());
        Data {
            values: self.values.select(Axis(0), &rows),
        }
    }

    /// Rows reordered by ascending x.
    pub fn sort(&self) -> Data {
        let order = sorted_order(self.x());
        Data {
            values: self.values.select(Axis(0), &order),
        }
    }
}

fn nan_fold(col: ArrayView1<'_, f64>, pick: fn(f64, f64) -> f64) -> f64 {
    let mut iter = col.iter().copied();
    let Some(first) = iter.next() else {
        return f64::NAN;
    };
    iter.fold(first, |acc, v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            pick(acc, v)
        }
    })
}

impl TryFrom<Array2<f64>> for Data {
    type Error = DataError;

    fn try_from(values: Array2<f64>) -> Result<Self> {
        Data::new(values)
    }
}

impl From<&Data> for Data {
    fn from(other: &Data) -> Self {
        other.clone()
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[]");
        }
        write!(f, "[")?;
        for (i, [x, y]) in self.rows().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            write!(f, "[{x} {y}]")?;
        }
        write!(f, "]")
    }
}

// ---------------------------------------------------------------------------
// SetValue – right-hand side of the column setters
// ---------------------------------------------------------------------------

/// Values for [`Data::set_x`] / [`Data::set_y`]: a scalar broadcast to every
/// selected row, or one value per selected row.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Scalar(f64),
    Array(Array1<f64>),
}

impl From<f64> for SetValue {
    fn from(v: f64) -> Self {
        SetValue::Scalar(v)
    }
}

impl From<Vec<f64>> for SetValue {
    fn from(v: Vec<f64>) -> Self {
        SetValue::Array(Array1::from_vec(v))
    }
}

impl From<&[f64]> for SetValue {
    fn from(v: &[f64]) -> Self {
        SetValue::Array(Array1::from_vec(v.to_vec()))
    }
}

impl From<Array1<f64>> for SetValue {
    fn from(v: Array1<f64>) -> Self {
        SetValue::Array(v)
    }
}
