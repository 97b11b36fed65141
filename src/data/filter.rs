use std::cmp::Ordering;
use std::ops::Range;

use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Selection: which rows of a container an index call refers to
// ---------------------------------------------------------------------------

/// A row selection, the typed form of a single index into a [`Data`](super::model::Data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One row.
    Row(usize),
    /// A half-open range of rows.
    Range(usize, usize),
    /// One flag per row; `true` keeps the row.
    Mask(Vec<bool>),
    /// Explicit row positions, in the order given.
    Indices(Vec<usize>),
}

impl From<usize> for Selection {
    fn from(i: usize) -> Self {
        Selection::Row(i)
    }
}

impl From<Range<usize>> for Selection {
    fn from(r: Range<usize>) -> Self {
        Selection::Range(r.start, r.end)
    }
}

impl From<Vec<bool>> for Selection {
    fn from(mask: Vec<bool>) -> Self {
        Selection::Mask(mask)
    }
}

impl From<&[bool]> for Selection {
    fn from(mask: &[bool]) -> Self {
        Selection::Mask(mask.to_vec())
    }
}

impl From<Vec<usize>> for Selection {
    fn from(idx: Vec<usize>) -> Self {
        Selection::Indices(idx)
    }
}

impl Selection {
    /// Resolve to row positions for a container of `len` rows.
    ///
    /// * `Row` must be in bounds.
    /// * `Range` must satisfy `start <= end <= len`.
    /// * `Mask` must have exactly `len` flags.
    /// * `Indices` must all be in bounds.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            Selection::Row(i) => {
                if *i >= len {
                    return Err(DataError::index(format!(
                        "index {i} is out of bounds for Data of length {len}"
                    )));
                }
                Ok(vec![*i])
            }
            Selection::Range(start, end) => {
                if start > end || *end > len {
                    return Err(DataError::index(format!(
                        "range {start}..{end} does not fit Data of length {len}"
                    )));
                }
                Ok((*start..*end).collect())
            }
            Selection::Mask(mask) => {
                if mask.len() != len {
                    return Err(DataError::index(format!(
                        "Index given was wrong length. The length of index was {} \
                         and the Data is length {len}",
                        mask.len()
                    )));
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter(|(_, keep)| **keep)
                    .map(|(i, _)| i)
                    .collect())
            }
            Selection::Indices(idx) => {
                if let Some(bad) = idx.iter().find(|&&i| i >= len) {
                    return Err(DataError::index(format!(
                        "index {bad} is out of bounds for Data of length {len}"
                    )));
                }
                Ok(idx.clone())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Row predicates and orderings over the backing matrix
// ---------------------------------------------------------------------------

/// Positions of rows in which every value is finite.
pub fn finite_rows(values: ArrayView2<'_, f64>) -> Vec<usize> {
    values
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
        .map(|(i, _)| i)
        .collect()
}

/// Row order that sorts `x` ascending. The sort is stable; NaN sorts last.
pub fn sorted_order(x: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
    order
}

/// Side of a run of equal values to report from [`search_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Insertion point of `value` into the ascending sequence `x`.
///
/// `Left` gives the first position `i` with `x[i] >= value`, `Right` the first
/// with `x[i] > value`.
pub fn search_sorted(x: ArrayView1<'_, f64>, value: f64, side: Side) -> usize {
    let mut low = 0usize;
    let mut high = x.len();
    while low < high {
        let mid = (low + high) / 2;
        let go_right = match side {
            Side::Left => x[mid].partial_cmp(&value) == Some(Ordering::Less),
            Side::Right => matches!(
                x[mid].partial_cmp(&value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        };
        if go_right {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// Rows of an ascending `x` that fall inside `[min, max]`.
pub fn sorted_bounds(x: ArrayView1<'_, f64>, min: f64, max: f64) -> Range<usize> {
    let start = search_sorted(x, min, Side::Left);
    let end = search_sorted(x, max, Side::Right);
    start..end.max(start)
}
