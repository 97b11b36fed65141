use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::filter::sorted_order;
use super::model::Data;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How y is estimated between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpKind {
    /// Straight line between the neighbouring samples.
    #[default]
    Linear,
    /// y of the closer neighbour; ties go to the lower sample.
    Nearest,
    /// y of the sample at or below the query.
    Previous,
    /// y of the sample at or above the query.
    Next,
}

/// What to return for queries outside `[min_x, max_x]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBounds {
    /// Fail with [`DataError::Range`].
    #[default]
    Error,
    /// One value on both sides.
    Fill(f64),
    /// `(below, above)`.
    FillPair(f64, f64),
    /// y of the nearest edge sample.
    Clamp,
    /// Extend the first/last segment. Step kinds behave like `Clamp`.
    Extrapolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpOptions {
    pub kind: InterpKind,
    pub out_of_bounds: OutOfBounds,
}

impl InterpOptions {
    pub fn with_kind(mut self, kind: InterpKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_out_of_bounds(mut self, out_of_bounds: OutOfBounds) -> Self {
        self.out_of_bounds = out_of_bounds;
        self
    }
}

// ---------------------------------------------------------------------------
// Interpolator
// ---------------------------------------------------------------------------

/// 1-D interpolation over `(x, y)` samples. Samples are sorted by x on construction.
#[derive(Debug, Clone)]
pub struct Interpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    options: InterpOptions,
}

impl Interpolator {
    pub fn new(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>, options: &InterpOptions) -> Result<Self> {
        if x.len() != y.len() {
            return Err(DataError::shape(format!(
                "x and y arrays must be equal in length, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        let needed = match options.kind {
            InterpKind::Linear => 2,
            _ => 1,
        };
        if x.len() < needed {
            return Err(DataError::shape(format!(
                "x and y arrays must have at least {needed} entries, got {}",
                x.len()
            )));
        }
        if x.iter().any(|v| v.is_nan()) {
            return Err(DataError::value("cannot interpolate over NaN x values"));
        }

        let order = sorted_order(x);
        Ok(Interpolator {
            x: order.iter().map(|&i| x[i]).collect(),
            y: order.iter().map(|&i| y[i]).collect(),
            options: *options,
        })
    }

    pub fn min_x(&self) -> f64 {
        self.x[0]
    }

    pub fn max_x(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Interpolated y at `xq`. NaN queries give NaN.
    pub fn eval(&self, xq: f64) -> Result<f64> {
        if xq.is_nan() {
            return Ok(f64::NAN);
        }
        let last = self.x.len() - 1;
        if xq < self.x[0] {
            return self.outside(xq, true);
        }
        if xq > self.x[last] {
            return self.outside(xq, false);
        }

        // first sample strictly above xq; x[hi - 1] <= xq < x[hi]
        let hi = self.x.partition_point(|&v| v <= xq);
        if hi > last {
            return Ok(self.y[last]);
        }
        let lo = hi - 1;
        let (x0, x1, y0, y1) = (self.x[lo], self.x[hi], self.y[lo], self.y[hi]);
        #[allow(clippy::float_cmp)]
        let value = match self.options.kind {
            InterpKind::Linear => segment(x0, x1, y0, y1, xq),
            InterpKind::Nearest => {
                if xq - x0 <= x1 - xq {
                    y0
                } else {
                    y1
                }
            }
            InterpKind::Previous => y0,
            InterpKind::Next => {
                if xq == x0 {
                    y0
                } else {
                    y1
                }
            }
        };
        Ok(value)
    }

    /// [`eval`](Self::eval) over each query.
    pub fn eval_many(&self, xq: &[f64]) -> Result<Array1<f64>> {
        let values = xq.iter().map(|&q| self.eval(q)).collect::<Result<Vec<f64>>>()?;
        Ok(Array1::from_vec(values))
    }

    fn outside(&self, xq: f64, below: bool) -> Result<f64> {
        let last = self.x.len() - 1;
        match self.options.out_of_bounds {
            OutOfBounds::Error => Err(DataError::range(format!(
                "a value in x_new ({xq}) is {} the interpolation range [{}, {}]",
                if below { "below" } else { "above" },
                self.x[0],
                self.x[last]
            ))),
            OutOfBounds::Fill(v) => Ok(v),
            OutOfBounds::FillPair(lo, hi) => Ok(if below { lo } else { hi }),
            OutOfBounds::Clamp => Ok(if below { self.y[0] } else { self.y[last] }),
            OutOfBounds::Extrapolate => {
                if self.options.kind != InterpKind::Linear || last == 0 {
                    return Ok(if below { self.y[0] } else { self.y[last] });
                }
                let (a, b) = if below { (0, 1) } else { (last - 1, last) };
                Ok(segment(self.x[a], self.x[b], self.y[a], self.y[b], xq))
            }
        }
    }
}

fn segment(x0: f64, x1: f64, y0: f64, y1: f64, xq: f64) -> f64 {
    y0 + (y1 - y0) * (xq - x0) / (x1 - x0)
}

// ---------------------------------------------------------------------------
// Grid builders
// ---------------------------------------------------------------------------

/// `n` evenly spaced points from `start` to `stop` inclusive.
///
/// The end points are exactly `start` and `stop`; interior points are
/// `start + i * step` and may carry rounding error.
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    let mut grid = Array1::linspace(start, stop, n);
    if n > 1 {
        grid[0] = start;
        grid[n - 1] = stop;
    }
    grid
}

/// Points `start, start + step, ...` strictly below `stop`.
///
/// Empty unless `start < stop`, `step > 0` and both ends are finite.
pub fn arange(start: f64, stop: f64, step: f64) -> Array1<f64> {
    if !(start.is_finite() && stop.is_finite() && step > 0.0) || start >= stop {
        return Array1::zeros(0);
    }
    Array1::range(start, stop, step)
}

/// Multiples of `step` lying inside `[min, max]`.
///
/// Runs from `ceil(min / step) * step` to `floor(max / step) * step` with
/// `round((stop - start) / step) + 1` points.
pub fn even_grid(min: f64, max: f64, step: f64) -> Array1<f64> {
    let start = (min / step).ceil() * step;
    let stop = (max / step).floor() * step;
    let count = ((stop - start) / step).round() + 1.0;
    if !count.is_finite() || count < 1.0 {
        return Array1::zeros(0);
    }
    // k * step can round one ulp past the bound it was derived from
    linspace(start.max(min), stop.min(max), count as usize)
}

fn check_step(step: f64) -> Result<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(DataError::value(format!(
            "step size must be a positive finite number, got {step}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Resampling on Data
// ---------------------------------------------------------------------------

impl Data {
    fn interpolator(&self, options: &InterpOptions) -> Result<Interpolator> {
        Interpolator::new(self.x(), self.y(), options)
    }

    fn resample_onto(&self, grid: Array1<f64>, interp: &Interpolator) -> Result<Data> {
        let y = grid
            .iter()
            .map(|&q| interp.eval(q))
            .collect::<Result<Array1<f64>>>()?;
        Data::from_columns(grid, y)
    }

    /// Resample onto the multiples of `step` that lie inside the x range.
    pub fn resample_even(&self, step: f64, options: &InterpOptions) -> Result<Data> {
        check_step(step)?;
        let interp = self.interpolator(options)?;
        let grid = even_grid(interp.min_x(), interp.max_x(), step);
        if grid.is_empty() {
            log::warn!(
                "no multiple of {step} lies in [{}, {}]; resampled data is empty",
                interp.min_x(),
                interp.max_x()
            );
        }
        log::debug!("resampling {} rows onto {} even points", self.len(), grid.len());
        self.resample_onto(grid, &interp)
    }

    /// [`resample_even`](Self::resample_even), replacing this container.
    pub fn resample_even_in_place(&mut self, step: f64, options: &InterpOptions) -> Result<&mut Data> {
        *self = self.resample_even(step, options)?;
        Ok(self)
    }

    /// Resample onto `points` evenly spaced x values spanning `[min_x, max_x]`.
    pub fn resample_count(&self, points: usize, options: &InterpOptions) -> Result<Data> {
        if points == 0 {
            return Err(DataError::value("the number of points must be at least 1"));
        }
        let interp = self.interpolator(options)?;
        let grid = linspace(interp.min_x(), interp.max_x(), points);
        self.resample_onto(grid, &interp)
    }

    /// Resample linearly onto `min_x, min_x + step, ...` below `max_x`.
    ///
    /// The range must lie inside the data; it is never extrapolated.
    pub fn resample_range(&self, min_x: f64, max_x: f64, step: f64) -> Result<Data> {
        check_step(step)?;
        if !(min_x.is_finite() && max_x.is_finite()) {
            return Err(DataError::value(format!(
                "min_x and max_x must be finite, got {min_x} and {max_x}"
            )));
        }
        if min_x > max_x {
            return Err(DataError::range(format!(
                "min_x ({min_x}) should be smaller than max_x ({max_x})"
            )));
        }
        let interp =
            self.interpolator(&InterpOptions::default().with_out_of_bounds(OutOfBounds::Clamp))?;
        if interp.min_x() > min_x {
            return Err(DataError::range(format!(
                "min_x value to interpolate ({min_x}) is below data ({})",
                interp.min_x()
            )));
        }
        if interp.max_x() < max_x {
            return Err(DataError::range(format!(
                "max_x value to interpolate ({max_x}) is above data ({})",
                interp.max_x()
            )));
        }
        self.resample_onto(arange(min_x, max_x, step), &interp)
    }

    /// [`resample_range`](Self::resample_range), replacing this container.
    pub fn resample_range_in_place(&mut self, min_x: f64, max_x: f64, step: f64) -> Result<&mut Data> {
        *self = self.resample_range(min_x, max_x, step)?;
        Ok(self)
    }

    /// Linearly interpolated y at `x_val`.
    ///
    /// With `bounds_check`, a query outside `[min_x, max_x]` is a
    /// [`DataError::Range`]. Without it, such queries take the y of the
    /// nearest edge sample.
    pub fn y_from_x(&self, x_val: f64, bounds_check: bool) -> Result<f64> {
        let values = self.y_from_xs(&[x_val], bounds_check)?;
        Ok(values[0])
    }

    /// [`y_from_x`](Self::y_from_x) for several queries.
    pub fn y_from_xs(&self, x_vals: &[f64], bounds_check: bool) -> Result<Array1<f64>> {
        let interp =
            self.interpolator(&InterpOptions::default().with_out_of_bounds(OutOfBounds::Clamp))?;
        if bounds_check {
            let (lo, hi) = (interp.min_x(), interp.max_x());
            if x_vals.iter().any(|&q| q < lo || q > hi) {
                return Err(DataError::range(format!(
                    "The given x_values are out side of the range of data which is \
                     between {lo} and {hi}"
                )));
            }
        }
        interp.eval_many(x_vals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use statrs::assert_almost_eq;

    fn squares() -> Data {
        Data::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 4.0], [3.0, 9.0], [4.0, 16.0]])
    }

    #[test]
    fn linear_between_samples() {
        let d = squares();
        let interp = Interpolator::new(d.x(), d.y(), &InterpOptions::default()).unwrap();
        assert_almost_eq!(interp.eval(1.5).unwrap(), 2.5, 1e-12);
        assert_eq!(interp.eval(3.0).unwrap(), 9.0);
        assert_eq!(interp.eval(4.0).unwrap(), 16.0);
        assert!(interp.eval(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn step_kinds() {
        let d = squares();
        let eval = |kind, q| {
            Interpolator::new(d.x(), d.y(), &InterpOptions::default().with_kind(kind))
                .unwrap()
                .eval(q)
                .unwrap()
        };
        assert_eq!(eval(InterpKind::Nearest, 1.4), 1.0);
        assert_eq!(eval(InterpKind::Nearest, 1.5), 1.0);
        assert_eq!(eval(InterpKind::Nearest, 1.6), 4.0);
        assert_eq!(eval(InterpKind::Previous, 1.9), 1.0);
        assert_eq!(eval(InterpKind::Next, 1.1), 4.0);
        assert_eq!(eval(InterpKind::Next, 1.0), 1.0);
    }

    #[test]
    fn out_of_bounds_policies() {
        let d = squares();
        let make = |oob| {
            Interpolator::new(
                d.x(),
                d.y(),
                &InterpOptions::default().with_out_of_bounds(oob),
            )
            .unwrap()
        };
        assert!(matches!(
            make(OutOfBounds::Error).eval(-1.0),
            Err(DataError::Range(_))
        ));
        assert_eq!(make(OutOfBounds::Fill(-7.0)).eval(5.0).unwrap(), -7.0);
        assert_eq!(make(OutOfBounds::FillPair(-1.0, 1.0)).eval(-3.0).unwrap(), -1.0);
        assert_eq!(make(OutOfBounds::FillPair(-1.0, 1.0)).eval(9.0).unwrap(), 1.0);
        assert_eq!(make(OutOfBounds::Clamp).eval(-3.0).unwrap(), 0.0);
        assert_eq!(make(OutOfBounds::Clamp).eval(9.0).unwrap(), 16.0);
        assert_almost_eq!(make(OutOfBounds::Extrapolate).eval(5.0).unwrap(), 23.0, 1e-12);
        assert_almost_eq!(make(OutOfBounds::Extrapolate).eval(-1.0).unwrap(), -1.0, 1e-12);
    }

    #[test]
    fn unsorted_samples_are_sorted() {
        let x = array![2.0, 0.0, 1.0];
        let y = array![20.0, 0.0, 10.0];
        let interp = Interpolator::new(x.view(), y.view(), &InterpOptions::default()).unwrap();
        assert_almost_eq!(interp.eval(1.5).unwrap(), 15.0, 1e-12);
    }

    #[test]
    fn too_few_samples() {
        let x = array![1.0];
        let y = array![2.0];
        assert!(matches!(
            Interpolator::new(x.view(), y.view(), &InterpOptions::default()),
            Err(DataError::Shape(_))
        ));
        let nearest = InterpOptions::default().with_kind(InterpKind::Nearest);
        assert!(Interpolator::new(x.view(), y.view(), &nearest).is_ok());
    }

    #[test]
    fn grids() {
        assert_eq!(even_grid(0.0, 4.0, 2.0), array![0.0, 2.0, 4.0]);
        assert_eq!(even_grid(0.3, 2.2, 0.5), array![0.5, 1.0, 1.5, 2.0]);
        assert!(even_grid(0.1, 0.2, 1.0).is_empty());
        assert_eq!(arange(0.0, 1.0, 0.25), array![0.0, 0.25, 0.5, 0.75]);
        assert!(arange(1.0, 0.0, 0.25).is_empty());
        assert_eq!(linspace(0.0, 1.0, 3), array![0.0, 0.5, 1.0]);
    }

    #[test]
    fn decimal_grids_end_inside_bounds() {
        let grid = even_grid(0.2, 16.1, 0.1);
        assert_eq!(grid.len(), 160);
        assert_eq!(grid[0], 0.2);
        assert_eq!(grid[grid.len() - 1], 16.1);

        let grid = even_grid(0.1, 8.05, 0.05);
        assert_eq!(grid.len(), 160);
        assert_eq!(grid[grid.len() - 1], 8.05);

        let points = linspace(0.2, 16.1, 28);
        assert_eq!(points[27], 16.1);
        assert!(points.iter().all(|&v| (0.2..=16.1).contains(&v)));
    }

    #[test]
    fn resample_even_decimal_steps() {
        for (x, step) in [([0.2, 5.0, 16.1], 0.1), ([0.1, 3.3, 8.05], 0.05)] {
            let d = Data::from_xy(&x, &[1.0, 2.0, 3.0]).unwrap();
            let out = d.resample_even(step, &InterpOptions::default()).unwrap();
            let (start, stop) = ((x[0] / step).ceil() * step, (x[2] / step).floor() * step);
            let expected = ((stop - start) / step).round() as usize + 1;
            assert_eq!(out.len(), expected);
            assert!(out.max_x() <= d.max_x());
            assert!(out.min_x() >= d.min_x());
            assert_almost_eq!(out.y()[out.len() - 1], 3.0, 1e-12);
        }
    }

    #[test]
    fn resample_count_decimal_span() {
        let d = Data::from_xy(&[0.2, 5.0, 16.1], &[1.0, 2.0, 3.0]).unwrap();
        let out = d.resample_count(28, &InterpOptions::default()).unwrap();
        assert_eq!(out.len(), 28);
        assert_eq!(out.x()[27], 16.1);
        assert_eq!(out.y()[27], 3.0);
    }

    #[test]
    fn resample_even_exact_samples() {
        let out = squares().resample_even(2.0, &InterpOptions::default()).unwrap();
        assert_eq!(out.x(), array![0.0, 2.0, 4.0]);
        assert_eq!(out.y(), array![0.0, 4.0, 16.0]);
    }

    #[test]
    fn resample_even_in_place_replaces() {
        let mut d = squares();
        d.resample_even_in_place(2.0, &InterpOptions::default()).unwrap();
        assert_eq!(d.len(), 3);
        assert!(d.resample_even_in_place(0.0, &InterpOptions::default()).is_err());
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn resample_count_spans_range() {
        let out = squares().resample_count(9, &InterpOptions::default()).unwrap();
        assert_eq!(out.len(), 9);
        assert_eq!(out.x()[0], 0.0);
        assert_eq!(out.x()[8], 4.0);
        assert_almost_eq!(out.y()[1], 0.5, 1e-12);
        assert!(squares().resample_count(0, &InterpOptions::default()).is_err());
    }

    #[test]
    fn resample_range_checks_domain() {
        let d = squares();
        let out = d.resample_range(1.0, 3.0, 0.5).unwrap();
        assert_eq!(out.x(), array![1.0, 1.5, 2.0, 2.5]);
        assert_almost_eq!(out.y()[1], 2.5, 1e-12);

        assert!(matches!(d.resample_range(-0.5, 3.0, 0.5), Err(DataError::Range(_))));
        assert!(matches!(d.resample_range(0.0, 4.5, 0.5), Err(DataError::Range(_))));
        assert!(matches!(d.resample_range(3.0, 1.0, 0.5), Err(DataError::Range(_))));
        assert!(matches!(d.resample_range(1.0, 3.0, -1.0), Err(DataError::Value(_))));
    }

    #[test]
    fn resample_range_in_place_replaces() {
        let mut d = squares();
        d.resample_range_in_place(0.0, 4.0, 1.0).unwrap();
        assert_eq!(d.x(), array![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn y_from_x_bounds() {
        let d = squares();
        assert_almost_eq!(d.y_from_x(2.5, true).unwrap(), 6.5, 1e-12);
        assert!(matches!(d.y_from_x(4.5, true), Err(DataError::Range(_))));
        assert_eq!(d.y_from_x(4.5, false).unwrap(), 16.0);
        assert_eq!(d.y_from_x(-4.5, false).unwrap(), 0.0);

        let many = d.y_from_xs(&[0.5, 1.5], true).unwrap();
        assert_eq!(many.len(), 2);
        assert!(d.y_from_xs(&[0.5, 7.0], true).is_err());
    }

    #[test]
    fn clamp_uses_edge_samples_not_extremes() {
        // decreasing y: edge values differ from y.min()/y.max()
        let d = Data::from_rows(&[[0.0, 5.0], [1.0, 3.0], [2.0, 1.0]]);
        assert_eq!(d.y_from_x(-1.0, false).unwrap(), 5.0);
        assert_eq!(d.y_from_x(3.0, false).unwrap(), 1.0);
    }
}
