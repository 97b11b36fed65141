//! Paired x/y series for magnetotransport analysis.
//!
//! [`Data`] wraps a two-column table: x is the independent variable (e.g.
//! magnetic field), y the dependent one (resistance, conductance). Arithmetic
//! acts on y only and requires matching x when two containers meet.
//! Resampling interpolates onto new x grids so sweeps taken at different
//! points can be combined with [`sum_data`] and [`mean`] and saved with
//! [`save_data`].
//!
//! ```no_run
//! use giga_data::{mean, save_data, Data, SaveOptions};
//!
//! # fn main() -> giga_data::Result<()> {
//! let up = Data::from_xy(&[0.0, 0.4, 1.1, 2.0], &[10.0, 10.2, 10.9, 12.0])?;
//! let down = Data::from_xy(&[0.1, 0.9, 1.6, 2.0], &[10.1, 10.7, 11.5, 12.1])?;
//!
//! let sweeps = [up.resample_range(0.5, 2.0, 0.5)?, down.resample_range(0.5, 2.0, 0.5)?];
//! let avg = mean(&sweeps)?;
//! save_data("avg.csv", &[avg], &["VT64"], &SaveOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod export;
pub mod sample;

pub use data::aggregate::{mean, sum_data};
pub use data::arith::{BinaryOp, Operand};
pub use data::filter::Selection;
pub use data::interp::{arange, even_grid, linspace, InterpKind, InterpOptions, Interpolator, OutOfBounds};
pub use data::loader::{load_file, LoadOptions};
pub use data::model::{Data, DataOptions, SetValue, StripSort};
pub use error::{DataError, Result};
pub use export::{save_arrays, save_data, save_dict, write_arrays, write_data, SaveOptions};
pub use sample::{gen_rand, gen_rand_with};
