//! Data layer: the paired x/y container and everything that acts on it.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Data
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  model    │  N×2 matrix, x = column 0, y = column 1
//!   └──────────┘
//!     │   │   │
//!     ▼   ▼   ▼
//!  arith interp filter    y arithmetic, resampling, row selection
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate │  sum / mean over containers sharing x
//!   └───────────┘
//! ```
pub mod aggregate;
pub mod arith;
pub mod filter;
pub mod interp;
pub mod loader;
pub mod model;

pub use model::Data;
