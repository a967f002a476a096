//! Time-series containers and the alignment stage
//!
//! Raw per-instrument series are merged here into a single gap-free
//! [`AlignedTable`] that every rolling computation downstream relies on.

pub mod align;
pub mod types;

pub use align::*;
pub use types::*;
