//! Derived metric stage
//!
//! Pure functions from [`TimeSeries`](crate::series::TimeSeries) /
//! [`AlignedTable`](crate::series::AlignedTable) to derived series:
//! - realized volatility (rolling annualized stdev of log returns)
//! - implied-minus-realized spread
//! - percentile rank over a fixed slice (and a rolling variant)
//!
//! Degenerate input always produces an empty output rather than an error.

pub mod percentile;
pub mod realized_vol;
pub mod returns;
pub mod spread;

pub use percentile::*;
pub use realized_vol::*;
pub use returns::*;
pub use spread::*;
