//! Cross-asset stage
//!
//! Aligns a benchmark series (an equity index, say) with the instrument spot table and
//! computes rolling beta and Pearson correlation for every instrument independently.

pub mod rolling;
pub mod types;

pub use rolling::*;
pub use types::*;

use log::debug;

use crate::series::{align_columns, AlignedTable, TimeSeries};

/// Rolling beta and correlation of every column of `instruments` against `benchmark`.
///
/// The benchmark and all instrument columns are first put on one date axis with the
/// same outer-join, forward-fill, drop-incomplete discipline as
/// [`align`](crate::series::align), so every instrument sees identical dates.
pub fn cross_asset(
    benchmark: &TimeSeries,
    instruments: &AlignedTable,
    config: &CrossAssetConfig,
) -> CrossAssetResult {
    let instrument_series: Vec<TimeSeries> = instruments.columns().map(|(_, s)| s).collect();
    let mut columns: Vec<&TimeSeries> = Vec::with_capacity(instrument_series.len() + 1);
    columns.push(benchmark);
    columns.extend(instrument_series.iter());

    let (dates, values) = align_columns(&columns);
    debug!(
        "cross-asset: {} instruments on {} shared dates, window {}",
        instruments.width(),
        dates.len(),
        config.window
    );

    let mut result = CrossAssetResult::default();
    let Some((bench, rest)) = values.split_first() else {
        return result;
    };

    for (key, inst) in instruments.keys().iter().zip(rest) {
        let stats = rolling_stats_on_axis(&dates, inst, bench, config.window, config.returns);
        result.push(key.clone(), stats);
    }

    result
}
