use chrono::NaiveDate;
use serde::Serialize;

use crate::cross_asset::CrossAssetResult;
use crate::series::{AlignedTable, InstrumentKey};

/// One point of the "entry point vs richness" screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichnessPoint {
    pub key: InstrumentKey,
    /// Percentile of the latest implied vol within the historical slice, `[0, 100]`
    pub percentile_rank: f64,
    /// Implied minus realized vol (vol points) as of `spread_date`
    pub spread: f64,
    /// Date the spread was actually read on (latest available on or before the
    /// requested richness date)
    pub spread_date: NaiveDate,
}

/// Everything a run produces, ready for a [`ChartSink`](crate::presentation::ChartSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeValueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Aligned spot levels
    pub spot: AlignedTable,
    /// Aligned realized vol (vol points)
    pub realized_vol: AlignedTable,
    /// Aligned implied vol (vol points)
    pub implied_vol: AlignedTable,
    /// Implied minus realized
    pub spread: AlignedTable,
    /// Latest-point percentile rank of implied vol over the configured slice
    pub percentile_ranks: Vec<(InstrumentKey, f64)>,
    pub richness: Vec<RichnessPoint>,
    /// Present when a benchmark is configured
    pub cross_asset: Option<CrossAssetResult>,
}

impl RelativeValueReport {
    pub fn percentile_rank(&self, key: &str) -> Option<f64> {
        self.percentile_ranks
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, r)| *r)
    }

    pub fn richness_point(&self, key: &str) -> Option<&RichnessPoint> {
        self.richness.iter().find(|p| p.key.as_str() == key)
    }
}
