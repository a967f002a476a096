use serde::{Deserialize, Serialize};

use crate::metrics::ReturnType;
use crate::series::{DerivedSeries, InstrumentKey};

/// Window and return convention for rolling beta / correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossAssetConfig {
    /// Trailing observations per point (84 ≈ 4 months of business days)
    pub window: usize,
    /// Return convention applied to both legs
    pub returns: ReturnType,
}

impl Default for CrossAssetConfig {
    fn default() -> Self {
        Self {
            window: 84,
            returns: ReturnType::Simple,
        }
    }
}

/// Rolling statistics of one instrument against the benchmark.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RollingStats {
    pub beta: DerivedSeries,
    pub correlation: DerivedSeries,
}

/// Per-instrument rolling statistics, in the instrument table's column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CrossAssetResult {
    entries: Vec<(InstrumentKey, RollingStats)>,
}

impl CrossAssetResult {
    pub(crate) fn push(&mut self, key: InstrumentKey, stats: RollingStats) {
        self.entries.push((key, stats));
    }

    pub fn get(&self, key: &str) -> Option<&RollingStats> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentKey, &RollingStats)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &InstrumentKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
