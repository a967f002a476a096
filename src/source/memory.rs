use std::collections::HashMap;

use super::{DataSource, SeriesRequest, SourceError};
use crate::series::Observation;

/// Rows held in memory, keyed by `(dataset, instrument)`.
///
/// The requested field and filters are ignored; the date range is applied by
/// [`DataSource::fetch`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: HashMap<(String, String), Vec<Observation>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: &str, instrument: &str, rows: Vec<Observation>) {
        self.rows
            .insert((dataset.to_string(), instrument.to_string()), rows);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_series(mut self, dataset: &str, instrument: &str, rows: Vec<Observation>) -> Self {
        self.insert(dataset, instrument, rows);
        self
    }
}

impl DataSource for InMemorySource {
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError> {
        self.rows
            .get(&(request.dataset.clone(), request.instrument.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                dataset: request.dataset.clone(),
                instrument: request.instrument.to_string(),
            })
    }
}
