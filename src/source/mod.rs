//! Data source adapters
//!
//! The pipeline never reaches for a global market-data session; it receives a
//! [`DataSource`] and asks it for one series per request. Implementations return raw
//! rows (any order, duplicates allowed) and [`DataSource::fetch`] normalises them.

pub mod csv_source;
pub mod memory;
pub mod synthetic;

pub use csv_source::CsvSource;
pub use memory::InMemorySource;
pub use synthetic::{SyntheticProcess, SyntheticSource};

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::series::{InstrumentKey, Observation, TimeSeries};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("No data for {instrument} in dataset {dataset}")]
    NotFound { dataset: String, instrument: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One series request: a field of a dataset for one instrument over a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    /// Dataset identifier, e.g. `FXSPOT_PREMIUM`
    pub dataset: String,
    pub instrument: InstrumentKey,
    /// Value column to read, e.g. `spot` or `impliedVolatility`
    pub field: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Extra dataset dimensions (tenor, strike convention, fixing location, ...)
    pub filters: BTreeMap<String, String>,
}

impl SeriesRequest {
    pub fn new(
        dataset: impl Into<String>,
        instrument: InstrumentKey,
        field: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            instrument,
            field: field.into(),
            start,
            end,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filters(mut self, filters: BTreeMap<String, String>) -> Self {
        self.filters = filters;
        self
    }
}

/// Market-data collaborator injected into the pipeline.
pub trait DataSource {
    /// Raw rows for the request. No ordering, uniqueness or gap-filling guarantees.
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError>;

    /// Rows as a [`TimeSeries`]: sorted, last observation per date kept, clipped to
    /// the requested range.
    fn fetch(&self, request: &SeriesRequest) -> Result<TimeSeries, SourceError> {
        let rows = self.get_series(request)?;
        Ok(TimeSeries::from_observations(rows).slice(request.start, request.end))
    }
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError> {
        (**self).get_series(request)
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError> {
        (**self).get_series(request)
    }
}
