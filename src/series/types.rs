// src/series/types.rs

//! Core time-series containers
//!
//! Every stage of the pipeline exchanges one of three shapes:
//! - [`TimeSeries`]: one instrument, strictly increasing dates, one value per date
//! - [`SeriesSet`]: insertion-ordered mapping from [`InstrumentKey`] to [`TimeSeries`]
//! - [`AlignedTable`]: several instruments sharing one gap-free date axis

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dated observation.
pub type Observation = (NaiveDate, f64);

/// Identifier of an instrument (currency pair, index ticker, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentKey(String);

impl InstrumentKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for InstrumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Ordered sequence of dated values with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    points: Vec<Observation>,
}

/// Output of a pure metric function; same invariants as [`TimeSeries`].
pub type DerivedSeries = TimeSeries;

impl TimeSeries {
    /// Empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from points that are already in strictly increasing date order.
    ///
    /// Returns an error naming the first offending date when the order is violated or a
    /// value is NaN or infinite.
    pub fn from_points(points: Vec<Observation>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(anyhow!(
                "TimeSeries dates must be strictly increasing: {} follows {}",
                pair[1].0,
                pair[0].0
            ));
        }
        if let Some((date, value)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(anyhow!("TimeSeries value on {} is not finite: {}", date, value));
        }
        Ok(Self { points })
    }

    /// Build a series from raw source rows.
    ///
    /// Rows may arrive unordered and may repeat a date. Rows are stably sorted by date
    /// and, for a repeated date, the observation that arrived last wins. NaN or infinite
    /// values are missing observations and are dropped before that.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut rows: Vec<Observation> = observations.into_iter().collect();
        let received = rows.len();
        rows.retain(|(_, value)| value.is_finite());
        if rows.len() < received {
            debug!("dropped {} non-finite observations", received - rows.len());
        }
        rows.sort_by_key(|(date, _)| *date);

        let mut points: Vec<Observation> = Vec::with_capacity(rows.len());
        for (date, value) in rows {
            match points.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => points.push((date, value)),
            }
        }
        Self { points }
    }

    /// Internal constructor for outputs generated in date order.
    pub(crate) fn from_sorted(points: Vec<Observation>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.points.iter()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first(&self) -> Option<Observation> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Observation> {
        self.points.last().copied()
    }

    /// Value observed exactly on `date`.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| self.points[idx].1)
    }

    /// Latest value observed on or before `date`.
    pub fn value_as_of(&self, date: NaiveDate) -> Option<Observation> {
        let idx = self.points.partition_point(|(d, _)| *d <= date);
        idx.checked_sub(1).map(|i| self.points[i])
    }

    /// Inclusive date slice `[start, end]`. An inverted range gives an empty series.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> TimeSeries {
        if start > end {
            return TimeSeries::new();
        }
        let lo = self.points.partition_point(|(d, _)| *d < start);
        let hi = self.points.partition_point(|(d, _)| *d <= end);
        TimeSeries {
            points: self.points[lo..hi].to_vec(),
        }
    }

    pub fn map_values<F>(&self, mut f: F) -> TimeSeries
    where
        F: FnMut(f64) -> f64,
    {
        TimeSeries {
            points: self.points.iter().map(|(d, v)| (*d, f(*v))).collect(),
        }
    }

    /// Multiply every value by `factor` (e.g. decimal vol to vol points).
    pub fn scale(&self, factor: f64) -> TimeSeries {
        self.map_values(|v| v * factor)
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Insertion-ordered mapping from instrument to series.
///
/// Order only matters for presentation (legend order); lookups are by key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesSet {
    entries: Vec<(InstrumentKey, TimeSeries)>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: InstrumentKey, series: TimeSeries) -> Option<TimeSeries> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, series)),
            None => {
                self.entries.push((key, series));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TimeSeries> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, s)| s)
    }

    pub fn keys(&self) -> impl Iterator<Item = &InstrumentKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentKey, &TimeSeries)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(InstrumentKey, TimeSeries)> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = (InstrumentKey, TimeSeries)>>(iter: I) -> Self {
        let mut set = SeriesSet::new();
        for (key, series) in iter {
            set.insert(key, series);
        }
        set
    }
}

impl IntoIterator for SeriesSet {
    type Item = (InstrumentKey, TimeSeries);
    type IntoIter = std::vec::IntoIter<(InstrumentKey, TimeSeries)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Instruments sharing one chronological, gap-free date axis.
///
/// Stored column-major: `columns[i][r]` is the value of `keys[i]` on `dates[r]`.
/// Every column has exactly `dates.len()` values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AlignedTable {
    keys: Vec<InstrumentKey>,
    dates: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
}

impl AlignedTable {
    pub(crate) fn from_parts(
        keys: Vec<InstrumentKey>,
        dates: Vec<NaiveDate>,
        columns: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(keys.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == dates.len()));
        Self {
            keys,
            dates,
            columns,
        }
    }

    pub fn keys(&self) -> &[InstrumentKey] {
        &self.keys
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Number of columns (instruments).
    pub fn width(&self) -> usize {
        self.keys.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.as_str() == key)
    }

    pub fn column_values(&self, key: &str) -> Option<&[f64]> {
        self.position(key).map(|i| self.columns[i].as_slice())
    }

    fn column_series(&self, values: &[f64]) -> TimeSeries {
        TimeSeries::from_sorted(self.dates.iter().copied().zip(values.iter().copied()).collect())
    }

    /// A single column as a standalone series.
    pub fn column(&self, key: &str) -> Option<TimeSeries> {
        self.column_values(key).map(|values| self.column_series(values))
    }

    pub fn value(&self, date: NaiveDate, key: &str) -> Option<f64> {
        let col = self.column_values(key)?;
        let row = self.dates.binary_search(&date).ok()?;
        Some(col[row])
    }

    /// Iterate `(key, series)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&InstrumentKey, TimeSeries)> + '_ {
        self.keys
            .iter()
            .zip(self.columns.iter())
            .map(|(key, values)| (key, self.column_series(values)))
    }

    /// Inclusive row slice `[start, end]`; keeps every column.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> AlignedTable {
        let (lo, hi) = if start > end {
            (0, 0)
        } else {
            (
                self.dates.partition_point(|d| *d < start),
                self.dates.partition_point(|d| *d <= end),
            )
        };
        AlignedTable {
            keys: self.keys.clone(),
            dates: self.dates[lo..hi].to_vec(),
            columns: self.columns.iter().map(|c| c[lo..hi].to_vec()).collect(),
        }
    }

    /// Split the table back into one series per key.
    pub fn to_series_set(&self) -> SeriesSet {
        self.columns()
            .map(|(key, series)| (key.clone(), series))
            .collect()
    }
}
