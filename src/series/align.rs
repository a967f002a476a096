use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

use super::types::*;

/// Outer-join every series on date, forward-fill each column from its own history,
/// then drop any date still missing a value.
///
/// Rows come out in ascending date order. An empty input series makes the whole
/// table empty (the keys are kept so callers can still see what was requested);
/// no input series at all yields a table with neither keys nor rows.
pub fn align(series_by_key: &SeriesSet) -> AlignedTable {
    let keys: Vec<InstrumentKey> = series_by_key.keys().cloned().collect();
    let columns: Vec<&TimeSeries> = series_by_key.iter().map(|(_, s)| s).collect();

    let (dates, values) = align_columns(&columns);
    AlignedTable::from_parts(keys, dates, values)
}

/// Alignment on anonymous columns, shared with the cross-asset stage where the
/// benchmark must not collide with any instrument key.
pub(crate) fn align_columns(columns: &[&TimeSeries]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    if columns.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let grid: Vec<NaiveDate> = columns
        .iter()
        .flat_map(|s| s.iter().map(|(d, _)| *d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let filled: Vec<Vec<Option<f64>>> = columns.iter().map(|s| forward_fill(s, &grid)).collect();

    let mut dates = Vec::with_capacity(grid.len());
    let mut out: Vec<Vec<f64>> = vec![Vec::with_capacity(grid.len()); columns.len()];

    for (row, date) in grid.iter().enumerate() {
        let complete: Option<Vec<f64>> = filled.iter().map(|col| col[row]).collect();
        if let Some(values) = complete {
            dates.push(*date);
            for (col, value) in out.iter_mut().zip(values) {
                col.push(value);
            }
        }
    }

    if dates.len() < grid.len() {
        debug!(
            "alignment dropped {} of {} dates with incomplete rows across {} series",
            grid.len() - dates.len(),
            grid.len(),
            columns.len()
        );
    }

    (dates, out)
}

/// Project `series` onto `grid` (ascending dates), carrying the latest observation
/// forward. Dates before the first observation stay `None`.
///
/// A NaN or infinite value is a gap, filled like any other missing date.
pub fn forward_fill(series: &TimeSeries, grid: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut filled = Vec::with_capacity(grid.len());
    let mut observations = series.iter().peekable();
    let mut last = None;

    for date in grid {
        while let Some(&&(obs_date, value)) = observations.peek() {
            if obs_date > *date {
                break;
            }
            if value.is_finite() {
                last = Some(value);
            }
            observations.next();
        }
        filled.push(last);
    }

    filled
}

/// Dates present in both series, with both values. No filling.
pub fn inner_join(a: &TimeSeries, b: &TimeSeries) -> Vec<(NaiveDate, f64, f64)> {
    let (pa, pb) = (a.points(), b.points());
    let mut joined = Vec::with_capacity(pa.len().min(pb.len()));
    let (mut i, mut j) = (0, 0);

    while i < pa.len() && j < pb.len() {
        let (da, va) = pa[i];
        let (db, vb) = pb[j];
        if da == db {
            joined.push((da, va, vb));
            i += 1;
            j += 1;
        } else if da < db {
            i += 1;
        } else {
            j += 1;
        }
    }

    joined
}
