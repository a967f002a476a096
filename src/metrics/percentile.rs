use chrono::NaiveDate;
use log::debug;

use crate::series::{DerivedSeries, TimeSeries};

/// Rank of `value` against `reference`: share of reference values `<= value`, in
/// `[0, 100]`. `reference` must be sorted ascending.
fn rank_in_sorted(sorted: &[f64], value: f64) -> f64 {
    let at_or_below = sorted.partition_point(|x| *x <= value);
    100.0 * at_or_below as f64 / sorted.len() as f64
}

/// Percentile rank of every point against the whole series.
///
/// For a series of `k` finite values, the point `x` gets `100 * #{v <= x} / k`.
/// Equal values share a rank. Non-finite values are dropped first.
pub fn percentile_ranks(series: &TimeSeries) -> DerivedSeries {
    let points: Vec<_> = series.iter().filter(|(_, v)| v.is_finite()).copied().collect();
    if points.is_empty() {
        return TimeSeries::new();
    }

    let mut sorted: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    TimeSeries::from_sorted(
        points
            .into_iter()
            .map(|(date, value)| (date, rank_in_sorted(&sorted, value)))
            .collect(),
    )
}

/// [`percentile_ranks`] over the inclusive slice `[start, end]`.
pub fn percentile_ranks_in_window(
    series: &TimeSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> DerivedSeries {
    percentile_ranks(&series.slice(start, end))
}

/// Rank of the last observation inside `[start, end]` relative to the whole slice.
///
/// `None` when the slice is empty or its last observation is not finite; an earlier
/// point is never ranked in its place.
pub fn latest_percentile_rank(
    series: &TimeSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<f64> {
    let window = series.slice(start, end);
    let Some((date, latest)) = window.last() else {
        debug!("percentile rank: empty slice {} .. {}", start, end);
        return None;
    };
    if !latest.is_finite() {
        debug!("percentile rank: latest value on {} is not finite", date);
        return None;
    }
    percentile_ranks(&window).last().map(|(_, r)| r)
}

/// Rank of each point against its own trailing `window` observations (inclusive).
///
/// Not used by the pipeline, which ranks against a fixed historical slice; this is the
/// rolling reading of the same statistic. The first `window - 1` dates are left out.
pub fn rolling_percentile_ranks(series: &TimeSeries, window: usize) -> DerivedSeries {
    if window == 0 || series.len() < window {
        return TimeSeries::new();
    }

    let points = series.points();
    let mut out = Vec::with_capacity(points.len() + 1 - window);
    let mut sorted = Vec::with_capacity(window);

    for end in window - 1..points.len() {
        let trailing = &points[end + 1 - window..=end];
        if trailing.iter().any(|(_, v)| !v.is_finite()) {
            continue;
        }
        sorted.clear();
        sorted.extend(trailing.iter().map(|(_, v)| *v));
        sorted.sort_by(|a, b| a.total_cmp(b));

        let (date, value) = points[end];
        out.push((date, rank_in_sorted(&sorted, value)));
    }

    TimeSeries::from_sorted(out)
}
