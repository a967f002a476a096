use chrono::NaiveDate;
use log::debug;
use statrs::statistics::Statistics;

use super::types::*;
use crate::metrics::{period_returns, ReturnType};
use crate::series::{align_columns, DerivedSeries, TimeSeries};

/// Smallest window that leaves two returns for sample covariance.
pub const MIN_BETA_WINDOW: usize = 3;

/// Rolling beta and correlation of one instrument against the benchmark, both
/// already on a shared, gap-free date axis.
///
/// The point at row `t` uses the `window` prices ending at `t`, i.e. `window - 1`
/// returns. Rows `0 .. window - 1` produce nothing. Where the benchmark's returns have
/// zero variance both statistics are undefined at that row; where only the
/// instrument is flat, beta is 0 and correlation is undefined.
pub(crate) fn rolling_stats_on_axis(
    dates: &[NaiveDate],
    instrument: &[f64],
    benchmark: &[f64],
    window: usize,
    kind: ReturnType,
) -> RollingStats {
    debug_assert_eq!(dates.len(), instrument.len());
    debug_assert_eq!(dates.len(), benchmark.len());

    if window < MIN_BETA_WINDOW || dates.len() < window {
        debug!(
            "rolling beta: {} aligned observations for window {}, returning empty",
            dates.len(),
            window
        );
        return RollingStats::default();
    }

    let ri = period_returns(instrument, kind);
    let rb = period_returns(benchmark, kind);

    let mut beta = Vec::with_capacity(dates.len() + 1 - window);
    let mut correlation = Vec::with_capacity(dates.len() + 1 - window);

    for end in window - 1..dates.len() {
        let xi = &ri[end + 1 - window..end];
        let xb = &rb[end + 1 - window..end];
        if xi.iter().chain(xb).any(|r| !r.is_finite()) {
            continue;
        }

        let var_b = xb.variance();
        if var_b <= 0.0 || !var_b.is_finite() {
            continue;
        }
        let cov = xi.covariance(xb);
        beta.push((dates[end], cov / var_b));

        let var_i = xi.variance();
        if var_i > 0.0 {
            let rho = cov / (var_i.sqrt() * var_b.sqrt());
            correlation.push((dates[end], rho.clamp(-1.0, 1.0)));
        }
    }

    RollingStats {
        beta: TimeSeries::from_sorted(beta),
        correlation: TimeSeries::from_sorted(correlation),
    }
}

/// Beta and correlation of a single instrument series against a benchmark series.
///
/// The pair is aligned first (outer join, forward-fill, drop incomplete dates).
pub fn rolling_beta_correlation(
    instrument: &TimeSeries,
    benchmark: &TimeSeries,
    config: &CrossAssetConfig,
) -> RollingStats {
    let (dates, columns) = align_columns(&[benchmark, instrument]);
    match columns.as_slice() {
        [bench, inst] => {
            rolling_stats_on_axis(&dates, inst, bench, config.window, config.returns)
        }
        _ => RollingStats::default(),
    }
}

/// Rolling beta alone; see [`rolling_beta_correlation`].
pub fn rolling_beta(
    instrument: &TimeSeries,
    benchmark: &TimeSeries,
    config: &CrossAssetConfig,
) -> DerivedSeries {
    rolling_beta_correlation(instrument, benchmark, config).beta
}

/// Rolling Pearson correlation alone; see [`rolling_beta_correlation`].
pub fn rolling_correlation(
    instrument: &TimeSeries,
    benchmark: &TimeSeries,
    config: &CrossAssetConfig,
) -> DerivedSeries {
    rolling_beta_correlation(instrument, benchmark, config).correlation
}
