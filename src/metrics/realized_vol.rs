use log::debug;
use statrs::statistics::Statistics;

use super::returns::{period_returns, ReturnType};
use crate::series::{DerivedSeries, TimeSeries};

/// Business days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Smallest window that leaves two returns for a sample standard deviation.
pub const MIN_VOL_WINDOW: usize = 3;

/// Settings for [`realized_volatility`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealizedVolConfig {
    /// Number of trailing price observations per point (63 ≈ 3 months)
    pub window: usize,
    /// Periods per year; the daily standard deviation is scaled by its square root
    pub annualization_factor: f64,
    /// Final multiplier, 100 quotes the result in vol points like implied vol
    pub scale: f64,
}

impl Default for RealizedVolConfig {
    fn default() -> Self {
        Self {
            window: 63,
            annualization_factor: TRADING_DAYS_PER_YEAR,
            scale: 100.0,
        }
    }
}

impl RealizedVolConfig {
    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            ..Default::default()
        }
    }
}

/// Rolling annualized standard deviation of log returns.
///
/// The point on date `t` uses the `window` prices ending at `t` (so `window - 1`
/// returns). The first `window - 1` dates have no value and are left out entirely.
/// Windows containing a non-positive price are skipped.
///
/// A series shorter than the window, or a window below [`MIN_VOL_WINDOW`], gives an
/// empty result.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, NaiveDate};
/// use fxrv_lib::{realized_volatility, RealizedVolConfig, TimeSeries};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let spot = TimeSeries::from_observations(
///     (0..100).map(|i| (start + Duration::days(i), 100.0 + (i % 7) as f64)),
/// );
/// let vol = realized_volatility(&spot, &RealizedVolConfig::with_window(63));
/// assert_eq!(vol.len(), 100 - 63 + 1);
/// ```
pub fn realized_volatility(spot: &TimeSeries, config: &RealizedVolConfig) -> DerivedSeries {
    let w = config.window;
    if w < MIN_VOL_WINDOW || spot.len() < w {
        debug!(
            "realized vol: {} observations for window {}, returning empty series",
            spot.len(),
            w
        );
        return TimeSeries::new();
    }

    let returns = period_returns(&spot.values(), ReturnType::Log);
    let annualize = config.annualization_factor.sqrt() * config.scale;

    let mut points = Vec::with_capacity(spot.len() + 1 - w);
    for (end, (date, _)) in spot.iter().enumerate().skip(w - 1) {
        let window = &returns[end + 1 - w..end];
        if window.iter().any(|r| !r.is_finite()) {
            continue;
        }
        let vol = window.std_dev() * annualize;
        if vol.is_finite() {
            points.push((*date, vol));
        }
    }

    TimeSeries::from_sorted(points)
}
