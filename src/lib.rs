//! # FXRV-Lib: FX Relative-Value Analytics
//!
//! `fxrv-lib` turns per-instrument FX spot and implied-volatility histories into
//! relative-value screens: where current implied vol sits in its own history, how rich
//! it is against realized vol, and how each cross co-moves with a benchmark.
//!
//! ## Core Features
//!
//! - **Alignment**: outer join on date, per-instrument forward-fill, drop of incomplete dates
//! - **Realized Volatility**: rolling annualized standard deviation of log returns
//! - **Richness**: implied-minus-realized spread and percentile rank over a historical slice
//! - **Cross-Asset**: rolling beta and correlation against a benchmark series
//! - **Injected Data Sources**: in-memory, CSV and synthetic sources behind one trait
//! - **Charts**: SVG output through a pluggable chart sink
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fxrv_lib::{
//!     default_configs, render_report, run_relative_value, SvgChartSink, SyntheticSource,
//! };
//!
//! let source = SyntheticSource::new(7);
//! let config = default_configs::g10();
//!
//! let report = run_relative_value(&source, config)?;
//! for point in &report.richness {
//!     println!(
//!         "{}: {:.0}th percentile, spread {:+.2}",
//!         point.key, point.percentile_rank, point.spread
//!     );
//! }
//!
//! let mut sink = SvgChartSink::new(".");
//! render_report(&report, &mut sink)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **Fetch**: one spot and one implied-vol series per instrument from a [`DataSource`]
//! 2. **Align**: spot, realized vol and implied vol tables on gap-free date axes
//! 3. **Derive**: spread table, percentile rank of the latest implied vol, richness points
//! 4. **Cross-asset** (optional): rolling beta/correlation of spot against a benchmark
//!
//! Degenerate inputs (empty series, windows longer than history) produce empty outputs;
//! only data-source failures are returned as errors.

// ================================================================================================
// MODULES
// ================================================================================================

pub mod calendar;
pub mod cross_asset;
pub mod metrics;
pub mod pipeline;
pub mod presentation;
pub mod series;
pub mod source;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::Result;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Core data model
pub use series::{
    align, forward_fill, inner_join, AlignedTable, DerivedSeries, InstrumentKey, Observation,
    SeriesSet, TimeSeries,
};

// Derived metrics
pub use metrics::{
    implied_realized_spread, latest_percentile_rank, percentile_ranks, percentile_ranks_in_window,
    period_returns, realized_volatility, rolling_percentile_ranks, spread_table,
    RealizedVolConfig, ReturnType, TRADING_DAYS_PER_YEAR,
};

// Cross-asset statistics
pub use cross_asset::{
    cross_asset, rolling_beta, rolling_beta_correlation, rolling_correlation, CrossAssetConfig,
    CrossAssetResult, RollingStats,
};

// Pipeline configuration and outputs
pub use pipeline::{
    BenchmarkConfig, DatasetConfig, ImpliedVolConfig, PipelineConfig, RelativeValuePipeline,
    RelativeValueReport, RichnessPoint,
};

// Data sources
pub use source::{
    CsvSource, DataSource, InMemorySource, SeriesRequest, SourceError, SyntheticProcess,
    SyntheticSource,
};

// Presentation
pub use presentation::{
    render_report, richness_chart, ChartSink, LineChart, ScatterChart, ScatterPoint, SvgChartSink,
};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured pipeline settings.
///
/// # Available Configurations
///
/// - [`g10()`]: G10 entry-point-vs-richness screen
/// - [`g10_cross_asset()`]: the same screen plus rolling beta/correlation to an index
pub mod default_configs {
    use crate::pipeline::PipelineConfig;

    /// G10 crosses against their own implied/realized vol history.
    ///
    /// **Characteristics:**
    /// - Instruments: USDJPY, EURUSD, AUDUSD, GBPUSD, USDCAD, USDNOK, NZDUSD, USDSEK,
    ///   USDCHF, AUDJPY
    /// - History from 2005-08-26 to the previous business day
    /// - Realized vol window: 63 observations (~3 months)
    /// - Implied vol: 3m ATM (delta-neutral), NYC close
    /// - Percentile slice: 2018-09-01 .. 2020-09-08
    ///
    /// # Example
    ///
    /// ```rust
    /// use fxrv_lib::default_configs;
    ///
    /// let config = default_configs::g10();
    /// assert_eq!(config.realized_vol_window, 63);
    /// ```
    pub fn g10() -> PipelineConfig {
        PipelineConfig::g10()
    }

    /// G10 screen with rolling beta/correlation against `index` (84-observation window).
    ///
    /// # Example
    ///
    /// ```rust
    /// use fxrv_lib::default_configs;
    ///
    /// let config = default_configs::g10_cross_asset("SPX");
    /// assert_eq!(config.beta_window, 84);
    /// assert!(config.benchmark.is_some());
    /// ```
    pub fn g10_cross_asset(index: &str) -> PipelineConfig {
        PipelineConfig::g10_cross_asset(index)
    }
}

/// Run the relative-value pipeline once against `source`.
///
/// # Arguments
///
/// * `source` - Market-data collaborator; pass a reference to keep ownership
/// * `config` - Run settings, see [`default_configs`] for presets
///
/// # Errors
///
/// * `anyhow::Error` if `config` fails validation
/// * `anyhow::Error` wrapping the [`SourceError`] of the first failed fetch. The source
///   error can be recovered with `err.downcast_ref::<SourceError>()`.
pub fn run_relative_value<S: DataSource>(
    source: S,
    config: PipelineConfig,
) -> Result<RelativeValueReport> {
    RelativeValuePipeline::new(source, config)?.run()
}
