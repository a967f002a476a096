use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};

use super::config::{DatasetConfig, PipelineConfig};
use super::types::*;
use crate::cross_asset::cross_asset;
use crate::metrics::{latest_percentile_rank, realized_volatility, spread_table};
use crate::series::{align, AlignedTable, InstrumentKey, SeriesSet, TimeSeries};
use crate::source::{DataSource, SeriesRequest};

/// One relative-value run: fetch, align, derive, compare against the benchmark.
///
/// The data source is injected; the pipeline holds no other state and can be run
/// repeatedly.
pub struct RelativeValuePipeline<S: DataSource> {
    source: S,
    config: PipelineConfig,
}

impl<S: DataSource> RelativeValuePipeline<S> {
    /// Validates `config` up front so a bad window or date range fails before any fetch.
    pub fn new(source: S, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with the end date resolved against today's date (UTC).
    pub fn run(&self) -> Result<RelativeValueReport> {
        self.run_as_of(Utc::now().date_naive())
    }

    /// Run as if today were `today`. Only matters when no explicit end date is set.
    pub fn run_as_of(&self, today: NaiveDate) -> Result<RelativeValueReport> {
        let config = &self.config;
        let start = config.start_date;
        let end = config.resolve_end_date(today);
        info!(
            "relative value run: {} instruments, {} .. {}",
            config.instruments.len(),
            start,
            end
        );

        // 1) Fetch everything eagerly
        let mut spot_set = SeriesSet::new();
        let mut implied_set = SeriesSet::new();
        for key in &config.instruments {
            let spot = self.fetch(&config.spot, key, start, end)?;
            let implied = self
                .fetch(&config.implied_vol.source, key, start, end)?
                .scale(config.implied_vol.scale);
            if spot.is_empty() || implied.is_empty() {
                warn!(
                    "{}: {} spot / {} implied vol observations",
                    key,
                    spot.len(),
                    implied.len()
                );
            }
            spot_set.insert(key.clone(), spot);
            implied_set.insert(key.clone(), implied);
        }

        let benchmark = match &config.benchmark {
            Some(bench) => Some(self.fetch(&bench.source, &bench.instrument, start, end)?),
            None => None,
        };

        // 2) Realized vol from each instrument's own spot history, then align
        let vol_config = config.realized_vol();
        let realized_set: SeriesSet = spot_set
            .iter()
            .map(|(key, spot)| (key.clone(), realized_volatility(spot, &vol_config)))
            .collect();

        let spot = align(&spot_set);
        let realized_vol = align(&realized_set);
        let implied_vol = align(&implied_set);
        debug!(
            "aligned rows: spot {}, realized {}, implied {}",
            spot.len(),
            realized_vol.len(),
            implied_vol.len()
        );

        // 3) Derived metrics
        let spread = spread_table(&implied_vol, &realized_vol);
        let percentile_ranks = self.percentile_ranks(&implied_vol);
        let richness = richness_points(&percentile_ranks, &spread, config.richness_date());

        // 4) Cross-asset
        let cross = benchmark.map(|bench| {
            let result = cross_asset(&bench, &spot, &config.cross_asset());
            info!(
                "cross-asset: beta/correlation for {} instruments (window {})",
                result.len(),
                config.beta_window
            );
            result
        });

        info!(
            "relative value run complete: {} richness points",
            richness.len()
        );

        Ok(RelativeValueReport {
            start_date: start,
            end_date: end,
            spot,
            realized_vol,
            implied_vol,
            spread,
            percentile_ranks,
            richness,
            cross_asset: cross,
        })
    }

    fn fetch(
        &self,
        dataset: &DatasetConfig,
        key: &InstrumentKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        let request = SeriesRequest::new(&dataset.dataset, key.clone(), &dataset.field, start, end)
            .with_filters(dataset.filters.clone());
        let series = self.source.fetch(&request).with_context(|| {
            format!("fetching {} {} for {}", dataset.dataset, dataset.field, key)
        })?;
        debug!(
            "{} {} {}: {} observations",
            dataset.dataset,
            dataset.field,
            key,
            series.len()
        );
        Ok(series)
    }

    fn percentile_ranks(&self, implied_vol: &AlignedTable) -> Vec<(InstrumentKey, f64)> {
        let (from, to) = (
            self.config.percentile_slice_start,
            self.config.percentile_slice_end,
        );
        implied_vol
            .columns()
            .filter_map(|(key, series)| match latest_percentile_rank(&series, from, to) {
                Some(rank) => Some((key.clone(), rank)),
                None => {
                    warn!("{}: no implied vol inside {} .. {}", key, from, to);
                    None
                }
            })
            .collect()
    }
}

/// Pair each instrument's percentile rank with its spread as of `date`.
///
/// Uses the latest spread on or before `date`, so a holiday on the richness date
/// does not drop the instrument.
pub fn richness_points(
    percentile_ranks: &[(InstrumentKey, f64)],
    spread: &AlignedTable,
    date: NaiveDate,
) -> Vec<RichnessPoint> {
    percentile_ranks
        .iter()
        .filter_map(|(key, rank)| {
            let column = spread.column(key.as_str())?;
            let Some((spread_date, value)) = column.value_as_of(date) else {
                warn!("{}: no spread on or before {}", key, date);
                return None;
            };
            Some(RichnessPoint {
                key: key.clone(),
                percentile_rank: *rank,
                spread: value,
                spread_date,
            })
        })
        .collect()
}
