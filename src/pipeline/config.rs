use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::calendar::previous_business_day;
use crate::cross_asset::CrossAssetConfig;
use crate::metrics::{RealizedVolConfig, ReturnType, MIN_VOL_WINDOW};
use crate::series::InstrumentKey;

/// Where to read one field of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub dataset: String,
    pub field: String,
    /// Extra dimensions passed through to the source
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

/// Implied-vol dataset plus the factor that converts it to vol points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolConfig {
    #[serde(flatten)]
    pub source: DatasetConfig,
    /// Implied vol arrives in decimals; 100 puts it in vol points
    #[serde(default = "default_implied_vol_scale")]
    pub scale: f64,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        let filters = [("tenor", "3m"), ("deltaStrike", "DN"), ("location", "NYC")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            source: DatasetConfig {
                dataset: "FXIMPLIEDVOL_PREMIUM".to_string(),
                field: "impliedVolatility".to_string(),
                filters,
            },
            scale: default_implied_vol_scale(),
        }
    }
}

/// Benchmark series for the cross-asset stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub instrument: InstrumentKey,
    #[serde(flatten)]
    pub source: DatasetConfig,
}

/// Everything one relative-value run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Instruments to screen, in presentation order
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentKey>,

    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// `None` = previous business day relative to the run date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default = "default_spot")]
    pub spot: DatasetConfig,

    #[serde(default)]
    pub implied_vol: ImpliedVolConfig,

    /// Trailing observations per realized-vol point
    #[serde(default = "default_realized_vol_window")]
    pub realized_vol_window: usize,

    #[serde(default = "default_annualization_factor")]
    pub annualization_factor: f64,

    /// Multiplier on realized vol, kept equal to the implied-vol scale
    #[serde(default = "default_implied_vol_scale")]
    pub realized_vol_scale: f64,

    /// Trailing observations per beta / correlation point
    #[serde(default = "default_beta_window")]
    pub beta_window: usize,

    #[serde(default)]
    pub beta_returns: ReturnType,

    #[serde(default = "default_percentile_slice_start")]
    pub percentile_slice_start: NaiveDate,

    #[serde(default = "default_percentile_slice_end")]
    pub percentile_slice_end: NaiveDate,

    /// Date at which the spread is read for the richness scatter; defaults to the
    /// percentile slice end
    #[serde(default)]
    pub richness_date: Option<NaiveDate>,

    /// Enables the cross-asset stage
    #[serde(default)]
    pub benchmark: Option<BenchmarkConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            start_date: default_start_date(),
            end_date: None,
            spot: default_spot(),
            implied_vol: ImpliedVolConfig::default(),
            realized_vol_window: default_realized_vol_window(),
            annualization_factor: default_annualization_factor(),
            realized_vol_scale: default_implied_vol_scale(),
            beta_window: default_beta_window(),
            beta_returns: ReturnType::default(),
            percentile_slice_start: default_percentile_slice_start(),
            percentile_slice_end: default_percentile_slice_end(),
            richness_date: None,
            benchmark: None,
        }
    }
}

impl PipelineConfig {
    /// G10 entry-point-vs-richness screen, no benchmark.
    pub fn g10() -> Self {
        Self::default()
    }

    /// G10 screen plus rolling beta/correlation against an equity index.
    pub fn g10_cross_asset(index: &str) -> Self {
        Self {
            benchmark: Some(BenchmarkConfig {
                instrument: InstrumentKey::from(index),
                source: DatasetConfig {
                    dataset: "INDEX_SPOT".to_string(),
                    field: "spot".to_string(),
                    filters: BTreeMap::new(),
                },
            }),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).context("failed to parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Reject settings that can never produce output.
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(anyhow!("PipelineConfig: at least one instrument is required"));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(anyhow!(
                    "PipelineConfig: end_date {} precedes start_date {}",
                    end,
                    self.start_date
                ));
            }
        }
        if self.percentile_slice_end < self.percentile_slice_start {
            return Err(anyhow!(
                "PipelineConfig: percentile slice end {} precedes start {}",
                self.percentile_slice_end,
                self.percentile_slice_start
            ));
        }
        if self.realized_vol_window < MIN_VOL_WINDOW {
            return Err(anyhow!(
                "PipelineConfig: realized_vol_window must be >= {}, got {}",
                MIN_VOL_WINDOW,
                self.realized_vol_window
            ));
        }
        if self.beta_window < crate::cross_asset::MIN_BETA_WINDOW {
            return Err(anyhow!(
                "PipelineConfig: beta_window must be >= {}, got {}",
                crate::cross_asset::MIN_BETA_WINDOW,
                self.beta_window
            ));
        }
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(anyhow!(
                "PipelineConfig: annualization_factor must be positive, got {}",
                self.annualization_factor
            ));
        }
        Ok(())
    }

    /// Configured end date, or the business day before `today`.
    pub fn resolve_end_date(&self, today: NaiveDate) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| previous_business_day(today))
    }

    pub fn richness_date(&self) -> NaiveDate {
        self.richness_date.unwrap_or(self.percentile_slice_end)
    }

    pub fn realized_vol(&self) -> RealizedVolConfig {
        RealizedVolConfig {
            window: self.realized_vol_window,
            annualization_factor: self.annualization_factor,
            scale: self.realized_vol_scale,
        }
    }

    pub fn cross_asset(&self) -> CrossAssetConfig {
        CrossAssetConfig {
            window: self.beta_window,
            returns: self.beta_returns,
        }
    }
}

fn default_instruments() -> Vec<InstrumentKey> {
    [
        "USDJPY", "EURUSD", "AUDUSD", "GBPUSD", "USDCAD", "USDNOK", "NZDUSD", "USDSEK", "USDCHF",
        "AUDJPY",
    ]
    .into_iter()
    .map(InstrumentKey::from)
    .collect()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn default_start_date() -> NaiveDate {
    ymd(2005, 8, 26)
}

fn default_spot() -> DatasetConfig {
    DatasetConfig {
        dataset: "FXSPOT_PREMIUM".to_string(),
        field: "spot".to_string(),
        filters: BTreeMap::new(),
    }
}

fn default_implied_vol_scale() -> f64 {
    100.0
}

fn default_realized_vol_window() -> usize {
    63
}

fn default_annualization_factor() -> f64 {
    crate::metrics::TRADING_DAYS_PER_YEAR
}

fn default_beta_window() -> usize {
    84
}

fn default_percentile_slice_start() -> NaiveDate {
    ymd(2018, 9, 1)
}

fn default_percentile_slice_end() -> NaiveDate {
    ymd(2020, 9, 8)
}
