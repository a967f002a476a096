use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use std::collections::HashMap;

use super::{DataSource, SeriesRequest, SourceError};
use crate::calendar::business_days;
use crate::metrics::TRADING_DAYS_PER_YEAR;
use crate::series::Observation;

/// Daily process used to simulate one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticProcess {
    /// Price-like path: `S' = S * exp((drift - vol²/2) dt + vol √dt Z)`
    GeometricBrownian {
        initial: f64,
        drift: f64,
        volatility: f64,
    },
    /// Level that mean-reverts (e.g. an implied vol in decimals), floored above zero
    MeanReverting {
        mean: f64,
        speed: f64,
        volatility: f64,
    },
}

impl Default for SyntheticProcess {
    fn default() -> Self {
        SyntheticProcess::GeometricBrownian {
            initial: 1.0,
            drift: 0.0,
            volatility: 0.10,
        }
    }
}

/// Deterministic simulated market data on weekday dates.
///
/// Each `(dataset, instrument)` pair gets its own random stream derived from the base
/// seed, so results are reproducible and instruments are not identical.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    default_process: SyntheticProcess,
    processes: HashMap<String, SyntheticProcess>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            default_process: SyntheticProcess::default(),
            processes: HashMap::new(),
        }
    }

    /// Process used for `dataset` instead of the default.
    pub fn with_process(mut self, dataset: &str, process: SyntheticProcess) -> Self {
        self.processes.insert(dataset.to_string(), process);
        self
    }

    pub fn with_default_process(mut self, process: SyntheticProcess) -> Self {
        self.default_process = process;
        self
    }

    fn stream_seed(&self, request: &SeriesRequest) -> u64 {
        // FNV-1a over "dataset/instrument"
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in request
            .dataset
            .bytes()
            .chain(std::iter::once(b'/'))
            .chain(request.instrument.as_str().bytes())
        {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash ^ self.seed
    }
}

impl DataSource for SyntheticSource {
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError> {
        let process = self
            .processes
            .get(&request.dataset)
            .copied()
            .unwrap_or(self.default_process);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| SourceError::InvalidData(format!("normal distribution: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.stream_seed(request));
        let dt = 1.0 / TRADING_DAYS_PER_YEAR;
        let sqrt_dt = dt.sqrt();

        let dates = business_days(request.start, request.end);
        let mut rows = Vec::with_capacity(dates.len());

        match process {
            SyntheticProcess::GeometricBrownian {
                initial,
                drift,
                volatility,
            } => {
                if initial <= 0.0 {
                    return Err(SourceError::InvalidData(format!(
                        "geometric brownian initial level must be positive, got {}",
                        initial
                    )));
                }
                let mut level = initial;
                for date in dates {
                    rows.push((date, level));
                    let z = normal.sample(&mut rng);
                    level *= ((drift - 0.5 * volatility * volatility) * dt
                        + volatility * sqrt_dt * z)
                        .exp();
                }
            }
            SyntheticProcess::MeanReverting {
                mean,
                speed,
                volatility,
            } => {
                let floor = mean.abs().max(1e-4) * 0.05;
                let mut level = mean;
                for date in dates {
                    rows.push((date, level));
                    let z = normal.sample(&mut rng);
                    level = (level + speed * (mean - level) * dt + volatility * sqrt_dt * z)
                        .max(floor);
                }
            }
        }

        Ok(rows)
    }
}
