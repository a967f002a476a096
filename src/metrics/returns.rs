use serde::{Deserialize, Serialize};

/// Return convention used when turning prices into period returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// `p[t] / p[t-1] - 1`
    #[default]
    Simple,
    /// `ln(p[t] / p[t-1])`
    Log,
}

/// Period returns of a price path. Output has `prices.len() - 1` entries; entry `j`
/// is the return from `prices[j]` to `prices[j + 1]`.
///
/// Undefined returns (zero or, for log returns, non-positive prices) are `NaN` so
/// callers can skip any window that touches them.
pub fn period_returns(prices: &[f64], kind: ReturnType) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            match kind {
                ReturnType::Simple if prev != 0.0 => curr / prev - 1.0,
                ReturnType::Log if prev > 0.0 && curr > 0.0 => (curr / prev).ln(),
                _ => f64::NAN,
            }
        })
        .collect()
}
