//! OHLC candles and the candle admin results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::trading::TradingError;

/// One OHLC bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Candle {
    #[serde(with = "timestamp")]
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Check that a series is ordered by non-decreasing time.
pub fn validate_series(candles: &[Candle]) -> Result<(), TradingError> {
    match candles.windows(2).position(|w| w[1].time < w[0].time) {
        Some(i) => Err(TradingError::UnorderedSeries { index: i + 1 }),
        None => Ok(()),
    }
}

/// Result of importing candles from the market-data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImportResult {
    pub imported_count: u64,
    pub source: String,
    pub symbol: String,
    pub timeframe: String,
    pub message: String,
}

/// Result of deleting stored candles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
