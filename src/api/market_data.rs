//! Direct candle fetch from the public Binance klines API.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::ApiError;
use crate::models::{Candle, Timeframe};

pub const MARKET_DATA_BASE: &str = "https://api.binance.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One kline row: a 12-element array, prices as decimal strings.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Kline(
    i64,    // open time, ms
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time
    String, // quote asset volume
    u64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // unused
);

impl Kline {
    fn into_candle(self) -> Result<Candle, ApiError> {
        let time = Utc
            .timestamp_millis_opt(self.0)
            .single()
            .ok_or_else(|| ApiError::market_data(0, format!("Invalid kline open time {}", self.0)))?;

        Ok(Candle {
            time,
            open: parse_price(&self.1)?,
            high: parse_price(&self.2)?,
            low: parse_price(&self.3)?,
            close: parse_price(&self.4)?,
            volume: Some(parse_price(&self.5)?),
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, ApiError> {
    raw.parse::<f64>()
        .map_err(|_| ApiError::market_data(0, format!("Invalid kline value '{}'", raw)))
}

/// Parse a klines response body into candles, rejecting malformed rows.
pub fn parse_klines(body: &[u8]) -> Result<Vec<Candle>, ApiError> {
    let rows: Vec<Kline> = serde_json::from_slice(body)
        .map_err(|e| ApiError::market_data(0, format!("Malformed klines response: {}", e)))?;

    rows.into_iter().map(Kline::into_candle).collect()
}

/// Client for the public market-data API. No authentication.
pub struct MarketDataClient {
    http: Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(MARKET_DATA_BASE)
    }

    /// Create with a custom base URL (for testing or a mirror).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Latest `limit` candles of `symbol`, oldest first.
    ///
    /// Every failure is a market-data error, so callers may retry it.
    pub async fn klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>, ApiError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let symbol = symbol.trim().to_uppercase();
        let limit_param = limit.to_string();
        debug!(url = %url, symbol = %symbol, interval = timeframe.market_interval(), limit, "Fetching klines");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", timeframe.market_interval()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::market_data(0, format!("Binance request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::market_data(
                status.as_u16(),
                format!("Binance API error: {}", status.as_u16()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::market_data(status.as_u16(), e.to_string()))?;

        parse_klines(&body)
    }
}
