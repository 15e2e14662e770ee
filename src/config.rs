//! Runtime settings read from the environment and `.env`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::api::{RetryPolicy, DEFAULT_PAGE_SIZE, MARKET_DATA_BASE};
use crate::models::{Timeframe, TradingMode};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATABASE: &str = "sqlite:./signaldesk.db?mode=rwc";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Backend base URL, without the `/api` suffix.
    pub api_url: String,
    pub market_url: String,
    pub timeout: Duration,
    /// Credential store location.
    pub database: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub mode: TradingMode,
    pub page_size: u32,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            market_url: MARKET_DATA_BASE.to_string(),
            timeout: Duration::from_secs(30),
            database: DEFAULT_DATABASE.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            timeframe: Timeframe::M5,
            mode: TradingMode::Scalping,
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: 3,
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read `SIGNALDESK_*` variables.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Missing keys keep their defaults;
    /// unparseable ones are logged and also keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let text = |key: &str, default: String| -> String {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => v.trim().to_string(),
                _ => default,
            }
        };

        let timeout_secs: u64 = parsed(&lookup, "SIGNALDESK_TIMEOUT_SECS", defaults.timeout.as_secs());
        let page_size: u32 = parsed(&lookup, "SIGNALDESK_PAGE_SIZE", defaults.page_size);
        let max_retries: u32 = parsed(&lookup, "SIGNALDESK_MAX_RETRIES", defaults.max_retries);

        Self {
            api_url: text("SIGNALDESK_API_URL", defaults.api_url)
                .trim_end_matches('/')
                .to_string(),
            market_url: text("SIGNALDESK_MARKET_URL", defaults.market_url)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            database: text("SIGNALDESK_DATABASE", defaults.database),
            symbol: text("SIGNALDESK_SYMBOL", defaults.symbol).to_uppercase(),
            timeframe: parsed(&lookup, "SIGNALDESK_TIMEFRAME", defaults.timeframe),
            mode: parsed(&lookup, "SIGNALDESK_MODE", defaults.mode),
            page_size: page_size.max(1),
            max_retries,
        }
    }

    /// Policy for idempotent reads: the first attempt plus `max_retries` retries.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_retries.saturating_add(1))
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    if raw.trim().is_empty() {
        return default;
    }
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = %raw, error = %e, default = ?default, "Invalid setting, using default");
            default
        }
    }
}
