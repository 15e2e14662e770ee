//! Backend REST client, response normalization and the market-data client.

mod auth;
mod candles;
mod client;
mod error;
mod market_data;
mod positions;
mod retry;
mod signals;
mod types;

pub use auth::check_registration;
pub use client::{classify, normalize, ApiClient};
pub use error::{ApiError, ErrorKind};
pub use market_data::{parse_klines, MarketDataClient, MARKET_DATA_BASE};
pub use retry::RetryPolicy;
pub use types::*;
