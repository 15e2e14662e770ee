//! Trading math: risk/reward, position sizing, P&L and chart indicators.

mod indicators;
mod math;

use thiserror::Error;

pub use indicators::{ema, Ema, EmaPoint};
pub use math::{is_profitable, pnl, pnl_percent, position_size, risk_reward};

/// Inputs the trading math refuses to compute on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TradingError {
    #[error("stop loss equals entry price: risk distance is zero")]
    ZeroRisk,

    #[error("entry price is zero")]
    ZeroEntry,

    #[error("candle series goes back in time at index {index}")]
    UnorderedSeries { index: usize },
}
