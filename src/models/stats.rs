//! Portfolio statistics computed by the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format::Tone;

/// Aggregate portfolio figures. The client only formats them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PortfolioStats {
    // === Position counts ===
    pub total_positions: u64,
    pub open_positions: u64,
    pub closed_positions: u64,
    pub pending_positions: u64,

    // === P&L ===
    #[serde(rename = "totalPnL")]
    pub total_pnl: Decimal,
    #[serde(rename = "averagePnL")]
    pub average_pnl: Decimal,
    #[serde(rename = "bestTradePnL")]
    pub best_trade_pnl: Decimal,
    #[serde(rename = "worstTradePnL")]
    pub worst_trade_pnl: Decimal,

    // === Win rate (percent) ===
    pub win_rate: f64,
    pub long_win_rate: Option<f64>,
    pub short_win_rate: Option<f64>,

    // === Risk ===
    pub average_risk_reward: Option<Decimal>,
    pub total_fees: Option<Decimal>,

    // === Symbol breakdown ===
    #[serde(rename = "btcPnL")]
    pub btc_pnl: Option<Decimal>,
    #[serde(rename = "ethPnL")]
    pub eth_pnl: Option<Decimal>,

    // === Streaks ===
    pub consecutive_wins: Option<u32>,
    pub consecutive_losses: Option<u32>,
    pub max_consecutive_wins: Option<u32>,
    pub max_consecutive_losses: Option<u32>,

    // === Duration ===
    #[serde(alias = "averageTradeDuration")]
    pub average_trade_duration_ms: Option<i64>,
    pub shortest_trade_ms: Option<i64>,
    pub longest_trade_ms: Option<i64>,
}

impl PortfolioStats {
    pub fn win_rate_tone(&self) -> Tone {
        win_rate_tone(self.win_rate)
    }
}

/// Green from 60%, orange from 50%, red below.
pub fn win_rate_tone(win_rate: f64) -> Tone {
    if win_rate >= 60.0 {
        Tone::Profit
    } else if win_rate >= 50.0 {
        Tone::Caution
    } else {
        Tone::Loss
    }
}
