//! Journal metrics computed locally from a set of positions.

mod calculator;

use rust_decimal::Decimal;
use serde::Serialize;

pub use calculator::JournalCalculator;

/// Performance summary of closed positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalMetrics {
    // === Counts ===
    pub closed_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub breakeven_trades: u32,
    /// Percent of closed trades that made money
    pub win_rate: f64,

    // === P&L ===
    pub total_pnl: Decimal,
    pub average_pnl: Decimal,
    pub best_trade: Option<Decimal>,
    pub worst_trade: Option<Decimal>,
    pub avg_win: Decimal,
    /// Average loss as a positive amount
    pub avg_loss: Decimal,
    pub total_fees: Decimal,

    // === Edge ===
    /// Gross profit over gross loss; absent when there are no losses
    pub profit_factor: Option<f64>,
    pub expectancy: Decimal,
    pub average_risk_reward: Option<Decimal>,

    // === Risk ===
    pub max_drawdown: Decimal,
    /// Drawdown as a fraction of the peak, when the peak was above zero
    pub max_drawdown_pct: f64,
    pub pnl_std_dev: Option<f64>,

    // === Streaks ===
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
}
