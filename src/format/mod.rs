//! Display formatting for money, percentages, prices and dates.

mod dates;
mod numbers;

use serde::Serialize;

pub use crate::models::exit_reason_label;
pub use dates::{
    format_date, format_date_str, format_date_with, format_duration, format_relative_time,
    format_relative_time_from, to_iso_string, DEFAULT_DATE_FORMAT,
};
pub use numbers::{
    format_compact, format_currency, format_percent, format_pnl, format_price, truncate_decimals,
    PnlDisplay,
};

/// Semantic color of a displayed figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Profit,
    Loss,
    Neutral,
    Caution,
}

impl Tone {
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Profit => "#22c55e",
            Tone::Loss => "#ef4444",
            Tone::Neutral => "#64748b",
            Tone::Caution => "#f59e0b",
        }
    }
}

/// Sign prefix of a P&L figure. Zero carries no sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Plus,
    Minus,
    None,
}

impl Sign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
            Sign::None => "",
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
