//! Number formatting with en-US digit grouping.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::{Sign, Tone};

const PLACEHOLDER: &str = "-";

/// Text, tone and sign of a formatted P&L figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PnlDisplay {
    pub text: String,
    pub tone: Tone,
    pub sign: Sign,
}

impl PnlDisplay {
    pub fn color(&self) -> &'static str {
        self.tone.color()
    }
}

fn round(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fixed-decimal amount with thousands separators, e.g. `1,234.50`.
pub fn format_currency(value: Option<Decimal>, decimals: u32) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    let rounded = round(value, decimals);
    let digits = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Percentage with an explicit `+` for non-negative values.
pub fn format_percent(value: Option<Decimal>, decimals: u32) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    let prefix = if value >= Decimal::ZERO { "+" } else { "" };
    format!("{}{}%", prefix, format_currency(Some(value), decimals))
}

pub fn format_pnl(value: Option<Decimal>) -> PnlDisplay {
    let Some(value) = value else {
        return PnlDisplay {
            text: PLACEHOLDER.to_string(),
            tone: Tone::Neutral,
            sign: Sign::None,
        };
    };

    let (sign, tone) = if value > Decimal::ZERO {
        (Sign::Plus, Tone::Profit)
    } else if value < Decimal::ZERO {
        (Sign::Minus, Tone::Loss)
    } else {
        (Sign::None, Tone::Neutral)
    };

    PnlDisplay {
        text: format!("{}{}", sign, format_currency(Some(value.abs()), 2)),
        tone,
        sign,
    }
}

/// Short form with K/M/B suffixes, e.g. `1.50K`.
pub fn format_compact(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    let abs = value.abs();
    let sign = if value < Decimal::ZERO { "-" } else { "" };

    let units = [
        (Decimal::from(1_000_000_000u64), 'B'),
        (Decimal::from(1_000_000u64), 'M'),
        (Decimal::from(1_000u64), 'K'),
    ];
    for (unit, suffix) in units {
        if abs >= unit {
            return format!("{}{:.2}{}", sign, round(abs / unit, 2), suffix);
        }
    }

    format_currency(Some(value), 2)
}

/// Price with precision by instrument class.
///
/// Crypto pairs (USDT or BTC quoted) show 6 decimals below 1 and 2 above,
/// six-letter forex codes show 5, anything else 2.
pub fn format_price(value: Option<Decimal>, symbol: &str) -> String {
    let Some(price) = value else {
        return PLACEHOLDER.to_string();
    };

    let decimals = if symbol.contains("USDT") || symbol.contains("BTC") {
        if price < Decimal::ONE {
            6
        } else {
            2
        }
    } else if symbol.chars().count() == 6 {
        5
    } else {
        2
    };

    format_currency(Some(price), decimals)
}

/// Drop digits past `decimals` without rounding.
pub fn truncate_decimals(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}
