//! Trading enumerations shared by signals, positions and requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failed to parse one of the trading enums from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Trade direction of a signal or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

/// Presentation metadata for a direction badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionMetadata {
    pub action: &'static str,
    pub label: &'static str,
    pub arrow: &'static str,
    pub color: &'static str,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
        }
    }

    pub fn metadata(&self) -> DirectionMetadata {
        match self {
            Direction::Long => DirectionMetadata {
                action: "Buy",
                label: "Long",
                arrow: "↑",
                color: "#22c55e",
            },
            Direction::Short => DirectionMetadata {
                action: "Sell",
                label: "Short",
                arrow: "↓",
                color: "#ef4444",
            },
            Direction::Neutral => DirectionMetadata {
                action: "Hold",
                label: "Neutral",
                arrow: "→",
                color: "#64748b",
            },
        }
    }

    /// LONG and SHORT carry price levels; NEUTRAL does not.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LONG" | "BUY" => Ok(Direction::Long),
            "SHORT" | "SELL" => Ok(Direction::Short),
            "NEUTRAL" | "HOLD" => Ok(Direction::Neutral),
            _ => Err(ParseEnumError::new("direction", s)),
        }
    }
}

/// Trading style the signal generator is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingMode {
    Scalping,
    Intraday,
    Swing,
}

impl TradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Scalping => "SCALPING",
            TradingMode::Intraday => "INTRADAY",
            TradingMode::Swing => "SWING",
        }
    }

    /// Number of candles sent to the generator when the caller does not say.
    pub fn default_candle_count(&self) -> u32 {
        match self {
            TradingMode::Scalping => 50,
            TradingMode::Intraday => 100,
            TradingMode::Swing => 200,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TradingMode::Scalping => "Scalping",
            TradingMode::Intraday => "Intraday",
            TradingMode::Swing => "Swing Trading",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SCALPING" => Ok(TradingMode::Scalping),
            "INTRADAY" => Ok(TradingMode::Intraday),
            "SWING" => Ok(TradingMode::Swing),
            _ => Err(ParseEnumError::new("trading mode", s)),
        }
    }
}

/// Candle timeframe as the backend names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
        }
    }

    /// Interval string used by the public klines API.
    pub fn market_interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" | "1M" => Ok(Timeframe::M1),
            "M5" | "5M" => Ok(Timeframe::M5),
            "M15" | "15M" => Ok(Timeframe::M15),
            "M30" | "30M" => Ok(Timeframe::M30),
            "H1" | "1H" => Ok(Timeframe::H1),
            "H4" | "4H" => Ok(Timeframe::H4),
            "D1" | "1D" => Ok(Timeframe::D1),
            "W1" | "1W" => Ok(Timeframe::W1),
            _ => Err(ParseEnumError::new("timeframe", s)),
        }
    }
}

/// Lifecycle state of a position. Transitions are driven by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Pending,
    Open,
    Closed,
    Cancelled,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Pending => "PENDING",
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
            PositionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Badge color for the status.
    pub fn color(&self) -> &'static str {
        match self {
            PositionStatus::Open => "#3b82f6",
            PositionStatus::Closed => "#64748b",
            PositionStatus::Pending => "#f59e0b",
            PositionStatus::Cancelled => "#ef4444",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PositionStatus::Closed | PositionStatus::Cancelled)
    }

    /// PENDING -> OPEN | CANCELLED, OPEN -> CLOSED.
    pub fn can_transition_to(&self, next: PositionStatus) -> bool {
        matches!(
            (self, next),
            (PositionStatus::Pending, PositionStatus::Open)
                | (PositionStatus::Pending, PositionStatus::Cancelled)
                | (PositionStatus::Open, PositionStatus::Closed)
        )
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(PositionStatus::Pending),
            "OPEN" => Ok(PositionStatus::Open),
            "CLOSED" => Ok(PositionStatus::Closed),
            "CANCELLED" | "CANCELED" => Ok(PositionStatus::Cancelled),
            _ => Err(ParseEnumError::new("position status", s)),
        }
    }
}

/// Why a position was closed.
///
/// The numbered take-profit codes of the older schema (`TP1_HIT` ..
/// `TP3_HIT`) are read as [`ExitReason::TpHit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    #[serde(alias = "TP1_HIT", alias = "TP2_HIT", alias = "TP3_HIT")]
    TpHit,
    SlHit,
    ManualExit,
    TimeExit,
    TrailingStop,
    RiskManagement,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TpHit => "TP_HIT",
            ExitReason::SlHit => "SL_HIT",
            ExitReason::ManualExit => "MANUAL_EXIT",
            ExitReason::TimeExit => "TIME_EXIT",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::RiskManagement => "RISK_MANAGEMENT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::TpHit => "Take Profit",
            ExitReason::SlHit => "Stop Loss",
            ExitReason::ManualExit => "Manual Exit",
            ExitReason::TimeExit => "Time Exit",
            ExitReason::TrailingStop => "Trailing Stop",
            ExitReason::RiskManagement => "Risk Management",
        }
    }
}

/// Label for an optional exit reason; open positions have none.
pub fn exit_reason_label(reason: Option<ExitReason>) -> &'static str {
    reason.map(|r| r.label()).unwrap_or("-")
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TP_HIT" | "TP1_HIT" | "TP2_HIT" | "TP3_HIT" | "TP" => Ok(ExitReason::TpHit),
            "SL_HIT" | "SL" => Ok(ExitReason::SlHit),
            "MANUAL_EXIT" | "MANUAL" => Ok(ExitReason::ManualExit),
            "TIME_EXIT" | "TIME" => Ok(ExitReason::TimeExit),
            "TRAILING_STOP" | "TRAILING" => Ok(ExitReason::TrailingStop),
            "RISK_MANAGEMENT" | "RISK" => Ok(ExitReason::RiskManagement),
            _ => Err(ParseEnumError::new("exit reason", s)),
        }
    }
}
