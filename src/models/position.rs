//! Position model: a tracked trade from planned entry to close.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::timestamp;
use super::{Direction, ExitReason, PositionStatus, Signal, TradeLevels};
use crate::trading::{self, TradingError};
use crate::validate::{self, LevelError};

/// Position as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Position {
    pub id: u64,
    pub signal_id: Option<u64>,
    pub symbol_code: String,
    pub status: PositionStatus,
    pub direction: Direction,

    /// Entry price the position was planned at
    pub planned_entry_price: Decimal,

    /// Fill price, set once the position is executed
    pub actual_entry_price: Option<Decimal>,

    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub exit_price: Option<Decimal>,

    pub quantity: Decimal,

    #[serde(rename = "realizedPnL")]
    pub realized_pnl: Option<Decimal>,
    #[serde(rename = "realizedPnLPercent")]
    pub realized_pnl_percent: Option<Decimal>,
    pub actual_risk_reward: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,

    #[serde(default, with = "timestamp::option")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub fees: Decimal,
    pub slippage: Option<Decimal>,
    pub duration_ms: Option<i64>,
    pub notes: Option<String>,
}

impl Position {
    /// Fill price when executed, planned price otherwise.
    pub fn entry_price(&self) -> Decimal {
        self.actual_entry_price.unwrap_or(self.planned_entry_price)
    }

    pub fn levels(&self) -> TradeLevels {
        TradeLevels {
            entry: self.entry_price(),
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        }
    }

    pub fn can_execute(&self) -> bool {
        self.status.can_transition_to(PositionStatus::Open)
    }

    pub fn can_close(&self) -> bool {
        self.status.can_transition_to(PositionStatus::Closed)
    }

    pub fn can_cancel(&self) -> bool {
        self.status.can_transition_to(PositionStatus::Cancelled)
    }

    /// Mark-to-market P&L of an open position.
    pub fn unrealized_pnl(&self, mark_price: Decimal) -> Option<Decimal> {
        if self.status != PositionStatus::Open {
            return None;
        }
        Some(trading::pnl(
            self.entry_price(),
            mark_price,
            self.quantity,
            self.direction,
        ))
    }

    /// Mark-to-market P&L of an open position as a percentage of entry.
    pub fn unrealized_pnl_percent(&self, mark_price: Decimal) -> Option<Decimal> {
        if self.status != PositionStatus::Open {
            return None;
        }
        trading::pnl_percent(self.entry_price(), mark_price, self.direction).ok()
    }

    /// Realized P&L from the backend, or the gross P&L of the exit price.
    pub fn realized_pnl_or_computed(&self) -> Option<Decimal> {
        if self.realized_pnl.is_some() {
            return self.realized_pnl;
        }
        if self.status != PositionStatus::Closed {
            return None;
        }
        let exit = self.exit_price?;
        Some(trading::pnl(
            self.entry_price(),
            exit,
            self.quantity,
            self.direction,
        ))
    }

    /// Risk/reward of the levels the position was opened with.
    pub fn planned_risk_reward(&self) -> Result<Decimal, TradingError> {
        trading::risk_reward(self.planned_entry_price, self.stop_loss, self.take_profit)
    }

    /// Time held, from the backend duration or the open/close timestamps.
    pub fn duration(&self) -> Option<Duration> {
        if let Some(ms) = self.duration_ms {
            return Some(Duration::milliseconds(ms));
        }
        match (self.opened_at, self.closed_at) {
            (Some(opened), Some(closed)) => Some(closed - opened),
            _ => None,
        }
    }
}

/// Older position payload with numbered take-profit targets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacyPosition {
    pub id: u64,
    pub signal_id: Option<u64>,
    pub symbol_code: String,
    pub status: PositionStatus,
    pub direction: Direction,
    pub planned_entry_price: Decimal,
    pub actual_entry_price: Option<Decimal>,
    pub stop_loss: Decimal,
    pub take_profit1: Decimal,
    pub take_profit2: Option<Decimal>,
    pub take_profit3: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: Option<Decimal>,
    #[serde(rename = "realizedPnLPercent")]
    pub realized_pnl_percent: Option<Decimal>,
    pub actual_risk_reward: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    #[serde(default, with = "timestamp::option")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    #[serde(default)]
    pub fees: Decimal,
    pub notes: Option<String>,
}

impl From<LegacyPosition> for Position {
    fn from(legacy: LegacyPosition) -> Self {
        Self {
            id: legacy.id,
            signal_id: legacy.signal_id,
            symbol_code: legacy.symbol_code,
            status: legacy.status,
            direction: legacy.direction,
            planned_entry_price: legacy.planned_entry_price,
            actual_entry_price: legacy.actual_entry_price,
            stop_loss: legacy.stop_loss,
            take_profit: legacy.take_profit1,
            exit_price: legacy.exit_price,
            quantity: legacy.quantity,
            realized_pnl: legacy.realized_pnl,
            realized_pnl_percent: legacy.realized_pnl_percent,
            actual_risk_reward: legacy.actual_risk_reward,
            exit_reason: legacy.exit_reason,
            opened_at: legacy.opened_at,
            closed_at: legacy.closed_at,
            created_at: legacy.created_at,
            created_by: legacy.created_by,
            last_modified_by: None,
            updated_at: None,
            fees: legacy.fees,
            slippage: None,
            duration_ms: None,
            notes: legacy.notes,
        }
    }
}

/// Position as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PositionDto {
    Current(Position),
    Legacy(LegacyPosition),
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        match dto {
            PositionDto::Current(position) => position,
            PositionDto::Legacy(legacy) => legacy.into(),
        }
    }
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Body for opening a position, manually or from a signal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<u64>,
    pub symbol_code: String,
    pub direction: Direction,
    #[serde(with = "rust_decimal::serde::float")]
    pub planned_entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_loss: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub take_profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OpenPositionRequest {
    /// Build a request after checking the levels are consistent with the direction.
    pub fn new(
        symbol_code: impl Into<String>,
        direction: Direction,
        levels: TradeLevels,
        quantity: Decimal,
    ) -> Result<Self, LevelError> {
        validate::check_levels(
            as_f64(levels.entry),
            as_f64(levels.stop_loss),
            as_f64(levels.take_profit),
            as_f64(quantity),
            direction,
        )?;

        Ok(Self {
            signal_id: None,
            symbol_code: symbol_code.into().trim().to_uppercase(),
            direction,
            planned_entry_price: levels.entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            quantity,
            notes: None,
        })
    }

    /// Request that follows a signal's levels.
    pub fn from_signal(signal: &Signal, quantity: Decimal) -> Result<Self, LevelError> {
        let levels = match signal.levels() {
            Some(levels) if signal.is_actionable() => levels,
            _ => return Err(LevelError::NotActionable),
        };

        let mut request = Self::new(signal.symbol_code.clone(), signal.direction, levels, quantity)?;
        request.signal_id = Some(signal.id);
        Ok(request)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Body for filling a pending position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePositionRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_entry_price: Decimal,
}

impl ExecutePositionRequest {
    pub fn new(actual_entry_price: Decimal) -> Result<Self, LevelError> {
        if !validate::is_valid_price(as_f64(actual_entry_price)) {
            return Err(LevelError::InvalidEntry);
        }
        Ok(Self { actual_entry_price })
    }
}

/// Body for closing an open position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub exit_price: Decimal,
    pub exit_reason: ExitReason,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ClosePositionRequest {
    pub fn new(exit_price: Decimal, exit_reason: ExitReason) -> Result<Self, LevelError> {
        if !validate::is_valid_price(as_f64(exit_price)) {
            return Err(LevelError::InvalidExit);
        }
        Ok(Self {
            exit_price,
            exit_reason,
            fees: None,
            notes: None,
        })
    }

    pub fn with_fees(mut self, fees: Decimal) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalDto;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn open_long() -> Position {
        let payload = json!({
            "id": 1,
            "signalId": 42,
            "symbolCode": "BTCUSDT",
            "status": "OPEN",
            "direction": "LONG",
            "plannedEntryPrice": 100.0,
            "actualEntryPrice": 101.0,
            "stopLoss": 95.0,
            "takeProfit": 110.0,
            "exitPrice": null,
            "quantity": 2.0,
            "realizedPnL": null,
            "realizedPnLPercent": null,
            "actualRiskReward": null,
            "exitReason": null,
            "openedAt": "2024-05-01T08:05:00",
            "closedAt": null,
            "createdAt": "2024-05-01T08:00:00",
            "createdBy": "system",
            "fees": 0.0,
            "slippage": null,
            "durationMs": null,
            "notes": null
        });
        serde_json::from_value::<PositionDto>(payload).unwrap().into()
    }

    #[test]
    fn test_open_position_derived_values() {
        let pos = open_long();

        assert_eq!(pos.entry_price(), dec!(101));
        assert!(pos.can_close());
        assert!(!pos.can_execute());
        assert_eq!(pos.unrealized_pnl(dec!(106)), Some(dec!(10)));
        assert_eq!(pos.unrealized_pnl_percent(dec!(111.1)), Some(dec!(10)));
        assert_eq!(pos.realized_pnl_or_computed(), None);
        assert_eq!(pos.planned_risk_reward().unwrap(), dec!(2));
    }

    #[test]
    fn test_closed_position_computes_pnl() {
        let mut pos = open_long();
        pos.status = PositionStatus::Closed;
        pos.exit_price = Some(dec!(96));
        pos.exit_reason = Some(ExitReason::SlHit);

        assert_eq!(pos.unrealized_pnl(dec!(120)), None);
        assert_eq!(pos.realized_pnl_or_computed(), Some(dec!(-10)));

        pos.realized_pnl = Some(dec!(-10.4));
        assert_eq!(pos.realized_pnl_or_computed(), Some(dec!(-10.4)));
    }

    #[test]
    fn test_legacy_position_migrates() {
        let payload = json!({
            "id": 3,
            "signalId": null,
            "symbolCode": "ETHUSDT",
            "status": "CLOSED",
            "direction": "SHORT",
            "plannedEntryPrice": 100.0,
            "actualEntryPrice": 100.0,
            "stopLoss": 105.0,
            "takeProfit1": 90.0,
            "takeProfit2": 85.0,
            "takeProfit3": null,
            "exitPrice": 90.0,
            "quantity": 1.0,
            "realizedPnL": 10.0,
            "realizedPnLPercent": 10.0,
            "actualRiskReward": 2.0,
            "exitReason": "TP1_HIT",
            "createdAt": "2024-05-01T08:00:00Z",
            "fees": 0.1,
            "notes": null
        });

        let pos: Position = serde_json::from_value::<PositionDto>(payload).unwrap().into();
        assert_eq!(pos.take_profit, dec!(90));
        assert_eq!(pos.exit_reason, Some(ExitReason::TpHit));
        assert!(pos.status.is_terminal());
    }

    #[test]
    fn test_open_request_enforces_direction() {
        let levels = TradeLevels {
            entry: dec!(100),
            stop_loss: dec!(105),
            take_profit: dec!(110),
        };

        let err = OpenPositionRequest::new("BTCUSDT", Direction::Long, levels, dec!(1)).unwrap_err();
        assert_eq!(err, LevelError::StopLoss);

        let request = OpenPositionRequest::new(
            "btcusdt",
            Direction::Long,
            TradeLevels { stop_loss: dec!(95), ..levels },
            dec!(0.5),
        )
        .unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["symbolCode"], "BTCUSDT");
        assert_eq!(body["plannedEntryPrice"], 100.0);
        assert_eq!(body["quantity"], 0.5);
        assert!(body.get("signalId").is_none());
    }

    #[test]
    fn test_open_request_from_signal_needs_actionable() {
        let mut payload = json!({
            "id": 9,
            "createdAt": "2024-05-01T08:00:00",
            "symbolCode": "BTCUSDT",
            "timeframe": "M5",
            "mode": "SCALPING",
            "direction": "LONG",
            "entryPrice": 100.0,
            "stopLoss": 95.0,
            "takeProfit": 110.0,
            "riskReward": 2.0,
            "reasoning": null,
            "actionable": false,
            "potentialProfit": null,
            "riskAmount": null
        });

        let signal: Signal = serde_json::from_value::<SignalDto>(payload.clone()).unwrap().into();
        assert_eq!(
            OpenPositionRequest::from_signal(&signal, dec!(1)).unwrap_err(),
            LevelError::NotActionable
        );

        payload["actionable"] = json!(true);
        let signal: Signal = serde_json::from_value::<SignalDto>(payload).unwrap().into();
        let request = OpenPositionRequest::from_signal(&signal, dec!(1)).unwrap();
        assert_eq!(request.signal_id, Some(9));
        assert_eq!(request.take_profit, dec!(110));
    }

    #[test]
    fn test_close_and_execute_requests() {
        assert_eq!(
            ExecutePositionRequest::new(dec!(0)).unwrap_err(),
            LevelError::InvalidEntry
        );

        let close = ClosePositionRequest::new(dec!(108.5), ExitReason::ManualExit)
            .unwrap()
            .with_fees(dec!(0.2));
        let body = serde_json::to_value(&close).unwrap();
        assert_eq!(body["exitReason"], "MANUAL_EXIT");
        assert_eq!(body["fees"], 0.2);
        assert!(body.get("notes").is_none());
    }
}
