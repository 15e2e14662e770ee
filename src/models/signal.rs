//! AI trade signal model and the signal generation request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::timestamp;
use super::{Direction, Timeframe, TradingMode};
use crate::trading;

/// Entry, stop-loss and take-profit of a directional trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

impl TradeLevels {
    /// Reward distance over risk distance.
    pub fn risk_reward(&self) -> Result<Decimal, trading::TradingError> {
        trading::risk_reward(self.entry, self.stop_loss, self.take_profit)
    }
}

/// Trade recommendation produced by the backend.
///
/// Price levels are `None` when the generator has no actionable level,
/// which is the usual case for NEUTRAL signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signal {
    pub id: u64,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    pub symbol_code: String,
    pub timeframe: Timeframe,
    pub mode: TradingMode,
    pub direction: Direction,

    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub risk_reward: Option<Decimal>,

    pub reasoning: Option<String>,

    /// Backend verdict on whether the levels can be traded
    #[serde(default)]
    pub actionable: bool,
    pub potential_profit: Option<Decimal>,
    pub risk_amount: Option<Decimal>,

    pub created_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
    pub version: Option<i64>,
}

impl Signal {
    /// All three price levels, if the signal carries them.
    pub fn levels(&self) -> Option<TradeLevels> {
        Some(TradeLevels {
            entry: self.entry_price?,
            stop_loss: self.stop_loss?,
            take_profit: self.take_profit?,
        })
    }

    /// Directional signal with a complete set of levels.
    pub fn is_actionable(&self) -> bool {
        self.actionable && self.direction.is_directional() && self.levels().is_some()
    }

    /// Backend risk/reward, falling back to the ratio of the levels.
    pub fn effective_risk_reward(&self) -> Option<Decimal> {
        self.risk_reward
            .or_else(|| self.levels().and_then(|l| l.risk_reward().ok()))
    }
}

/// Older signal payload with three take-profit targets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacySignal {
    pub id: u64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub symbol_code: String,
    pub timeframe: Timeframe,
    pub mode: TradingMode,
    pub direction: Direction,
    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit1: Option<Decimal>,
    pub take_profit2: Option<Decimal>,
    pub take_profit3: Option<Decimal>,
    pub risk_reward1: Option<Decimal>,
    pub risk_reward2: Option<Decimal>,
    pub risk_reward3: Option<Decimal>,
    pub reasoning: Option<String>,
    pub created_by: Option<String>,
    pub version: Option<i64>,
}

impl From<LegacySignal> for Signal {
    fn from(legacy: LegacySignal) -> Self {
        if legacy.take_profit2.is_some() || legacy.take_profit3.is_some() {
            debug!(id = legacy.id, "Dropping secondary take-profit targets of legacy signal");
        }

        let actionable = legacy.direction.is_directional()
            && legacy.entry_price.is_some()
            && legacy.stop_loss.is_some()
            && legacy.take_profit1.is_some();

        Self {
            id: legacy.id,
            created_at: legacy.created_at,
            symbol_code: legacy.symbol_code,
            timeframe: legacy.timeframe,
            mode: legacy.mode,
            direction: legacy.direction,
            entry_price: legacy.entry_price,
            stop_loss: legacy.stop_loss,
            take_profit: legacy.take_profit1,
            risk_reward: legacy.risk_reward1,
            reasoning: legacy.reasoning,
            actionable,
            potential_profit: None,
            risk_amount: None,
            created_by: legacy.created_by,
            last_modified_at: None,
            last_modified_by: None,
            version: legacy.version,
        }
    }
}

/// Signal as it arrives on the wire: the current schema or the legacy one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignalDto {
    Current(Signal),
    Legacy(LegacySignal),
}

impl From<SignalDto> for Signal {
    fn from(dto: SignalDto) -> Self {
        match dto {
            SignalDto::Current(signal) => signal,
            SignalDto::Legacy(legacy) => legacy.into(),
        }
    }
}

/// Body of a signal generation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRequest {
    pub symbol_code: String,
    pub timeframe: Timeframe,
    pub mode: TradingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle_count: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub max_risk_per_trade: Option<Decimal>,
}

impl SignalRequest {
    /// Request with the mode's default candle count.
    pub fn new(symbol_code: impl Into<String>, timeframe: Timeframe, mode: TradingMode) -> Self {
        Self {
            symbol_code: symbol_code.into().trim().to_uppercase(),
            timeframe,
            mode,
            candle_count: Some(mode.default_candle_count()),
            max_risk_per_trade: None,
        }
    }

    pub fn with_candle_count(mut self, count: u32) -> Self {
        self.candle_count = Some(count);
        self
    }

    pub fn with_max_risk(mut self, max_risk_per_trade: Decimal) -> Self {
        self.max_risk_per_trade = Some(max_risk_per_trade);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn current_payload() -> serde_json::Value {
        json!({
            "id": 42,
            "createdAt": "2024-05-01T08:00:00",
            "symbolCode": "BTCUSDT",
            "timeframe": "M5",
            "mode": "SCALPING",
            "direction": "LONG",
            "entryPrice": 100.0,
            "stopLoss": 95.0,
            "takeProfit": 110.0,
            "riskReward": 2.0,
            "reasoning": "Breakout above range",
            "actionable": true,
            "potentialProfit": 10.0,
            "riskAmount": 5.0
        })
    }

    #[test]
    fn test_current_schema() {
        let dto: SignalDto = serde_json::from_value(current_payload()).unwrap();
        assert!(matches!(dto, SignalDto::Current(_)));

        let signal: Signal = dto.into();
        assert_eq!(signal.take_profit, Some(dec!(110)));
        assert!(signal.is_actionable());
        assert_eq!(signal.effective_risk_reward(), Some(dec!(2)));
    }

    #[test]
    fn test_legacy_schema_migrates() {
        let payload = json!({
            "id": 7,
            "createdAt": "2024-05-01T08:00:00Z",
            "symbolCode": "ETHUSDT",
            "timeframe": "H1",
            "mode": "SWING",
            "direction": "SHORT",
            "entryPrice": 100.0,
            "stopLoss": 104.0,
            "takeProfit1": 92.0,
            "takeProfit2": 88.0,
            "takeProfit3": 80.0,
            "riskReward1": 2.0,
            "riskReward2": 3.0,
            "riskReward3": 5.0,
            "reasoning": null
        });

        let dto: SignalDto = serde_json::from_value(payload).unwrap();
        assert!(matches!(dto, SignalDto::Legacy(_)));

        let signal: Signal = dto.into();
        assert_eq!(signal.take_profit, Some(dec!(92)));
        assert_eq!(signal.risk_reward, Some(dec!(2)));
        assert!(signal.is_actionable());
    }

    #[test]
    fn test_neutral_signal_has_no_levels() {
        let mut payload = current_payload();
        payload["direction"] = json!("NEUTRAL");
        payload["entryPrice"] = json!(null);
        payload["stopLoss"] = json!(null);
        payload["takeProfit"] = json!(null);
        payload["riskReward"] = json!(null);
        payload["actionable"] = json!(false);

        let signal: Signal = serde_json::from_value::<SignalDto>(payload).unwrap().into();
        assert!(signal.levels().is_none());
        assert!(!signal.is_actionable());
        assert_eq!(signal.effective_risk_reward(), None);
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let mut payload = current_payload();
        payload["confidence"] = json!(0.9);
        assert!(serde_json::from_value::<SignalDto>(payload).is_err());
    }

    #[test]
    fn test_signal_request_defaults() {
        let request = SignalRequest::new(" btcusdt ", Timeframe::M15, TradingMode::Swing)
            .with_max_risk(dec!(1.5));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["symbolCode"], "BTCUSDT");
        assert_eq!(body["timeframe"], "M15");
        assert_eq!(body["candleCount"], 200);
        assert_eq!(body["maxRiskPerTrade"], 1.5);
    }
}
