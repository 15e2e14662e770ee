//! Risk/reward, position sizing and P&L arithmetic.

use rust_decimal::Decimal;

use super::TradingError;
use crate::models::Direction;

/// Distance from entry to stop; zero risk is rejected rather than divided by.
fn risk_distance(entry: Decimal, stop_loss: Decimal) -> Result<Decimal, TradingError> {
    let risk = (entry - stop_loss).abs();
    if risk.is_zero() {
        return Err(TradingError::ZeroRisk);
    }
    Ok(risk)
}

/// Risk/reward ratio: `|take_profit - entry| / |entry - stop_loss|`.
pub fn risk_reward(
    entry: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
) -> Result<Decimal, TradingError> {
    let risk = risk_distance(entry, stop_loss)?;
    let reward = (take_profit - entry).abs();
    Ok(reward / risk)
}

/// Units to buy so that hitting the stop loses `risk_percent` of the balance.
///
/// size = (balance * risk_percent / 100) / |entry - stop_loss|
pub fn position_size(
    balance: Decimal,
    risk_percent: Decimal,
    entry: Decimal,
    stop_loss: Decimal,
) -> Result<Decimal, TradingError> {
    let risk_per_unit = risk_distance(entry, stop_loss)?;
    let risk_amount = balance * (risk_percent / Decimal::ONE_HUNDRED);
    Ok(risk_amount / risk_per_unit)
}

/// P&L amount of a trade closed at `exit`.
pub fn pnl(entry: Decimal, exit: Decimal, quantity: Decimal, direction: Direction) -> Decimal {
    match direction {
        Direction::Long => (exit - entry) * quantity,
        Direction::Short => (entry - exit) * quantity,
        Direction::Neutral => Decimal::ZERO,
    }
}

/// P&L as a percentage of the entry price.
pub fn pnl_percent(
    entry: Decimal,
    exit: Decimal,
    direction: Direction,
) -> Result<Decimal, TradingError> {
    if entry.is_zero() {
        return Err(TradingError::ZeroEntry);
    }
    let move_pct = match direction {
        Direction::Long => (exit - entry) / entry,
        Direction::Short => (entry - exit) / entry,
        Direction::Neutral => return Ok(Decimal::ZERO),
    };
    Ok(move_pct * Decimal::ONE_HUNDRED)
}

/// A P&L counts as profitable only when present and above zero.
pub fn is_profitable(pnl: Option<Decimal>) -> bool {
    pnl.is_some_and(|p| p > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_risk_reward() {
        assert_eq!(risk_reward(dec!(100), dec!(95), dec!(110)).unwrap(), dec!(2));
        // Short side: same distances
        assert_eq!(risk_reward(dec!(100), dec!(105), dec!(90)).unwrap(), dec!(2));
        assert_eq!(
            risk_reward(dec!(100), dec!(100), dec!(110)),
            Err(TradingError::ZeroRisk)
        );
    }

    #[test]
    fn test_position_size() {
        // Risk 1% of 10k = 100; 5 per unit => 20 units
        let size = position_size(dec!(10000), dec!(1), dec!(100), dec!(95)).unwrap();
        assert_eq!(size, dec!(20));

        assert_eq!(
            position_size(dec!(10000), dec!(1), dec!(100), dec!(100)),
            Err(TradingError::ZeroRisk)
        );
    }

    #[test]
    fn test_pnl_by_direction() {
        assert_eq!(pnl(dec!(100), dec!(110), dec!(2), Direction::Long), dec!(20));
        assert_eq!(pnl(dec!(100), dec!(90), dec!(2), Direction::Long), dec!(-20));
        assert_eq!(pnl(dec!(100), dec!(90), dec!(1), Direction::Short), dec!(10));
        assert_eq!(pnl(dec!(100), dec!(90), dec!(1), Direction::Neutral), Decimal::ZERO);
    }

    #[test]
    fn test_pnl_percent() {
        assert_eq!(
            pnl_percent(dec!(200), dec!(210), Direction::Long).unwrap(),
            dec!(5)
        );
        assert_eq!(
            pnl_percent(dec!(200), dec!(210), Direction::Short).unwrap(),
            dec!(-5)
        );
        assert_eq!(
            pnl_percent(dec!(200), dec!(210), Direction::Neutral).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            pnl_percent(Decimal::ZERO, dec!(1), Direction::Long),
            Err(TradingError::ZeroEntry)
        );
    }

    #[test]
    fn test_is_profitable() {
        assert!(is_profitable(Some(dec!(0.01))));
        assert!(!is_profitable(Some(Decimal::ZERO)));
        assert!(!is_profitable(None));
    }
}
