//! Input validators for credentials, prices and trade levels.
//!
//! Validators report; they never adjust the values they are given.

use thiserror::Error;

use crate::models::Direction;

/// First rule a set of trade levels breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("neutral signals have no tradable levels")]
    NeutralDirection,

    #[error("entry price must be a positive number")]
    InvalidEntry,

    #[error("exit price must be a positive number")]
    InvalidExit,

    #[error("quantity must be a positive number")]
    InvalidQuantity,

    #[error("stop loss is on the wrong side of entry")]
    StopLoss,

    #[error("take profit is on the wrong side of entry")]
    TakeProfit,

    #[error("signal is not actionable")]
    NotActionable,
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// 3 to 50 ASCII letters, digits or underscores.
pub fn is_valid_username(username: &str) -> bool {
    (3..=50).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct PasswordTraits {
    length: usize,
    lower: bool,
    upper: bool,
    digit: bool,
    special: bool,
}

impl PasswordTraits {
    fn of(password: &str) -> Self {
        Self {
            length: password.chars().count(),
            lower: password.chars().any(|c| c.is_ascii_lowercase()),
            upper: password.chars().any(|c| c.is_ascii_uppercase()),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn is_valid_password(password: &str) -> bool {
    let traits = PasswordTraits::of(password);
    traits.length >= 8 && traits.upper && traits.lower && traits.digit
}

/// Strength score from 0 to 100.
///
/// +25 for 8+ characters, +15 for 12+, and +15 each for lowercase,
/// uppercase, digit and non-alphanumeric characters.
pub fn password_strength(password: &str) -> u8 {
    let traits = PasswordTraits::of(password);
    let mut score: u8 = 0;

    if traits.length >= 8 {
        score += 25;
    }
    if traits.length >= 12 {
        score += 15;
    }
    for present in [traits.lower, traits.upper, traits.digit, traits.special] {
        if present {
            score += 15;
        }
    }

    score.min(100)
}

pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

pub fn is_valid_quantity(quantity: f64) -> bool {
    quantity.is_finite() && quantity > 0.0
}

/// Parse user input as a price, `None` unless it is a valid one.
pub fn parse_price(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|p| is_valid_price(*p))
}

pub fn parse_quantity(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|q| is_valid_quantity(*q))
}

/// LONG stops sit below entry, SHORT stops above.
pub fn is_valid_stop_loss(entry: f64, stop_loss: f64, direction: Direction) -> bool {
    if !is_valid_price(entry) || !is_valid_price(stop_loss) {
        return false;
    }
    match direction {
        Direction::Long => stop_loss < entry,
        Direction::Short => stop_loss > entry,
        Direction::Neutral => false,
    }
}

/// LONG targets sit above entry, SHORT targets below.
pub fn is_valid_take_profit(entry: f64, take_profit: f64, direction: Direction) -> bool {
    if !is_valid_price(entry) || !is_valid_price(take_profit) {
        return false;
    }
    match direction {
        Direction::Long => take_profit > entry,
        Direction::Short => take_profit < entry,
        Direction::Neutral => false,
    }
}

/// Check a full set of levels and report the first rule broken.
pub fn check_levels(
    entry: f64,
    stop_loss: f64,
    take_profit: f64,
    quantity: f64,
    direction: Direction,
) -> Result<(), LevelError> {
    if !direction.is_directional() {
        return Err(LevelError::NeutralDirection);
    }
    if !is_valid_price(entry) {
        return Err(LevelError::InvalidEntry);
    }
    if !is_valid_quantity(quantity) {
        return Err(LevelError::InvalidQuantity);
    }
    if !is_valid_stop_loss(entry, stop_loss, direction) {
        return Err(LevelError::StopLoss);
    }
    if !is_valid_take_profit(entry, take_profit, direction) {
        return Err(LevelError::TakeProfit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("trader@example.com"));
        assert!(is_valid_email("a.b@desk.co.uk"));
        assert!(!is_valid_email("trader@example"));
        assert!(!is_valid_email("trader@.com"));
        assert!(!is_valid_email("trader@example."));
        assert!(!is_valid_email("tr ader@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_username() {
        assert!(is_valid_username("desk_01"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has-dash"));
        assert!(!is_valid_username(&"x".repeat(51)));
        assert!(is_valid_username(&"x".repeat(50)));
    }

    #[test]
    fn test_password_rules() {
        assert!(!is_valid_password("abc12345"));
        assert!(is_valid_password("Abc12345"));
        assert!(!is_valid_password("Abc1234"));
        assert!(!is_valid_password("Abcdefgh"));
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc"), 15);
        // 25 + 15 + 15 + 15
        assert_eq!(password_strength("Abc12345"), 70);
        // every criterion: 25 + 15 + 4 * 15 = 100
        assert_eq!(password_strength("Abc12345!xyz"), 100);
    }

    #[test]
    fn test_price_and_quantity() {
        assert!(is_valid_price(0.0001));
        assert!(!is_valid_price(0.0));
        assert!(!is_valid_price(-1.0));
        assert!(!is_valid_price(f64::NAN));
        assert!(!is_valid_quantity(f64::INFINITY));

        assert_eq!(parse_price(" 101.5 "), Some(101.5));
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_quantity("-2"), None);
    }

    #[test]
    fn test_stop_loss_direction() {
        assert!(is_valid_stop_loss(100.0, 95.0, Direction::Long));
        assert!(!is_valid_stop_loss(100.0, 105.0, Direction::Long));
        assert!(is_valid_stop_loss(100.0, 105.0, Direction::Short));
        assert!(!is_valid_stop_loss(100.0, 95.0, Direction::Short));
        assert!(!is_valid_stop_loss(100.0, 95.0, Direction::Neutral));
        assert!(!is_valid_stop_loss(100.0, 100.0, Direction::Long));
    }

    #[test]
    fn test_take_profit_direction() {
        assert!(is_valid_take_profit(100.0, 110.0, Direction::Long));
        assert!(!is_valid_take_profit(100.0, 90.0, Direction::Long));
        assert!(is_valid_take_profit(100.0, 90.0, Direction::Short));
        assert!(!is_valid_take_profit(100.0, -5.0, Direction::Short));
    }

    #[test]
    fn test_check_levels_order() {
        assert_eq!(
            check_levels(100.0, 95.0, 110.0, 1.0, Direction::Neutral),
            Err(LevelError::NeutralDirection)
        );
        assert_eq!(
            check_levels(0.0, 95.0, 110.0, 0.0, Direction::Long),
            Err(LevelError::InvalidEntry)
        );
        assert_eq!(
            check_levels(100.0, 95.0, 110.0, 0.0, Direction::Long),
            Err(LevelError::InvalidQuantity)
        );
        assert_eq!(
            check_levels(100.0, 105.0, 90.0, 1.0, Direction::Long),
            Err(LevelError::StopLoss)
        );
        assert_eq!(
            check_levels(100.0, 105.0, 101.0, 1.0, Direction::Short),
            Err(LevelError::TakeProfit)
        );
        assert_eq!(check_levels(100.0, 105.0, 90.0, 1.0, Direction::Short), Ok(()));
    }
}
