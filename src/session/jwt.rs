//! Expiry inspection of bearer tokens. Signatures are not verified here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token does not have three segments")]
    Malformed,

    #[error("payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("payload is not a JSON claims object: {0}")]
    Claims(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry claim of `token`; `Ok(None)` when the token carries none.
pub fn expires_at(token: &str) -> Result<Option<DateTime<Utc>>, JwtError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(JwtError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;

    Ok(claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single()))
}

/// A token that cannot be decoded counts as expired; one without `exp` does not.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match expires_at(token) {
        Ok(Some(exp)) => exp <= now,
        Ok(None) => false,
        Err(_) => true,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_claim() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let live = encode_test_token(&json!({"sub": "desk", "exp": now.timestamp() + 60}));
        let dead = encode_test_token(&json!({"sub": "desk", "exp": now.timestamp() - 1}));

        assert_eq!(expires_at(&live).unwrap().unwrap().timestamp(), now.timestamp() + 60);
        assert!(!is_expired(&live, now));
        assert!(is_expired(&dead, now));
    }

    #[test]
    fn test_missing_exp_is_not_expired() {
        let token = encode_test_token(&json!({"sub": "desk"}));
        assert!(!is_expired(&token, Utc::now()));
    }

    #[test]
    fn test_garbage_is_expired() {
        assert!(matches!(expires_at("not-a-token"), Err(JwtError::Malformed)));
        assert!(is_expired("a.%%%.c", Utc::now()));
        assert!(is_expired("a.bm90IGpzb24.c", Utc::now()));
    }
}
