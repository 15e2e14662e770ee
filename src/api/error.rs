//! Typed API error with a fixed kind taxonomy.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::ErrorDetail;

pub const CODE_VALIDATION: &str = "VALIDATION_ERROR";
pub const CODE_UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const CODE_FORBIDDEN: &str = "FORBIDDEN";
pub const CODE_ACCESS_DENIED: &str = "ACCESS_DENIED";
pub const CODE_SYMBOL_NOT_FOUND: &str = "SYMBOL_NOT_FOUND";
pub const CODE_INVALID_SIGNAL: &str = "INVALID_SIGNAL";
pub const CODE_MARKET_DATA: &str = "MARKET_DATA_ERROR";
pub const CODE_AI_SERVICE: &str = "AI_SERVICE_ERROR";

const FALLBACK_MESSAGE: &str = "An error occurred. Please try again.";

/// What went wrong, derived from the status and the backend code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The request never got a response (status 0)
    Transport,
    /// 401: credentials were cleared
    SessionExpired,
    Unauthorized,
    AccessDenied,
    Validation,
    SymbolNotFound,
    InvalidSignal,
    MarketData,
    AiService,
    /// Any other 5xx
    Server,
    /// Any other 4xx
    Client,
    /// Body was not a valid envelope for the expected type
    InvalidResponse,
    Other,
}

impl ErrorKind {
    /// Backend code first, status second.
    pub fn classify(status: u16, code: Option<&str>) -> Self {
        match code {
            Some(CODE_VALIDATION) => return ErrorKind::Validation,
            Some(CODE_UNAUTHORIZED) => return ErrorKind::Unauthorized,
            Some(CODE_FORBIDDEN) | Some(CODE_ACCESS_DENIED) => return ErrorKind::AccessDenied,
            Some(CODE_SYMBOL_NOT_FOUND) => return ErrorKind::SymbolNotFound,
            Some(CODE_INVALID_SIGNAL) => return ErrorKind::InvalidSignal,
            Some(CODE_MARKET_DATA) => return ErrorKind::MarketData,
            Some(CODE_AI_SERVICE) => return ErrorKind::AiService,
            _ => {}
        }

        match status {
            0 => ErrorKind::Transport,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::AccessDenied,
            500..=599 => ErrorKind::Server,
            400..=499 => ErrorKind::Client,
            _ => ErrorKind::Other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Failure of a backend or market-data call.
#[derive(Debug, Clone, Error)]
#[error("{message} (status {status}, {kind})")]
pub struct ApiError {
    /// HTTP status; 0 when no response arrived
    pub status: u16,
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
    pub details: Option<Map<String, Value>>,
}

impl ApiError {
    /// Error classified from its status alone.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: ErrorKind::classify(status, None),
            code: None,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a backend code and reclassify.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.kind = ErrorKind::classify(self.status, Some(&code));
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: Option<Map<String, Value>>) -> Self {
        self.details = details;
        self
    }

    pub fn transport(err: impl fmt::Display) -> Self {
        Self::new(0, err.to_string())
    }

    pub fn session_expired() -> Self {
        Self {
            kind: ErrorKind::SessionExpired,
            ..Self::new(401, "Session expired. Please login again.").with_code(CODE_UNAUTHORIZED)
        }
    }

    /// 403 with the backend's message and code, or fixed fallbacks.
    pub fn access_denied(detail: Option<ErrorDetail>) -> Self {
        let (message, code, details) = match detail {
            Some(detail) => (
                non_empty(detail.message).unwrap_or_else(|| "Access denied.".to_string()),
                non_empty(detail.code).unwrap_or_else(|| CODE_ACCESS_DENIED.to_string()),
                detail.details,
            ),
            None => ("Access denied.".to_string(), CODE_ACCESS_DENIED.to_string(), None),
        };
        Self::new(403, message).with_code(code).with_details(details)
    }

    /// Error described by a failed envelope.
    pub fn from_detail(status: u16, detail: Option<ErrorDetail>) -> Self {
        let fallback = || format!("Request failed with status {}", status);
        match detail {
            Some(detail) => {
                let err = Self::new(status, non_empty(detail.message).unwrap_or_else(fallback))
                    .with_details(detail.details);
                match non_empty(detail.code) {
                    Some(code) => err.with_code(code),
                    None => err,
                }
            }
            None => Self::new(status, fallback()),
        }
    }

    pub fn invalid_response(status: u16, err: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::InvalidResponse,
            ..Self::new(status, format!("Unexpected response from server: {}", err))
        }
    }

    /// Client-side input rejection, with per-field messages.
    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        let message = fields
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("; ");
        let details = fields
            .into_iter()
            .map(|(field, msg)| (field, Value::String(msg)))
            .collect();
        Self::new(0, message)
            .with_code(CODE_VALIDATION)
            .with_details(Some(details))
    }

    pub fn market_data(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, message).with_code(CODE_MARKET_DATA)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message fit to show the user.
    pub fn user_message(&self) -> String {
        let fixed = match self.kind {
            ErrorKind::Validation => Some("Please check your input and try again."),
            ErrorKind::SessionExpired | ErrorKind::Unauthorized => {
                Some("Session expired. Please login again.")
            }
            ErrorKind::AccessDenied => Some("You don't have permission to perform this action."),
            ErrorKind::SymbolNotFound => Some("Symbol not found. Please check the symbol code."),
            ErrorKind::InvalidSignal => Some("Invalid signal detected. Try different parameters."),
            ErrorKind::MarketData => Some("Cannot fetch market data. Try again later."),
            ErrorKind::AiService => Some("AI service unavailable. Please try again."),
            _ if self.status >= 500 => Some("Server error. Please try again later."),
            _ => None,
        };

        match fixed {
            Some(message) => message.to_string(),
            None if self.message.is_empty() => FALLBACK_MESSAGE.to_string(),
            None => self.message.clone(),
        }
    }

    /// Only server failures and upstream data/AI outages are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.status >= 500 || matches!(self.kind, ErrorKind::MarketData | ErrorKind::AiService)
    }

    /// Field to message pairs reported for a validation failure.
    ///
    /// Reads a nested `fieldErrors` object when present, otherwise every
    /// string-valued entry of the details.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let Some(details) = &self.details else {
            return BTreeMap::new();
        };

        let source = match details.get("fieldErrors") {
            Some(Value::Object(nested)) => nested,
            _ => details,
        };

        source
            .iter()
            .filter_map(|(field, value)| value.as_str().map(|msg| (field.clone(), msg.to_string())))
            .collect()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail(code: &str, message: &str) -> Option<ErrorDetail> {
        Some(ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        })
    }

    #[test]
    fn test_symbol_not_found_is_specific_and_final() {
        let err = ApiError::from_detail(404, detail("SYMBOL_NOT_FOUND", "No symbol XYZ"));

        assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
        assert_eq!(err.user_message(), "Symbol not found. Please check the symbol code.");
        assert_ne!(err.user_message(), FALLBACK_MESSAGE);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retry_classification() {
        assert!(ApiError::new(503, "unavailable").is_retryable());
        assert!(ApiError::from_detail(200, detail("MARKET_DATA_ERROR", "feed down")).is_retryable());
        assert!(ApiError::from_detail(400, detail("AI_SERVICE_ERROR", "model busy")).is_retryable());
        assert!(!ApiError::new(0, "connection refused").is_retryable());
        assert!(!ApiError::new(404, "missing").is_retryable());
        assert!(!ApiError::session_expired().is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = ApiError::from_detail(400, detail("VALIDATION_ERROR", "bad"));
        assert_eq!(err.user_message(), "Please check your input and try again.");

        let err = ApiError::new(502, "bad gateway");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.user_message(), "Server error. Please try again later.");

        let err = ApiError::new(409, "Position already closed");
        assert_eq!(err.kind(), ErrorKind::Client);
        assert_eq!(err.user_message(), "Position already closed");

        assert_eq!(ApiError::new(418, "").user_message(), FALLBACK_MESSAGE);
        assert_eq!(
            ApiError::session_expired().user_message(),
            "Session expired. Please login again."
        );
    }

    #[test]
    fn test_from_detail_fallbacks() {
        let err = ApiError::from_detail(500, None);
        assert_eq!(err.message, "Request failed with status 500");
        assert_eq!(err.code, None);

        let err = ApiError::from_detail(422, detail("", ""));
        assert_eq!(err.message, "Request failed with status 422");
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[test]
    fn test_access_denied_defaults() {
        let err = ApiError::access_denied(None);
        assert_eq!(err.status, 403);
        assert_eq!(err.code.as_deref(), Some("ACCESS_DENIED"));
        assert_eq!(err.message, "Access denied.");

        let err = ApiError::access_denied(detail("FORBIDDEN", "Admins only"));
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(err.message, "Admins only");
        assert_eq!(err.code.as_deref(), Some("FORBIDDEN"));
    }

    #[test]
    fn test_field_errors() {
        let nested = json!({"fieldErrors": {"email": "must be valid", "size": 3}});
        let err = ApiError::new(400, "invalid")
            .with_code("VALIDATION_ERROR")
            .with_details(nested.as_object().cloned());
        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["email"], "must be valid");

        let mut input = BTreeMap::new();
        input.insert("username".to_string(), "too short".to_string());
        let err = ApiError::validation(input);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors()["username"], "too short");

        assert!(ApiError::new(500, "boom").field_errors().is_empty());
    }
}
