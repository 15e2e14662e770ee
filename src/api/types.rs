//! Wire types shared by the backend endpoints: envelope, page and query params.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{PositionStatus, Timeframe};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_USER_ID: &str = "system";

/// Envelope around every backend response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorDetail>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error block of a failed envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
}

/// One page of a paginated collection.
///
/// Paging metadata the backend framework adds (`pageable`, `sort`,
/// `numberOfElements`, `empty`) is accepted; anything else is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    /// Zero-based page index
    pub number: u32,
    pub first: bool,
    pub last: bool,

    #[serde(default, skip_serializing)]
    pub number_of_elements: Option<u32>,
    #[serde(default, skip_serializing)]
    pub empty: Option<bool>,
    #[serde(default, skip_serializing)]
    pub pageable: Option<Value>,
    #[serde(default, skip_serializing)]
    pub sort: Option<Value>,
}

impl<T> Page<T> {
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        !self.last
    }

    /// Index of the following page, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
            first: self.first,
            last: self.last,
            number_of_elements: self.number_of_elements,
            empty: self.empty,
            pageable: self.pageable,
            sort: self.sort,
        }
    }
}

/// Filters for the signal history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalQuery {
    pub symbol_code: String,
    pub timeframe: Timeframe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub size: u32,
}

impl SignalQuery {
    pub fn new(symbol_code: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol_code: symbol_code.into().trim().to_uppercase(),
            timeframe,
            from: None,
            to: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }
}

/// Filters for the position list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PositionStatus>,
    pub page: u32,
    pub size: u32,
}

impl Default for PositionQuery {
    fn default() -> Self {
        Self {
            symbol_code: None,
            status: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PositionQuery {
    pub fn symbol(mut self, symbol_code: impl Into<String>) -> Self {
        self.symbol_code = Some(symbol_code.into().trim().to_uppercase());
        self
    }

    pub fn status(mut self, status: PositionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserQuery<'a> {
    pub user_id: &'a str,
}

/// Stored candles for a symbol and timeframe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleQuery {
    pub symbol_code: String,
    pub timeframe: Timeframe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters of a market-data import on the backend.
#[derive(Debug, Clone, Serialize)]
pub struct ImportQuery {
    pub symbol: String,
    pub timeframe: Timeframe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Scope of a candle deletion. Empty deletes everything.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCandlesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}
