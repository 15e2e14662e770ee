//! Candle storage on the backend (admin endpoints).

use super::types::{CandleQuery, DeleteCandlesQuery, ImportQuery};
use super::{ApiClient, ApiError};
use crate::models::{Candle, DeleteResult, ImportResult};
use crate::session::CredentialStore;

impl<S: CredentialStore> ApiClient<S> {
    pub async fn candles(&self, query: &CandleQuery) -> Result<Vec<Candle>, ApiError> {
        self.get_with("/api/admin/candles", query).await
    }

    /// Have the backend pull candles from the market-data API into its store.
    pub async fn import_candles(&self, query: &ImportQuery) -> Result<ImportResult, ApiError> {
        self.post_with("/api/admin/candles/import-binance", query)
            .await
    }

    pub async fn delete_candles(&self, query: &DeleteCandlesQuery) -> Result<DeleteResult, ApiError> {
        self.delete_with("/api/admin/candles", query).await
    }
}
