//! Signal generation and history.

use super::types::{Page, SignalQuery};
use super::{ApiClient, ApiError};
use crate::models::{Signal, SignalDto, SignalRequest};
use crate::session::CredentialStore;

impl<S: CredentialStore> ApiClient<S> {
    /// Ask the backend's AI service for a fresh signal.
    pub async fn generate_signal(&self, request: &SignalRequest) -> Result<Signal, ApiError> {
        let dto: SignalDto = self.post("/api/signals/ai-suggest", request).await?;
        Ok(dto.into())
    }

    pub async fn signals(&self, query: &SignalQuery) -> Result<Page<Signal>, ApiError> {
        let page: Page<SignalDto> = self.get_with("/api/signals", query).await?;
        Ok(page.map(Signal::from))
    }

    pub async fn signal(&self, id: u64) -> Result<Signal, ApiError> {
        let dto: SignalDto = self.get(&format!("/api/signals/{}", id)).await?;
        Ok(dto.into())
    }
}
