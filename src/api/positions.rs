//! Position lifecycle and portfolio statistics.

use serde_json::json;

use super::types::{Page, PositionQuery, UserQuery};
use super::{ApiClient, ApiError};
use crate::models::{
    ClosePositionRequest, ExecutePositionRequest, OpenPositionRequest, PortfolioStats, Position,
    PositionDto,
};
use crate::session::CredentialStore;

impl<S: CredentialStore> ApiClient<S> {
    /// Create a PENDING position.
    pub async fn open_position(&self, request: &OpenPositionRequest) -> Result<Position, ApiError> {
        let dto: PositionDto = self.post("/api/positions", request).await?;
        Ok(dto.into())
    }

    /// PENDING -> OPEN at the actual fill price.
    pub async fn execute_position(
        &self,
        id: u64,
        request: &ExecutePositionRequest,
    ) -> Result<Position, ApiError> {
        let dto: PositionDto = self
            .put(&format!("/api/positions/{}/execute", id), request)
            .await?;
        Ok(dto.into())
    }

    /// OPEN -> CLOSED.
    pub async fn close_position(
        &self,
        id: u64,
        request: &ClosePositionRequest,
    ) -> Result<Position, ApiError> {
        let dto: PositionDto = self
            .put(&format!("/api/positions/{}/close", id), request)
            .await?;
        Ok(dto.into())
    }

    /// PENDING -> CANCELLED.
    pub async fn cancel_position(&self, id: u64) -> Result<Position, ApiError> {
        let dto: PositionDto = self
            .put(&format!("/api/positions/{}/cancel", id), &json!({}))
            .await?;
        Ok(dto.into())
    }

    pub async fn position(&self, id: u64) -> Result<Position, ApiError> {
        let dto: PositionDto = self.get(&format!("/api/positions/{}", id)).await?;
        Ok(dto.into())
    }

    pub async fn positions(&self, query: &PositionQuery) -> Result<Page<Position>, ApiError> {
        let page: Page<PositionDto> = self.get_with("/api/positions", query).await?;
        Ok(page.map(Position::from))
    }

    pub async fn open_positions(&self, user_id: &str) -> Result<Vec<Position>, ApiError> {
        let dtos: Vec<PositionDto> = self
            .get_with("/api/positions/open", &UserQuery { user_id })
            .await?;
        Ok(dtos.into_iter().map(Position::from).collect())
    }

    pub async fn portfolio_stats(&self, user_id: &str) -> Result<PortfolioStats, ApiError> {
        self.get_with("/api/positions/stats", &UserQuery { user_id })
            .await
    }
}
