//! Persistence API contract
//!
//! The backend is reached through [`PersistenceApi`]. The browser build
//! implements it over Tauri IPC; tests use an in-memory fake. Futures are
//! `!Send`: everything runs on the single UI thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CreateTierList, Game, ItemList, TierList, TierListSummary, UpdateTierList};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Error body of every failed call: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// Map a non-2xx status and its message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => ApiError::NotFound(message),
            400 | 422 => ApiError::BadRequest(message),
            _ => ApiError::Server { status, message },
        }
    }

    /// Map a status and raw response body, reading `{error}` when present.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::from_status(status, message)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait(?Send)]
pub trait PersistenceApi {
    async fn list_games(&self) -> ApiResult<Vec<Game>>;

    async fn get_game(&self, game_id: &str) -> ApiResult<Game>;

    /// Items of a game, narrowed to one sheet when given
    async fn list_items(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<ItemList>;

    /// Default tiers come from the game config when `body.tiers` is absent.
    async fn create_tier_list(&self, body: CreateTierList) -> ApiResult<TierList>;

    async fn get_tier_list(&self, id: &str) -> ApiResult<TierList>;

    /// Partial update: only supplied fields change.
    async fn update_tier_list(&self, id: &str, body: UpdateTierList) -> ApiResult<TierList>;

    async fn get_shared_tier_list(&self, share_code: &str) -> ApiResult<TierList>;

    async fn delete_tier_list(&self, id: &str) -> ApiResult<()>;

    async fn list_tier_lists(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<Vec<TierListSummary>>;
}
