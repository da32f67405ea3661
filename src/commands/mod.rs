//! Tauri Command Wrappers
//!
//! Frontend bindings to backend commands, organized by domain.
//! [`TauriApi`] exposes them to the engine as a [`PersistenceApi`].

mod game;
mod tierlist;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tierforge_core::{
    ApiError, ApiResult, CreateTierList, Game, ItemList, PersistenceApi, TierList, TierListSummary, UpdateTierList,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

/// Rejection payload of a failed command
#[derive(Debug, Deserialize)]
struct CommandFailure {
    status: u16,
    error: String,
}

fn rejection(cmd: &str, err: JsValue) -> ApiError {
    if let Ok(failure) = serde_wasm_bindgen::from_value::<CommandFailure>(err.clone()) {
        return ApiError::from_status(failure.status, failure.error);
    }
    // Tauri itself rejects with a bare string (unknown command, bad args).
    let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    tracing::warn!(cmd, %message, "invoke rejected");
    ApiError::Transport(message)
}

/// Invoke `cmd` with camelCase `args` and decode the result.
async fn call<A, T>(cmd: &str, args: &A) -> ApiResult<T>
where
    A: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let js_args = args
        .serialize(&serializer)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    tracing::trace!(cmd, "invoke");
    let result = invoke(cmd, js_args).await.map_err(|err| rejection(cmd, err))?;
    serde_wasm_bindgen::from_value(result).map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(Serialize)]
struct NoArgs {}

/// Backend reached over Tauri IPC
#[derive(Debug, Clone, Copy, Default)]
pub struct TauriApi;

#[async_trait(?Send)]
impl PersistenceApi for TauriApi {
    async fn list_games(&self) -> ApiResult<Vec<Game>> {
        game::get_games().await
    }

    async fn get_game(&self, game_id: &str) -> ApiResult<Game> {
        game::get_game(game_id).await
    }

    async fn list_items(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<ItemList> {
        game::get_items(game_id, sheet_id).await
    }

    async fn create_tier_list(&self, body: CreateTierList) -> ApiResult<TierList> {
        tierlist::create_tierlist(&body).await
    }

    async fn get_tier_list(&self, id: &str) -> ApiResult<TierList> {
        tierlist::get_tierlist(id).await
    }

    async fn update_tier_list(&self, id: &str, body: UpdateTierList) -> ApiResult<TierList> {
        tierlist::update_tierlist(id, &body).await
    }

    async fn get_shared_tier_list(&self, share_code: &str) -> ApiResult<TierList> {
        tierlist::get_shared_tierlist(share_code).await
    }

    async fn delete_tier_list(&self, id: &str) -> ApiResult<()> {
        tierlist::delete_tierlist(id).await
    }

    async fn list_tier_lists(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<Vec<TierListSummary>> {
        tierlist::list_tierlists(game_id, sheet_id).await
    }
}
