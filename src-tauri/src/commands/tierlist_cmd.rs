//! Tauri Commands for tier list CRUD and sharing

use tauri::State;

use super::error::CommandResult;
use crate::domain::{CreateTierList, TierList, TierListSummary, UpdateTierList};
use crate::service;
use crate::AppState;

/// Create a tier list; default tiers come from the game when omitted
#[tauri::command]
pub async fn create_tierlist(state: State<'_, AppState>, body: CreateTierList) -> CommandResult<TierList> {
    Ok(service::create_tier_list(&state.db_state, body).await?)
}

#[tauri::command]
pub async fn get_tierlist(state: State<'_, AppState>, id: String) -> CommandResult<TierList> {
    Ok(service::tier_list(&state.db_state, &id).await?)
}

/// Partial update: only supplied fields change
#[tauri::command]
pub async fn update_tierlist(
    state: State<'_, AppState>,
    id: String,
    body: UpdateTierList,
) -> CommandResult<TierList> {
    Ok(service::update_tier_list(&state.db_state, &id, body).await?)
}

#[tauri::command]
pub async fn get_shared_tierlist(state: State<'_, AppState>, share_code: String) -> CommandResult<TierList> {
    Ok(service::shared_tier_list(&state.db_state, &share_code).await?)
}

#[tauri::command]
pub async fn delete_tierlist(state: State<'_, AppState>, id: String) -> CommandResult<()> {
    Ok(service::delete_tier_list(&state.db_state, &id).await?)
}

#[tauri::command]
pub async fn list_tierlists(
    state: State<'_, AppState>,
    game_id: String,
    sheet_id: Option<String>,
) -> CommandResult<Vec<TierListSummary>> {
    Ok(service::tier_lists(&state.db_state, &game_id, sheet_id.as_deref()).await?)
}
