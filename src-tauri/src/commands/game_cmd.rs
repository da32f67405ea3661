//! Tauri Commands for games and their items

use tauri::State;

use super::error::CommandResult;
use crate::domain::{Game, SheetConfig};
use crate::service;
use crate::AppState;
use tierforge_core::ItemList;

/// All games, ordered by name
#[tauri::command]
pub async fn get_games(state: State<'_, AppState>) -> CommandResult<Vec<Game>> {
    Ok(service::games(&state.db_state).await?)
}

#[tauri::command]
pub async fn get_game(state: State<'_, AppState>, game_id: String) -> CommandResult<Game> {
    Ok(service::game(&state.db_state, &game_id).await?)
}

#[tauri::command]
pub async fn get_sheets(state: State<'_, AppState>, game_id: String) -> CommandResult<Vec<SheetConfig>> {
    Ok(service::sheets(&state.db_state, &game_id).await?)
}

/// Items of a game, optionally one sheet only
#[tauri::command]
pub async fn get_items(
    state: State<'_, AppState>,
    game_id: String,
    sheet: Option<String>,
) -> CommandResult<ItemList> {
    Ok(service::items(&state.db_state, &game_id, sheet.as_deref()).await?)
}
