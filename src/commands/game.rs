//! Game Commands
//!
//! Frontend bindings for game and item lookups.

use serde::Serialize;
use tierforge_core::{ApiResult, Game, ItemList};

use super::{call, NoArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameIdArgs<'a> {
    game_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemsArgs<'a> {
    game_id: &'a str,
    sheet: Option<&'a str>,
}

pub async fn get_games() -> ApiResult<Vec<Game>> {
    call("get_games", &NoArgs {}).await
}

pub async fn get_game(game_id: &str) -> ApiResult<Game> {
    call("get_game", &GameIdArgs { game_id }).await
}

pub async fn get_items(game_id: &str, sheet: Option<&str>) -> ApiResult<ItemList> {
    call("get_items", &ItemsArgs { game_id, sheet }).await
}
