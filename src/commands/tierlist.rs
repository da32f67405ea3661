//! Tier List Commands
//!
//! Frontend bindings for tier list CRUD and share lookups.

use serde::Serialize;
use tierforge_core::{ApiResult, CreateTierList, TierList, TierListSummary, UpdateTierList};

use super::call;

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct CreateArgs<'a> {
    body: &'a CreateTierList,
}

#[derive(Serialize)]
struct UpdateArgs<'a> {
    id: &'a str,
    body: &'a UpdateTierList,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareArgs<'a> {
    share_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs<'a> {
    game_id: &'a str,
    sheet_id: Option<&'a str>,
}

pub async fn create_tierlist(body: &CreateTierList) -> ApiResult<TierList> {
    call("create_tierlist", &CreateArgs { body }).await
}

pub async fn get_tierlist(id: &str) -> ApiResult<TierList> {
    call("get_tierlist", &IdArgs { id }).await
}

pub async fn update_tierlist(id: &str, body: &UpdateTierList) -> ApiResult<TierList> {
    call("update_tierlist", &UpdateArgs { id, body }).await
}

pub async fn get_shared_tierlist(share_code: &str) -> ApiResult<TierList> {
    call("get_shared_tierlist", &ShareArgs { share_code }).await
}

pub async fn delete_tierlist(id: &str) -> ApiResult<()> {
    call("delete_tierlist", &IdArgs { id }).await
}

pub async fn list_tierlists(game_id: &str, sheet_id: Option<&str>) -> ApiResult<Vec<TierListSummary>> {
    call("list_tierlists", &ListArgs { game_id, sheet_id }).await
}
