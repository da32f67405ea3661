//! Request handling behind the IPC commands
//!
//! Each function takes the database state directly so it can be exercised
//! without a running Tauri app.

use crate::domain::{
    tiers_for_new_list, validate_create, CreateTierList, DomainError, DomainResult, Game, SheetConfig, TierList,
    TierListSummary, UpdateTierList,
};
use crate::repository::{DbState, GameRepository, ItemRepository, Repository, TierListRepository};
use tierforge_core::ItemList;

pub async fn games(db: &DbState) -> DomainResult<Vec<Game>> {
    GameRepository::new(db.conn.clone()).list().await
}

pub async fn game(db: &DbState, game_id: &str) -> DomainResult<Game> {
    GameRepository::new(db.conn.clone())
        .find_by_id(&game_id.to_string())
        .await?
        .ok_or_else(|| DomainError::NotFound("Game not found".into()))
}

pub async fn sheets(db: &DbState, game_id: &str) -> DomainResult<Vec<SheetConfig>> {
    Ok(game(db, game_id).await?.sheets)
}

/// Items of a game; an empty or absent sheet means every sheet.
/// Unknown games yield an empty list.
pub async fn items(db: &DbState, game_id: &str, sheet: Option<&str>) -> DomainResult<ItemList> {
    let sheet = sheet.filter(|s| !s.is_empty());
    let items = ItemRepository::new(db.conn.clone()).list_by_game(game_id, sheet).await?;
    Ok(ItemList {
        total_count: items.len(),
        items,
    })
}

pub async fn create_tier_list(db: &DbState, body: CreateTierList) -> DomainResult<TierList> {
    let game = GameRepository::new(db.conn.clone()).find_by_id(&body.game_id).await?;
    validate_create(&body, game.as_ref())?;
    let game = game.ok_or_else(|| DomainError::InvalidInput("Invalid game_id".into()))?;

    let tiers = tiers_for_new_list(body.tiers, &game);
    TierListRepository::new(db.conn.clone())
        .create(&body.game_id, &body.sheet_id, body.name.trim(), tiers)
        .await
}

pub async fn tier_list(db: &DbState, id: &str) -> DomainResult<TierList> {
    TierListRepository::new(db.conn.clone())
        .find_by_id(&id.to_string())
        .await?
        .ok_or_else(|| DomainError::NotFound("Tier list not found".into()))
}

pub async fn update_tier_list(db: &DbState, id: &str, body: UpdateTierList) -> DomainResult<TierList> {
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(DomainError::InvalidInput("name must not be empty".into()));
    }
    TierListRepository::new(db.conn.clone()).update(id, &body).await
}

/// Share codes only resolve while the list is public.
pub async fn shared_tier_list(db: &DbState, share_code: &str) -> DomainResult<TierList> {
    TierListRepository::new(db.conn.clone())
        .find_by_share_code(share_code)
        .await?
        .filter(|tl| tl.is_public)
        .ok_or_else(|| DomainError::NotFound("Tier list not found".into()))
}

pub async fn delete_tier_list(db: &DbState, id: &str) -> DomainResult<()> {
    TierListRepository::new(db.conn.clone()).delete(&id.to_string()).await
}

pub async fn tier_lists(db: &DbState, game_id: &str, sheet_id: Option<&str>) -> DomainResult<Vec<TierListSummary>> {
    TierListRepository::new(db.conn.clone()).summaries(game_id, sheet_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::init_db;
    use crate::seed::seed_if_empty;
    use std::path::PathBuf;
    use tierforge_core::Tier;

    async fn seeded() -> DbState {
        let db = init_db(&PathBuf::from(":memory:")).await.unwrap();
        seed_if_empty(&db).await.unwrap();
        db
    }

    fn body(game_id: &str, sheet_id: &str, name: &str) -> CreateTierList {
        CreateTierList {
            game_id: game_id.into(),
            sheet_id: sheet_id.into(),
            name: name.into(),
            tiers: None,
        }
    }

    #[tokio::test]
    async fn test_create_uses_game_default_tiers() {
        let db = seeded().await;
        let created = create_tier_list(&db, body("dos2", "skills", " Mine ")).await.unwrap();
        assert_eq!(created.name, "Mine");
        assert_eq!(created.tiers.len(), 6);
        assert!(created.tiers.iter().all(|t| t.items.is_empty()));

        let bg3 = create_tier_list(&db, body("bg3", "", "Spells")).await.unwrap();
        assert_eq!(bg3.tiers[0].name, "S");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_requests() {
        let db = seeded().await;
        let err = create_tier_list(&db, body("ghost", "skills", "Mine")).await.unwrap_err();
        assert_eq!(err, DomainError::InvalidInput("Invalid game_id".into()));
        assert!(matches!(
            create_tier_list(&db, body("dos2", "", "Mine")).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_supplied_tiers_are_kept() {
        let db = seeded().await;
        let mut request = body("dos2", "talents", "Mine");
        request.tiers = Some(vec![Tier::new("top", "Top", "#fff", 0).with_items(&["dos2_lone_wolf"])]);
        let created = create_tier_list(&db, request).await.unwrap();
        assert_eq!(created.tiers.len(), 1);
        assert_eq!(created.tiers[0].items, vec!["dos2_lone_wolf"]);
    }

    #[tokio::test]
    async fn test_items_filter_by_sheet() {
        let db = seeded().await;
        let all = items(&db, "dos2", None).await.unwrap();
        let skills = items(&db, "dos2", Some("skills")).await.unwrap();
        let talents = items(&db, "dos2", Some("talents")).await.unwrap();
        assert_eq!(skills.total_count + talents.total_count, all.total_count);
        assert_eq!(items(&db, "dos2", Some("")).await.unwrap().total_count, all.total_count);
        assert_eq!(items(&db, "ghost", None).await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn test_game_lookups() {
        let db = seeded().await;
        assert_eq!(sheets(&db, "dos2").await.unwrap().len(), 2);
        assert!(sheets(&db, "bg3").await.unwrap().is_empty());
        assert!(matches!(game(&db, "ghost").await, Err(DomainError::NotFound(_))));
        assert_eq!(games(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shared_lookup_requires_public() {
        let db = seeded().await;
        let created = create_tier_list(&db, body("dos2", "skills", "Mine")).await.unwrap();
        assert!(matches!(
            shared_tier_list(&db, &created.share_code).await,
            Err(DomainError::NotFound(_))
        ));

        update_tier_list(&db, &created.id, UpdateTierList::is_public(true)).await.unwrap();
        let shared = shared_tier_list(&db, &created.share_code).await.unwrap();
        assert_eq!(shared.id, created.id);
    }

    #[tokio::test]
    async fn test_rename_to_blank_is_rejected() {
        let db = seeded().await;
        let created = create_tier_list(&db, body("dos2", "skills", "Mine")).await.unwrap();
        let err = update_tier_list(&db, &created.id, UpdateTierList::name(" ")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(tier_list(&db, &created.id).await.unwrap().name, "Mine");
    }

    #[tokio::test]
    async fn test_delete_then_lookup() {
        let db = seeded().await;
        let created = create_tier_list(&db, body("dos2", "skills", "Mine")).await.unwrap();
        assert_eq!(tier_lists(&db, "dos2", Some("skills")).await.unwrap().len(), 1);
        delete_tier_list(&db, &created.id).await.unwrap();
        assert!(matches!(tier_list(&db, &created.id).await, Err(DomainError::NotFound(_))));
        assert!(tier_lists(&db, "dos2", None).await.unwrap().is_empty());
    }
}
