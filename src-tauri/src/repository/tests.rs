//! Repository Integration Tests
//!
//! Games, items and tier lists against an in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::domain::{DomainError, Game, Item, Tier, TierList, UpdateTierList};
    use crate::repository::{init_db, DbState, GameRepository, ItemRepository, Repository, TierListRepository};
    use std::path::PathBuf;

    async fn setup_test_db() -> DbState {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        init_db(&db_path).await.expect("Failed to init test DB")
    }

    fn game(id: &str, name: &str) -> Game {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "filters": [{"id": "school", "name": "School", "field": "school", "type": "multiselect", "options": ["Pyro", "Hydro"]}],
            "default_tiers": [{"id": "s", "name": "S", "color": "#f00", "order": 0}],
            "sheets": [{"id": "skills", "name": "Skills"}]
        }))
        .unwrap()
    }

    fn item(id: &str, game_id: &str, sheet_id: &str, name: &str) -> Item {
        let mut item = Item::new(id, name);
        item.game_id = game_id.into();
        item.sheet_id = sheet_id.into();
        item.data.insert("school".into(), serde_json::json!("Pyro"));
        item
    }

    async fn seeded() -> DbState {
        let db = setup_test_db().await;
        let games = GameRepository::new(db.conn.clone());
        games.save(&game("dos2", "Divinity")).await.unwrap();
        games.save(&game("bg3", "Baldur's Gate")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_games_round_trip_ordered_by_name() {
        let db = seeded().await;
        let repo = GameRepository::new(db.conn.clone());

        let games = repo.list().await.expect("List failed");
        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Baldur's Gate", "Divinity"]);

        let dos2 = repo.find_by_id(&"dos2".to_string()).await.unwrap().unwrap();
        assert_eq!(dos2.filters[0].options, vec!["Pyro", "Hydro"]);
        assert_eq!(dos2.sheets[0].id, "skills");
        assert!(!dos2.created_at.is_empty());
        assert!(repo.find_by_id(&"nope".to_string()).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_game_upsert_keeps_references() {
        let db = seeded().await;
        let games = GameRepository::new(db.conn.clone());
        let items = ItemRepository::new(db.conn.clone());
        items.save(&item("fireball", "dos2", "skills", "Fireball")).await.unwrap();

        let mut renamed = game("dos2", "Divinity: Original Sin 2");
        renamed.created_at = String::new();
        games.save(&renamed).await.expect("Upsert failed");

        let stored = games.find_by_id(&"dos2".to_string()).await.unwrap().unwrap();
        assert_eq!(stored.name, "Divinity: Original Sin 2");
        assert_eq!(items.list_by_game("dos2", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_items_by_game_and_sheet() {
        let db = seeded().await;
        let repo = ItemRepository::new(db.conn.clone());
        let saved = repo
            .save_all(&[
                item("haste", "dos2", "skills", "Haste"),
                item("fireball", "dos2", "skills", "Fireball"),
                item("glass", "dos2", "talents", "Glass Cannon"),
                item("bless", "bg3", "", "Bless"),
            ])
            .await
            .expect("Bulk save failed");
        assert_eq!(saved, 4);

        let skills = repo.list_by_game("dos2", Some("skills")).await.unwrap();
        let names: Vec<&str> = skills.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Fireball", "Haste"]);
        assert_eq!(skills[0].data["school"], "Pyro");

        assert_eq!(repo.list_by_game("dos2", None).await.unwrap().len(), 3);
        assert!(repo.list_by_game("dos2", Some("runes")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_save_is_all_or_nothing() {
        let db = seeded().await;
        let repo = ItemRepository::new(db.conn.clone());

        // The second item references a missing game.
        let result = repo
            .save_all(&[item("ok", "dos2", "skills", "Fine"), item("bad", "ghost", "", "Orphan")])
            .await;
        assert!(result.is_err());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_tier_list_assigns_ids() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());

        let tiers = vec![Tier::new("s", "S", "#f00", 0).with_items(&["fireball"])];
        let created = repo.create("dos2", "skills", "Mine", tiers).await.expect("Failed to create");
        assert_eq!(created.id.len(), 36);
        assert_eq!(created.share_code.len(), 8);
        assert!(!created.is_public);
        assert_eq!(created.created_at, created.updated_at);

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        let other = repo.create("dos2", "skills", "Other", Vec::new()).await.unwrap();
        assert_ne!(other.id, created.id);
        assert_ne!(other.share_code, created.share_code);
    }

    #[tokio::test]
    async fn test_partial_update_changes_only_supplied_fields() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());
        let created = repo
            .create("dos2", "skills", "Mine", vec![Tier::new("s", "S", "#f00", 0)])
            .await
            .unwrap();

        let renamed = repo.update(&created.id, &UpdateTierList::name("Renamed")).await.unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.tiers, created.tiers);
        assert!(renamed.updated_at >= created.updated_at);

        let tiers = vec![Tier::new("s", "S", "#f00", 0).with_items(&["haste"]), Tier::new("a", "A", "#0f0", 1)];
        let retiered = repo.update(&created.id, &UpdateTierList::tiers(tiers.clone())).await.unwrap();
        assert_eq!(retiered.name, "Renamed");
        assert_eq!(retiered.tiers, tiers);

        let shared = repo.update(&created.id, &UpdateTierList::is_public(true)).await.unwrap();
        assert!(shared.is_public);
        assert_eq!(shared.tiers, tiers);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());
        let err = repo.update("missing", &UpdateTierList::name("x")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_share_code_lookup_and_delete() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());
        let created = repo.create("dos2", "skills", "Mine", Vec::new()).await.unwrap();

        let found = repo.find_by_share_code(&created.share_code).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_share_code("zzzzzzzz").await.unwrap().is_none());

        repo.delete(&created.id).await.expect("Delete failed");
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&created.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_summaries_count_ranked_items() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());
        repo.create("dos2", "skills", "A", vec![Tier::new("s", "S", "#f00", 0).with_items(&["x", "y"])])
            .await
            .unwrap();
        repo.create("dos2", "talents", "B", Vec::new()).await.unwrap();
        repo.create("bg3", "", "C", Vec::new()).await.unwrap();

        let all = repo.summaries("dos2", None).await.unwrap();
        assert_eq!(all.len(), 2);
        let skills = repo.summaries("dos2", Some("skills")).await.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "A");
        assert_eq!(skills[0].item_count, 2);
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_list() {
        let db = seeded().await;
        let repo = TierListRepository::new(db.conn.clone());
        let mut imported = TierList::new("imported", "dos2", "skills", "Imported");
        imported.tiers = vec![Tier::new("s", "S", "#f00", 0)];
        let saved = repo.save(&imported).await.unwrap();
        assert_eq!(saved.share_code.len(), 8);

        let mut changed = saved.clone();
        changed.name = "Changed".into();
        changed.tiers.clear();
        repo.save(&changed).await.unwrap();

        let stored = repo.find_by_id(&"imported".to_string()).await.unwrap().unwrap();
        assert_eq!(stored.name, "Changed");
        assert!(stored.tiers.is_empty());
        assert_eq!(stored.share_code, saved.share_code);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_game_cascades() {
        let db = seeded().await;
        let games = GameRepository::new(db.conn.clone());
        let items = ItemRepository::new(db.conn.clone());
        let lists = TierListRepository::new(db.conn.clone());
        items.save(&item("fireball", "dos2", "skills", "Fireball")).await.unwrap();
        lists.create("dos2", "skills", "Mine", Vec::new()).await.unwrap();

        games.delete(&"dos2".to_string()).await.expect("Delete failed");
        assert!(items.list().await.unwrap().is_empty());
        assert!(lists.list().await.unwrap().is_empty());
        assert_eq!(games.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uninitialized_state_reports_error() {
        let db = DbState::new(PathBuf::from("unused.db"));
        assert!(!db.is_ready().await);
        let err = GameRepository::new(db.conn.clone()).list().await.unwrap_err();
        assert_eq!(err, DomainError::Internal("Database not initialized".into()));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tierforge.db");
        {
            let db = init_db(&path).await.unwrap();
            GameRepository::new(db.conn.clone()).save(&game("dos2", "Divinity")).await.unwrap();
        }
        let db = init_db(&path).await.unwrap();
        assert!(db.is_ready().await);
        assert_eq!(GameRepository::new(db.conn.clone()).count().await.unwrap(), 1);
    }
}
