//! Bundled game data
//!
//! On first start (empty games table) every bundled seed is imported: the
//! game config plus its items.

use serde::Deserialize;

use crate::domain::{DomainResult, Game, Item};
use crate::repository::{DbState, GameRepository, ItemRepository, Repository};

const BUNDLED: [(&str, &str); 2] = [
    ("dos2.json", include_str!("../seeds/dos2.json")),
    ("bg3.json", include_str!("../seeds/bg3.json")),
];

/// One seed file
#[derive(Debug, Deserialize)]
pub struct Seed {
    pub game: Game,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Seed {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        let mut seed: Seed = serde_json::from_str(json)?;
        for item in &mut seed.items {
            if item.game_id.is_empty() {
                item.game_id = seed.game.id.clone();
            }
        }
        Ok(seed)
    }
}

/// Import one seed. Existing rows with the same ids are overwritten.
pub async fn import(db: &DbState, seed: &Seed) -> DomainResult<usize> {
    GameRepository::new(db.conn.clone()).save(&seed.game).await?;
    ItemRepository::new(db.conn.clone()).save_all(&seed.items).await
}

/// Import the bundled seeds when no game exists yet. Returns the number of
/// games imported; a broken seed is logged and skipped.
pub async fn seed_if_empty(db: &DbState) -> DomainResult<usize> {
    if GameRepository::new(db.conn.clone()).count().await? > 0 {
        return Ok(0);
    }

    let mut imported = 0;
    for (file, json) in BUNDLED {
        let seed = match Seed::parse(json) {
            Ok(seed) => seed,
            Err(e) => {
                tracing::error!(%file, error = %e, "bundled seed is malformed");
                continue;
            }
        };
        let items = import(db, &seed).await?;
        tracing::info!(%file, game = %seed.game.id, items, "seeded game");
        imported += 1;
    }
    Ok(imported)
}
