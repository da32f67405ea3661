//! Game Repository
//!
//! Game configs are stored one row per game; the nested config parts
//! (filters, tiers, sheets, item schema) are JSON columns.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::db::{now_rfc3339, ready, ready_mut};
use super::traits::Repository;
use crate::domain::{DomainError, DomainResult, Game};

const GAME_COLUMNS: &str =
    "id, name, description, icon_url, item_schema, filters, default_tiers, sheets, created_at";

/// SQLite implementation of Game repository
pub struct GameRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl GameRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> DomainResult<usize> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Raw column values before the JSON parts are decoded
struct GameRow {
    id: String,
    name: String,
    description: String,
    icon_url: String,
    item_schema: String,
    filters: String,
    default_tiers: String,
    sheets: String,
    created_at: String,
}

impl GameRow {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            icon_url: row.get(3)?,
            item_schema: row.get(4)?,
            filters: row.get(5)?,
            default_tiers: row.get(6)?,
            sheets: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn decode(self) -> DomainResult<Game> {
        Ok(Game {
            id: self.id,
            name: self.name,
            description: self.description,
            icon_url: self.icon_url,
            item_schema: serde_json::from_str(&self.item_schema)?,
            filters: serde_json::from_str(&self.filters)?,
            default_tiers: serde_json::from_str(&self.default_tiers)?,
            sheets: serde_json::from_str(&self.sheets)?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl Repository<Game> for GameRepository {
    async fn find_by_id(&self, id: &String) -> DomainResult<Option<Game>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let row = conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?"),
                params![id],
                GameRow::read,
            )
            .optional()?;
        row.map(GameRow::decode).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Game>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut stmt = conn.prepare(&format!("SELECT {GAME_COLUMNS} FROM games ORDER BY name"))?;
        let rows = stmt.query_map([], GameRow::read)?;

        let mut games = Vec::new();
        for row in rows {
            games.push(row?.decode()?);
        }
        Ok(games)
    }

    async fn save(&self, entity: &Game) -> DomainResult<Game> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut game = entity.clone();
        if game.created_at.is_empty() {
            game.created_at = now_rfc3339();
        }

        // Upsert rather than REPLACE: items and tier lists reference the row.
        conn.execute(
            "INSERT INTO games (id, name, description, icon_url, item_schema, filters, default_tiers, sheets, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                icon_url = excluded.icon_url,
                item_schema = excluded.item_schema,
                filters = excluded.filters,
                default_tiers = excluded.default_tiers,
                sheets = excluded.sheets",
            params![
                game.id,
                game.name,
                game.description,
                game.icon_url,
                serde_json::to_string(&game.item_schema)?,
                serde_json::to_string(&game.filters)?,
                serde_json::to_string(&game.default_tiers)?,
                serde_json::to_string(&game.sheets)?,
                game.created_at,
            ],
        )?;
        Ok(game)
    }

    async fn delete(&self, id: &String) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = ready_mut(&mut guard)?;

        // Manual cascade: the foreign keys have no ON DELETE clause.
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tierlists WHERE game_id = ?", params![id])?;
        tx.execute("DELETE FROM items WHERE game_id = ?", params![id])?;
        let removed = tx.execute("DELETE FROM games WHERE id = ?", params![id])?;
        if removed == 0 {
            return Err(DomainError::NotFound(format!("game {}", id)));
        }
        tx.commit()?;
        Ok(())
    }
}
