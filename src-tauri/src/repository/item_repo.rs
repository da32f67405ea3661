//! Item Repository
//!
//! Rankable items of a game. `data` holds the game-specific attributes
//! as a JSON object.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::db::{ready, ready_mut};
use super::traits::Repository;
use crate::domain::{DomainError, DomainResult, Item};

const ITEM_COLUMNS: &str = "id, game_id, sheet_id, name, name_ru, icon, category, data";

const UPSERT_ITEM: &str = "INSERT INTO items (id, game_id, sheet_id, name, name_ru, icon, category, data)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?)
     ON CONFLICT(id) DO UPDATE SET
        game_id = excluded.game_id,
        sheet_id = excluded.sheet_id,
        name = excluded.name,
        name_ru = excluded.name_ru,
        icon = excluded.icon,
        category = excluded.category,
        data = excluded.data";

/// SQLite implementation of Item repository
pub struct ItemRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl ItemRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// Items of a game ordered by name, narrowed to one sheet when given
    pub async fn list_by_game(&self, game_id: &str, sheet_id: Option<&str>) -> DomainResult<Vec<Item>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut items = Vec::new();
        match sheet_id {
            Some(sheet_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items WHERE game_id = ? AND sheet_id = ? ORDER BY name"
                ))?;
                for row in stmt.query_map(params![game_id, sheet_id], ItemRow::read)? {
                    items.push(row?.decode()?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items WHERE game_id = ? ORDER BY name"
                ))?;
                for row in stmt.query_map(params![game_id], ItemRow::read)? {
                    items.push(row?.decode()?);
                }
            }
        }
        Ok(items)
    }

    /// Upsert many items in one transaction; all or nothing.
    pub async fn save_all(&self, items: &[Item]) -> DomainResult<usize> {
        let mut guard = self.conn.lock().await;
        let conn = ready_mut(&mut guard)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_ITEM)?;
            for item in items {
                stmt.execute(params![
                    item.id,
                    item.game_id,
                    item.sheet_id,
                    item.name,
                    item.name_ru,
                    item.icon,
                    item.category,
                    serde_json::to_string(&item.data)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(items.len())
    }
}

struct ItemRow {
    id: String,
    game_id: String,
    sheet_id: String,
    name: String,
    name_ru: Option<String>,
    icon: String,
    category: String,
    data: String,
}

impl ItemRow {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            game_id: row.get(1)?,
            sheet_id: row.get(2)?,
            name: row.get(3)?,
            name_ru: row.get(4)?,
            icon: row.get(5)?,
            category: row.get(6)?,
            data: row.get(7)?,
        })
    }

    fn decode(self) -> DomainResult<Item> {
        Ok(Item {
            id: self.id,
            game_id: self.game_id,
            sheet_id: self.sheet_id,
            name: self.name,
            name_ru: self.name_ru,
            icon: self.icon,
            category: self.category,
            data: serde_json::from_str(&self.data)?,
        })
    }
}

#[async_trait]
impl Repository<Item> for ItemRepository {
    async fn find_by_id(&self, id: &String) -> DomainResult<Option<Item>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let row = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"),
                params![id],
                ItemRow::read,
            )
            .optional()?;
        row.map(ItemRow::decode).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY game_id, name"))?;
        let mut items = Vec::new();
        for row in stmt.query_map([], ItemRow::read)? {
            items.push(row?.decode()?);
        }
        Ok(items)
    }

    async fn save(&self, entity: &Item) -> DomainResult<Item> {
        self.save_all(std::slice::from_ref(entity)).await?;
        Ok(entity.clone())
    }

    async fn delete(&self, id: &String) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let removed = conn.execute("DELETE FROM items WHERE id = ?", params![id])?;
        if removed == 0 {
            return Err(DomainError::NotFound(format!("item {}", id)));
        }
        Ok(())
    }
}
