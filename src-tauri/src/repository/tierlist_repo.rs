//! Tier List Repository
//!
//! Tier lists store their tier sequence as one JSON column. Creation
//! assigns the id and a unique share code; updates are partial and always
//! bump `updated_at`.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::db::{now_rfc3339, ready};
use super::ids::{new_id, new_share_code};
use super::traits::Repository;
use crate::domain::{DomainError, DomainResult, Tier, TierList, TierListSummary, UpdateTierList};

const TIERLIST_COLUMNS: &str =
    "id, game_id, sheet_id, name, author_id, tiers, share_code, is_public, created_at, updated_at";

/// Fresh share codes tried before giving up on a collision streak
const SHARE_CODE_ATTEMPTS: usize = 5;

/// SQLite implementation of TierList repository
pub struct TierListRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl TierListRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// Insert a new list for an already validated request
    pub async fn create(&self, game_id: &str, sheet_id: &str, name: &str, tiers: Vec<Tier>) -> DomainResult<TierList> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let now = now_rfc3339();
        let mut tier_list = TierList::new(new_id(), game_id, sheet_id, name);
        tier_list.tiers = tiers;
        tier_list.created_at = now.clone();
        tier_list.updated_at = now;
        tier_list.share_code = unused_share_code(conn)?;

        conn.execute(
            &format!("INSERT INTO tierlists ({TIERLIST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                tier_list.id,
                tier_list.game_id,
                tier_list.sheet_id,
                tier_list.name,
                tier_list.author_id,
                serde_json::to_string(&tier_list.tiers)?,
                tier_list.share_code,
                tier_list.is_public,
                tier_list.created_at,
                tier_list.updated_at,
            ],
        )?;
        tracing::debug!(id = %tier_list.id, game = %game_id, sheet = %sheet_id, "tier list created");
        Ok(tier_list)
    }

    pub async fn find_by_share_code(&self, code: &str) -> DomainResult<Option<TierList>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let row = conn
            .query_row(
                &format!("SELECT {TIERLIST_COLUMNS} FROM tierlists WHERE share_code = ?"),
                params![code],
                TierListRow::read,
            )
            .optional()?;
        row.map(TierListRow::decode).transpose()
    }

    /// Apply the supplied fields only. Returns the stored list afterwards.
    pub async fn update(&self, id: &str, update: &UpdateTierList) -> DomainResult<TierList> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut sets = vec!["updated_at = ?"];
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(now_rfc3339())];
        if let Some(name) = &update.name {
            sets.push("name = ?");
            args.push(Box::new(name.clone()));
        }
        if let Some(tiers) = &update.tiers {
            sets.push("tiers = ?");
            args.push(Box::new(serde_json::to_string(tiers)?));
        }
        if let Some(is_public) = update.is_public {
            sets.push("is_public = ?");
            args.push(Box::new(is_public));
        }
        args.push(Box::new(id.to_string()));

        let query = format!("UPDATE tierlists SET {} WHERE id = ?", sets.join(", "));
        let changed = conn.execute(&query, rusqlite::params_from_iter(args.iter()))?;
        if changed == 0 {
            return Err(DomainError::NotFound("Tier list not found".into()));
        }

        let row = conn.query_row(
            &format!("SELECT {TIERLIST_COLUMNS} FROM tierlists WHERE id = ?"),
            params![id],
            TierListRow::read,
        )?;
        row.decode()
    }

    /// Listing entries for one game, newest first, optionally for one sheet
    pub async fn summaries(&self, game_id: &str, sheet_id: Option<&str>) -> DomainResult<Vec<TierListSummary>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut lists = Vec::new();
        match sheet_id {
            Some(sheet_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TIERLIST_COLUMNS} FROM tierlists WHERE game_id = ? AND sheet_id = ? ORDER BY updated_at DESC"
                ))?;
                for row in stmt.query_map(params![game_id, sheet_id], TierListRow::read)? {
                    lists.push(row?.decode()?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TIERLIST_COLUMNS} FROM tierlists WHERE game_id = ? ORDER BY updated_at DESC"
                ))?;
                for row in stmt.query_map(params![game_id], TierListRow::read)? {
                    lists.push(row?.decode()?);
                }
            }
        }
        Ok(lists.iter().map(summary).collect())
    }
}

fn summary(tier_list: &TierList) -> TierListSummary {
    TierListSummary {
        id: tier_list.id.clone(),
        game_id: tier_list.game_id.clone(),
        sheet_id: tier_list.sheet_id.clone(),
        name: tier_list.name.clone(),
        share_code: tier_list.share_code.clone(),
        item_count: tier_list.ranked_count(),
        updated_at: tier_list.updated_at.clone(),
    }
}

fn unused_share_code(conn: &Connection) -> DomainResult<String> {
    for _ in 0..SHARE_CODE_ATTEMPTS {
        let code = new_share_code();
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tierlists WHERE share_code = ?)",
            params![code],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(code);
        }
        tracing::warn!(%code, "share code collision, retrying");
    }
    Err(DomainError::Conflict("could not allocate a share code".into()))
}

struct TierListRow {
    id: String,
    game_id: String,
    sheet_id: String,
    name: String,
    author_id: Option<String>,
    tiers: String,
    share_code: String,
    is_public: bool,
    created_at: String,
    updated_at: String,
}

impl TierListRow {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            game_id: row.get(1)?,
            sheet_id: row.get(2)?,
            name: row.get(3)?,
            author_id: row.get(4)?,
            tiers: row.get(5)?,
            share_code: row.get(6)?,
            is_public: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn decode(self) -> DomainResult<TierList> {
        Ok(TierList {
            id: self.id,
            game_id: self.game_id,
            sheet_id: self.sheet_id,
            name: self.name,
            author_id: self.author_id,
            tiers: serde_json::from_str(&self.tiers)?,
            share_code: self.share_code,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl Repository<TierList> for TierListRepository {
    async fn find_by_id(&self, id: &String) -> DomainResult<Option<TierList>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let row = conn
            .query_row(
                &format!("SELECT {TIERLIST_COLUMNS} FROM tierlists WHERE id = ?"),
                params![id],
                TierListRow::read,
            )
            .optional()?;
        row.map(TierListRow::decode).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<TierList>> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut stmt = conn.prepare(&format!("SELECT {TIERLIST_COLUMNS} FROM tierlists ORDER BY updated_at DESC"))?;
        let mut lists = Vec::new();
        for row in stmt.query_map([], TierListRow::read)? {
            lists.push(row?.decode()?);
        }
        Ok(lists)
    }

    /// Full overwrite of an existing or imported list
    async fn save(&self, entity: &TierList) -> DomainResult<TierList> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let mut tier_list = entity.clone();
        let now = now_rfc3339();
        if tier_list.created_at.is_empty() {
            tier_list.created_at = now.clone();
        }
        tier_list.updated_at = now;
        if tier_list.share_code.is_empty() {
            tier_list.share_code = unused_share_code(conn)?;
        }

        conn.execute(
            &format!(
                "INSERT INTO tierlists ({TIERLIST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    game_id = excluded.game_id,
                    sheet_id = excluded.sheet_id,
                    name = excluded.name,
                    author_id = excluded.author_id,
                    tiers = excluded.tiers,
                    share_code = excluded.share_code,
                    is_public = excluded.is_public,
                    updated_at = excluded.updated_at"
            ),
            params![
                tier_list.id,
                tier_list.game_id,
                tier_list.sheet_id,
                tier_list.name,
                tier_list.author_id,
                serde_json::to_string(&tier_list.tiers)?,
                tier_list.share_code,
                tier_list.is_public,
                tier_list.created_at,
                tier_list.updated_at,
            ],
        )?;
        Ok(tier_list)
    }

    async fn delete(&self, id: &String) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = ready(&guard)?;

        let removed = conn.execute("DELETE FROM tierlists WHERE id = ?", params![id])?;
        if removed == 0 {
            return Err(DomainError::NotFound("Tier list not found".into()));
        }
        Ok(())
    }
}
