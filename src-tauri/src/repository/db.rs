//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Database state wrapper. Managed before the connection exists; the
/// background init fills `conn` in.
#[derive(Clone)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
    pub path: PathBuf,
}

impl DbState {
    pub fn new(path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            path,
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

/// Borrow the connection out of a locked slot
pub(crate) fn ready(slot: &Option<Connection>) -> DomainResult<&Connection> {
    slot.as_ref()
        .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))
}

pub(crate) fn ready_mut(slot: &mut Option<Connection>) -> DomainResult<&mut Connection> {
    slot.as_mut()
        .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))
}

/// Open (or create) the database at `db_path` and run migrations.
/// `:memory:` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> Result<DbState, String> {
    let conn = open(db_path)?;
    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    Ok(state)
}

fn open(db_path: &Path) -> Result<Connection, String> {
    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open database: {}", e))?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| format!("Failed to enable foreign keys: {}", e))?;
    // In-memory databases answer "memory" here.
    let mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|e| format!("Failed to set journal mode: {}", e))?;
    tracing::debug!(%mode, path = %db_path.display(), "database opened");

    run_migrations(&conn)?;
    Ok(conn)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS games (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            icon_url TEXT NOT NULL DEFAULT '',
            item_schema TEXT NOT NULL DEFAULT 'null',
            filters TEXT NOT NULL DEFAULT '[]',
            default_tiers TEXT NOT NULL DEFAULT '[]',
            sheets TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            game_id TEXT NOT NULL REFERENCES games(id),
            sheet_id TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            name_ru TEXT,
            icon TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT '',
            data TEXT NOT NULL DEFAULT '{}',
            UNIQUE (game_id, id)
        );
        CREATE INDEX IF NOT EXISTS idx_items_game ON items(game_id);
        CREATE INDEX IF NOT EXISTS idx_items_sheet ON items(game_id, sheet_id);

        CREATE TABLE IF NOT EXISTS tierlists (
            id TEXT PRIMARY KEY,
            game_id TEXT NOT NULL REFERENCES games(id),
            sheet_id TEXT NOT NULL,
            name TEXT NOT NULL,
            author_id TEXT,
            tiers TEXT NOT NULL,
            share_code TEXT UNIQUE NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tierlists_share ON tierlists(share_code);
        CREATE INDEX IF NOT EXISTS idx_tierlists_game ON tierlists(game_id, sheet_id);",
    )
    .map_err(|e| format!("Migration failed: {}", e))?;

    Ok(())
}

/// Timestamp format of every stored date. Fixed width, so text order is
/// time order.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
