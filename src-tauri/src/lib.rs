//! TierForge Backend
//!
//! Layered architecture:
//! - domain: wire models shared with the frontend, creation rules
//! - repository: SQLite persistence of games, items and tier lists
//! - service: request handling behind the commands
//! - commands: Tauri command handlers

use std::path::PathBuf;
use tauri::{Emitter, Manager};

mod commands;
mod domain;
mod repository;
mod seed;
mod service;

use repository::{init_db, DbState};

/// Application state shared across commands
pub struct AppState {
    pub db_state: DbState,
    pub db_path: PathBuf,
}

/// Get database path from app handle
fn get_db_path(app_handle: &tauri::AppHandle) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let app_dir = app_handle.path().app_data_dir()?;
    std::fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join("tierforge.db"))
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            // Single instance check - must be first!
            #[cfg(desktop)]
            app.handle().plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
                // Focus the existing window when a new instance tries to start
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))?;

            let app_handle = app.handle().clone();

            rolling_logger::init_logger(app_handle.path().app_log_dir()?, "TierForge")?;

            let db_path = get_db_path(&app_handle)?;
            tracing::info!(path = %db_path.display(), "app setup starting");

            // Manage state immediately; the connection arrives later.
            let db_state = DbState::new(db_path.clone());
            app.manage(AppState {
                db_state: db_state.clone(),
                db_path: db_path.clone(),
            });

            tauri::async_runtime::spawn(async move {
                match init_db(&db_path).await {
                    Ok(initialized) => {
                        let conn = initialized.conn.lock().await.take();
                        *db_state.conn.lock().await = conn;
                        let _ = rolling_logger::info("Async DB init success");

                        match seed::seed_if_empty(&db_state).await {
                            Ok(0) => {}
                            Ok(games) => tracing::info!(games, "bundled games imported"),
                            Err(e) => tracing::error!(error = %e, "seeding failed"),
                        }

                        if let Err(e) = app_handle.emit("db-initialized", ()) {
                            tracing::warn!(error = %e, "failed to emit db-initialized");
                        }
                    }
                    Err(e) => {
                        let _ = rolling_logger::error(&format!("Async DB init failed: {}", e));
                    }
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_games,
            commands::get_game,
            commands::get_sheets,
            commands::get_items,
            commands::create_tierlist,
            commands::get_tierlist,
            commands::update_tierlist,
            commands::get_shared_tierlist,
            commands::delete_tierlist,
            commands::list_tierlists,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
