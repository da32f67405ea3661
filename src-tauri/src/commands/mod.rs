//! Commands Layer
//!
//! Tauri command handlers that bridge frontend to backend services.

mod error;
mod game_cmd;
mod tierlist_cmd;

pub use error::{CommandError, CommandResult};
pub use game_cmd::*;
pub use tierlist_cmd::*;
