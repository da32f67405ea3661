//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod db;
mod game_repo;
mod ids;
mod item_repo;
mod tierlist_repo;
mod traits;

#[cfg(test)]
mod tests;

pub use db::{init_db, DbState};
pub use game_repo::GameRepository;
pub use item_repo::ItemRepository;
pub use tierlist_repo::TierListRepository;
pub use traits::Repository;
