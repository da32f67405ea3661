//! Domain Layer - Core Entity Trait
//!
//! Every persisted record has a string id assigned by the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tierforge_core::{Game, Item, TierList};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

impl Entity for Game {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Entity for Item {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Entity for TierList {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for DomainError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => DomainError::NotFound("no matching row".into()),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Internal(format!("malformed stored JSON: {err}"))
    }
}
