//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.

use async_trait::async_trait;
use crate::domain::{Entity, DomainResult};

/// Core repository trait for keyed records
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: &T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Insert, or overwrite the record with the same id
    async fn save(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID. Missing ids are `NotFound`.
    async fn delete(&self, id: &T::Id) -> DomainResult<()>;
}
