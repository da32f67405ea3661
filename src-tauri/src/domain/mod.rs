//! Domain Layer
//!
//! Wire models come from `tierforge-core` so the frontend and the backend
//! agree on every JSON field. This layer adds the persistence contract.

mod entity;
mod validation;

pub use entity::{DomainError, DomainResult, Entity};
pub use tierforge_core::{
    default_tiers, CreateTierList, Game, Item, SheetConfig, Tier, TierList, TierListSummary, UpdateTierList,
};
pub use validation::{tiers_for_new_list, validate_create};
