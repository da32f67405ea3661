//! Tier list creation rules

use super::{DomainError, DomainResult};
use tierforge_core::{CreateTierList, Game, Tier};

/// Check a creation request against the game it names.
///
/// Games without sheets take an empty `sheet_id` (the whole item pool);
/// games with sheets need one of their own sheet ids.
pub fn validate_create(body: &CreateTierList, game: Option<&Game>) -> DomainResult<()> {
    if body.game_id.trim().is_empty() || body.name.trim().is_empty() {
        return Err(DomainError::InvalidInput("game_id, sheet_id, and name are required".into()));
    }
    let game = game.ok_or_else(|| DomainError::InvalidInput("Invalid game_id".into()))?;

    if game.sheets.is_empty() {
        if !body.sheet_id.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "game {} has no sheets",
                game.id
            )));
        }
    } else if body.sheet_id.is_empty() {
        return Err(DomainError::InvalidInput("game_id, sheet_id, and name are required".into()));
    } else if game.sheet(&body.sheet_id).is_none() {
        return Err(DomainError::InvalidInput(format!("Invalid sheet_id: {}", body.sheet_id)));
    }
    Ok(())
}

/// Tiers a new list starts with: the supplied ones, else the game's
/// defaults. Supplied tiers keep their items.
pub fn tiers_for_new_list(supplied: Option<Vec<Tier>>, game: &Game) -> Vec<Tier> {
    match supplied {
        Some(tiers) if !tiers.is_empty() => tiers,
        _ => game.initial_tiers(),
    }
}
