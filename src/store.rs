//! UI State Store
//!
//! Leptos `reactive_stores` state for what lives outside the board: the
//! game list, presets, save status and user-facing notices. Filled from
//! engine notifications on the bus.

use leptos::prelude::*;
use reactive_stores::Store;
use tierforge_core::{Event, EventBus, Game, PresetState, SaveStatus, Subscription};

#[derive(Clone, Debug, Default, Store)]
pub struct UiState {
    /// Every configured game
    pub games: Vec<Game>,
    /// Presets of the current game and sheet
    pub presets: PresetState,
    pub save_status: SaveStatus,
    /// Last failure worth showing
    pub notice: Option<String>,
}

pub type UiStore = Store<UiState>;

pub fn use_ui_store() -> UiStore {
    expect_context::<UiStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Mirror engine notifications into the store.
pub fn bind_notifications(bus: &EventBus, store: UiStore) -> Subscription {
    bus.on_all(move |event| match event {
        Event::PresetsChanged { state } => store.presets().set(state.clone()),
        Event::AutoSaveStarted => store.save_status().set(SaveStatus::Saving),
        Event::AutoSaveSucceeded { .. } => store.save_status().set(SaveStatus::Saved),
        Event::AutoSaveFailed { message } => {
            store.save_status().set(SaveStatus::Error(message.clone()));
            store.notice().set(Some(format!("Save failed: {message}")));
        }
        Event::LoadFailed { message } => store.notice().set(Some(message.clone())),
        Event::TierListLoaded { .. } => store.save_status().set(SaveStatus::Idle),
        _ => {}
    })
}

pub fn store_dismiss_notice(store: &UiStore) {
    store.notice().set(None);
}
