//! Preset Registry
//!
//! Remembers which server tier lists belong to a (game, sheet) pair and
//! which one is active. Lives in client storage so it works while the
//! backend is unreachable; the engine reconciles it against the server.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Preset, PresetState};

pub const DEFAULT_NAMESPACE: &str = "tierforge.presets";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage error: {0}")]
    Other(String),
}

/// String key/value storage (`localStorage` in the browser)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct PresetRegistry {
    store: Rc<dyn KeyValueStore>,
    namespace: String,
}

impl std::fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PresetRegistry {
    pub fn new(store: Rc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, game_id: &str, sheet_id: &str) -> String {
        format!("{}.{}.{}", self.namespace, game_id, sheet_id)
    }

    /// Read the stored state, dropping anything malformed. A healed value
    /// is written back.
    pub fn load(&self, game_id: &str, sheet_id: &str) -> PresetState {
        let key = self.key(game_id, sheet_id);
        let Some(raw) = self.store.get(&key) else {
            return PresetState::default();
        };

        let state = heal(&raw);
        let healed = serde_json::to_string(&state).unwrap_or_default();
        if healed != raw {
            tracing::debug!(%key, "preset registry entry healed");
            self.write(&key, &healed);
        }
        state
    }

    pub fn save(&self, game_id: &str, sheet_id: &str, state: &PresetState) {
        let key = self.key(game_id, sheet_id);
        match serde_json::to_string(state) {
            Ok(json) => self.write(&key, &json),
            Err(err) => tracing::warn!(%key, %err, "failed to serialize presets"),
        }
    }

    /// Register a preset. Re-adding a known id only updates its name.
    pub fn add(&self, game_id: &str, sheet_id: &str, preset: Preset, make_active: bool) -> PresetState {
        self.update(game_id, sheet_id, |state| {
            if make_active {
                state.active_id = Some(preset.id.clone());
            }
            match state.presets.iter_mut().find(|p| p.id == preset.id) {
                Some(existing) => existing.name = preset.name,
                None => state.presets.push(preset),
            }
        })
    }

    /// Drop a preset; the first remaining one becomes active if needed.
    pub fn remove(&self, game_id: &str, sheet_id: &str, preset_id: &str) -> PresetState {
        self.update(game_id, sheet_id, |state| {
            state.presets.retain(|p| p.id != preset_id);
        })
    }

    pub fn rename(&self, game_id: &str, sheet_id: &str, preset_id: &str, name: &str) -> PresetState {
        self.update(game_id, sheet_id, |state| {
            if let Some(preset) = state.presets.iter_mut().find(|p| p.id == preset_id) {
                preset.name = name.to_string();
            }
        })
    }

    /// Unknown ids are ignored.
    pub fn set_active(&self, game_id: &str, sheet_id: &str, preset_id: &str) -> PresetState {
        self.update(game_id, sheet_id, |state| {
            if state.contains(preset_id) {
                state.active_id = Some(preset_id.to_string());
            }
        })
    }

    fn update(&self, game_id: &str, sheet_id: &str, change: impl FnOnce(&mut PresetState)) -> PresetState {
        let mut state = self.load(game_id, sheet_id);
        change(&mut state);
        fix_active(&mut state);
        self.save(game_id, sheet_id, &state);
        state
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            tracing::warn!(%key, %err, "failed to persist presets");
        }
    }
}

/// `"Preset N"` with the lowest N >= 1 not already taken.
pub fn next_preset_name(state: &PresetState) -> String {
    let taken: HashSet<u32> = state
        .presets
        .iter()
        .filter_map(|p| p.name.strip_prefix("Preset ")?.parse().ok())
        .collect();
    let n = (1..).find(|n| !taken.contains(n)).unwrap_or(1);
    format!("Preset {n}")
}

fn heal(raw: &str) -> PresetState {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "discarding corrupt preset registry entry");
            return PresetState::default();
        }
    };

    let mut seen = HashSet::new();
    let presets: Vec<Preset> = value
        .get("presets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let id = entry.get("id")?.as_str().filter(|id| !id.is_empty())?;
            let name = entry.get("name").and_then(Value::as_str).unwrap_or(id);
            Some(Preset {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .filter(|p| seen.insert(p.id.clone()))
        .collect();

    let mut state = PresetState {
        active_id: value.get("activeId").and_then(Value::as_str).map(str::to_string),
        presets,
    };
    fix_active(&mut state);
    state
}

fn fix_active(state: &mut PresetState) {
    let valid = state
        .active_id
        .as_deref()
        .is_some_and(|id| state.contains(id));
    if !valid {
        state.active_id = state.presets.first().map(|p| p.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Rc<MemoryStore>, PresetRegistry) {
        let store = Rc::new(MemoryStore::new());
        let registry = PresetRegistry::new(store.clone(), DEFAULT_NAMESPACE);
        (store, registry)
    }

    fn preset(id: &str, name: &str) -> Preset {
        Preset {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_key_scheme() {
        let (_, registry) = registry();
        assert_eq!(registry.key("dos2", "skills"), "tierforge.presets.dos2.skills");
    }

    #[test]
    fn test_add_remove_cycle() {
        let (_, registry) = registry();
        assert_eq!(registry.load("g", "s"), PresetState::default());

        registry.add("g", "s", preset("a", "Preset 1"), true);
        let state = registry.add("g", "s", preset("b", "Preset 2"), false);
        assert_eq!(state.active_id.as_deref(), Some("a"));
        assert_eq!(state.presets.len(), 2);

        let state = registry.remove("g", "s", "a");
        assert_eq!(state.active_id.as_deref(), Some("b"));

        let state = registry.remove("g", "s", "b");
        assert_eq!(state, PresetState::default());

        // Other sheets are untouched
        assert!(registry.load("g", "other").presets.is_empty());
    }

    #[test]
    fn test_rename_and_set_active() {
        let (_, registry) = registry();
        registry.add("g", "s", preset("a", "Preset 1"), true);
        registry.add("g", "s", preset("b", "Preset 2"), false);

        let state = registry.rename("g", "s", "b", "Meta build");
        assert_eq!(state.presets[1].name, "Meta build");

        let state = registry.set_active("g", "s", "b");
        assert_eq!(state.active().unwrap().name, "Meta build");

        let state = registry.set_active("g", "s", "missing");
        assert_eq!(state.active_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_load_heals_corrupt_entries() {
        let (store, registry) = registry();
        let key = registry.key("g", "s");

        store.set(&key, "{{{ not json").unwrap();
        assert_eq!(registry.load("g", "s"), PresetState::default());

        store
            .set(
                &key,
                r#"{"activeId":"gone","presets":[{"id":"a","name":"One"},{"id":""},{"name":"x"},{"id":"a","name":"Dup"},{"id":"b"},7]}"#,
            )
            .unwrap();
        let state = registry.load("g", "s");
        assert_eq!(state.presets, vec![preset("a", "One"), preset("b", "b")]);
        assert_eq!(state.active_id.as_deref(), Some("a"));

        // The healed value was written back
        let stored: PresetState = serde_json::from_str(&store.get(&key).unwrap()).unwrap();
        assert_eq!(stored, state);
    }

    #[test]
    fn test_next_preset_name_fills_gaps() {
        let mut state = PresetState::default();
        assert_eq!(next_preset_name(&state), "Preset 1");

        state.presets = vec![preset("a", "Preset 1"), preset("b", "Preset 3"), preset("c", "Custom")];
        assert_eq!(next_preset_name(&state), "Preset 2");

        state.presets.push(preset("d", "Preset 2"));
        assert_eq!(next_preset_name(&state), "Preset 4");
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn test_write_failures_are_not_fatal() {
        let registry = PresetRegistry::new(Rc::new(FailingStore), DEFAULT_NAMESPACE);
        let state = registry.add("g", "s", preset("a", "Preset 1"), true);
        assert_eq!(state.active_id.as_deref(), Some("a"));
    }
}
