//! Client storage for presets
//!
//! `window.localStorage` when the browser allows it, an in-memory map
//! otherwise (private mode, storage disabled).

use std::rc::Rc;

use tierforge_core::{KeyValueStore, MemoryStore, StorageError};
use wasm_bindgen::JsValue;

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

/// Open the best available store.
pub fn open() -> Rc<dyn KeyValueStore> {
    match LocalStorage::open() {
        Some(store) => Rc::new(store),
        None => {
            tracing::warn!("localStorage unavailable, presets will not survive a reload");
            Rc::new(MemoryStore::new())
        }
    }
}

fn storage_error(err: JsValue) -> StorageError {
    let name = js_sys::Reflect::get(&err, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string());
    match name.as_deref() {
        Some("QuotaExceededError") => StorageError::QuotaExceeded,
        Some("SecurityError") => StorageError::Unavailable,
        _ => StorageError::Other(format!("{err:?}")),
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(storage_error)
    }
}
