//! TierForge core
//!
//! Toolkit-independent client state for a tier-list editor: the event bus,
//! the reducer with bounded undo history, drag sessions, keyed list
//! reconciliation, debounced auto-save and the engine that reconciles
//! client-side presets with the backend.
//!
//! Everything here is single threaded (`Rc`, `RefCell`, `!Send` futures)
//! and free of browser APIs. The UI crate supplies the [`Runtime`],
//! [`PersistenceApi`] and [`KeyValueStore`] implementations.

pub mod api;
pub mod autosave;
pub mod bus;
pub mod drag;
pub mod engine;
pub mod event;
pub mod history;
pub mod layout;
pub mod models;
pub mod payload;
pub mod presets;
pub mod reconcile;
pub mod runtime;
pub mod state;
pub mod store;
pub mod view_model;

pub use api::{ApiError, ApiResult, PersistenceApi};
pub use autosave::{AutoSave, SaveStatus};
pub use bus::{EventBus, Subscription};
pub use drag::{DragPhase, DragSession, DragSource, DropTarget};
pub use engine::{EngineConfig, StartupRoute, TierContext, TierEngine};
pub use event::{Event, EventKind};
pub use models::*;
pub use presets::{KeyValueStore, MemoryStore, PresetRegistry, StorageError};
pub use runtime::{ManualRuntime, Runtime, TimerHandle};
pub use state::{reduce, AppState};
pub use store::{StateManager, SubscribeOptions};
