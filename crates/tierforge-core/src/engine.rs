//! Tier Engine
//!
//! Orchestrator: builds nothing global, receives every collaborator
//! explicitly, turns intent events (game/sheet/preset switches, sharing)
//! into backend calls and feeds the results back through the bus.
//!
//! Network failures never reach the reducer. They are logged and reported
//! as [`Event::LoadFailed`].
//!
//! Loads are tagged with a generation number. A load that finishes after a
//! newer one started drops its result, so rapid switching cannot leave the
//! board showing a stale list.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::api::{ApiError, ApiResult, PersistenceApi};
use crate::autosave::{AutoSave, DEFAULT_AUTOSAVE_DELAY};
use crate::bus::{EventBus, Subscription};
use crate::event::Event;
use crate::history::DEFAULT_HISTORY_CAP;
use crate::models::{CreateTierList, Game, Preset, PresetState, SheetConfig, TierList, UpdateTierList};
use crate::presets::{next_preset_name, KeyValueStore, PresetRegistry, DEFAULT_NAMESPACE};
use crate::runtime::Runtime;
use crate::state::AppState;
use crate::store::StateManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub autosave_delay: Duration,
    pub history_cap: usize,
    pub preset_namespace: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            history_cap: DEFAULT_HISTORY_CAP,
            preset_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// Bus plus store, handed to every component at creation time
#[derive(Clone, Debug)]
pub struct TierContext {
    pub bus: EventBus,
    pub state: StateManager,
}

impl TierContext {
    pub fn new(history_cap: usize) -> Self {
        let bus = EventBus::new();
        let state = StateManager::new(history_cap);
        // The store lives as long as the context; the handler holds it weakly.
        state.attach(&bus).forget();
        Self { bus, state }
    }

    pub fn emit(&self, event: Event) {
        self.bus.emit(event);
    }

    pub fn get_state(&self) -> Rc<AppState> {
        self.state.get_state()
    }
}

impl Default for TierContext {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

/// What to show first, taken from the page URL
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartupRoute {
    #[default]
    Default,
    Game {
        game_id: String,
        sheet_id: Option<String>,
    },
    Shared {
        share_code: String,
    },
}

impl StartupRoute {
    /// From decoded query pairs: `s=<code>` wins over `game=<id>&sheet=<id>`.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut game_id = None;
        let mut sheet_id = None;
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "s" | "share" => {
                    return StartupRoute::Shared {
                        share_code: value.to_string(),
                    }
                }
                "game" => game_id = Some(value.to_string()),
                "sheet" => sheet_id = Some(value.to_string()),
                _ => {}
            }
        }
        match game_id {
            Some(game_id) => StartupRoute::Game { game_id, sheet_id },
            None => StartupRoute::Default,
        }
    }
}

/// Sheet stand-in for games that declare none
fn whole_game_sheet(game: &Game) -> SheetConfig {
    SheetConfig {
        id: String::new(),
        name: game.name.clone(),
        description: String::new(),
        item_filter: String::new(),
    }
}

fn sheet_filter(sheet_id: &str) -> Option<&str> {
    (!sheet_id.is_empty()).then_some(sheet_id)
}

struct Inner {
    ctx: TierContext,
    api: Rc<dyn PersistenceApi>,
    runtime: Rc<dyn Runtime>,
    presets: PresetRegistry,
    autosave: AutoSave,
    games: RefCell<Vec<Game>>,
    preset_state: RefCell<PresetState>,
    generation: Cell<u64>,
    intents: RefCell<Option<Subscription>>,
}

#[derive(Clone)]
pub struct TierEngine {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for TierEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierEngine")
            .field("games", &self.inner.games.borrow().len())
            .field("presets", &*self.inner.preset_state.borrow())
            .finish_non_exhaustive()
    }
}

impl TierEngine {
    pub fn new(
        ctx: TierContext,
        api: Rc<dyn PersistenceApi>,
        storage: Rc<dyn KeyValueStore>,
        runtime: Rc<dyn Runtime>,
        config: EngineConfig,
    ) -> Self {
        let autosave = AutoSave::new(
            ctx.state.clone(),
            ctx.bus.clone(),
            Rc::clone(&api),
            Rc::clone(&runtime),
            config.autosave_delay,
        );
        Self {
            inner: Rc::new(Inner {
                presets: PresetRegistry::new(storage, config.preset_namespace),
                ctx,
                api,
                runtime,
                autosave,
                games: RefCell::new(Vec::new()),
                preset_state: RefCell::new(PresetState::default()),
                generation: Cell::new(0),
                intents: RefCell::new(None),
            }),
        }
    }

    pub fn context(&self) -> &TierContext {
        &self.inner.ctx
    }

    pub fn autosave(&self) -> &AutoSave {
        &self.inner.autosave
    }

    pub fn games(&self) -> Vec<Game> {
        self.inner.games.borrow().clone()
    }

    pub fn presets(&self) -> PresetState {
        self.inner.preset_state.borrow().clone()
    }

    /// Start auto-save and route intent events to their handlers.
    pub fn start(&self) {
        self.inner.autosave.start();
        let weak = Rc::downgrade(&self.inner);
        let subscription = self.inner.ctx.bus.on_all(move |event| {
            if let Some(inner) = weak.upgrade() {
                TierEngine { inner }.handle_intent(event);
            }
        });
        *self.inner.intents.borrow_mut() = Some(subscription);
    }

    fn handle_intent(&self, event: &Event) {
        match event.clone() {
            Event::GameSwitch { game_id } => {
                self.spawn("switch game", move |e| async move { e.select_game(&game_id, None).await })
            }
            Event::SheetSwitch { sheet_id } => {
                self.spawn("switch sheet", move |e| async move { e.select_sheet(&sheet_id).await })
            }
            Event::PresetSwitch { preset_id } => {
                self.spawn("switch preset", move |e| async move { e.switch_preset(&preset_id).await })
            }
            Event::PresetCreate { name } => {
                self.spawn("create preset", move |e| async move { e.create_preset(name).await })
            }
            Event::PresetRename { preset_id, name } => self.spawn("rename preset", move |e| async move {
                e.rename_preset(&preset_id, &name).await
            }),
            Event::PresetDelete { preset_id } => {
                self.spawn("delete preset", move |e| async move { e.delete_preset(&preset_id).await })
            }
            Event::ShareToggled { is_public } => {
                self.spawn("update sharing", move |e| async move { e.set_public(is_public).await })
            }
            Event::SharedOpened { share_code } => {
                self.spawn("open shared list", move |e| async move { e.open_shared(&share_code).await })
            }
            _ => {}
        }
    }

    fn spawn<F, Fut>(&self, action: &'static str, task: F)
    where
        F: FnOnce(TierEngine) -> Fut,
        Fut: Future<Output = ApiResult<()>> + 'static,
    {
        let future = task(self.clone());
        let this = self.clone();
        self.inner.runtime.spawn_local(Box::pin(async move {
            if let Err(err) = future.await {
                this.report(action, &err);
            }
        }));
    }

    fn report(&self, action: &str, err: &ApiError) {
        tracing::warn!(action, %err, "engine operation failed");
        self.emit(Event::LoadFailed {
            message: format!("{action} failed: {err}"),
        });
    }

    fn emit(&self, event: Event) {
        self.inner.ctx.bus.emit(event);
    }

    fn begin_load(&self) -> u64 {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        generation
    }

    fn superseded(&self, generation: u64) -> bool {
        let stale = self.inner.generation.get() != generation;
        if stale {
            tracing::debug!(generation, "load superseded");
        }
        stale
    }

    /// Current game and sheet id
    fn scope(&self) -> Option<(Rc<Game>, String)> {
        let state = self.inner.ctx.get_state();
        Some((state.game.clone()?, state.sheet.as_ref()?.id.clone()))
    }

    fn publish_presets(&self, state: PresetState) {
        *self.inner.preset_state.borrow_mut() = state.clone();
        self.emit(Event::PresetsChanged { state });
    }

    async fn fetch_game(&self, game_id: &str) -> ApiResult<Game> {
        let cached = self.inner.games.borrow().iter().find(|g| g.id == game_id).cloned();
        match cached {
            Some(game) => Ok(game),
            None => self.inner.api.get_game(game_id).await,
        }
    }

    /// Load the game list, then whatever the route asks for.
    pub async fn bootstrap(&self, route: StartupRoute) -> ApiResult<()> {
        let games = self.inner.api.list_games().await?;
        tracing::info!(count = games.len(), "games loaded");
        let first = games.first().map(|g| g.id.clone());
        *self.inner.games.borrow_mut() = games;

        match route {
            StartupRoute::Shared { share_code } => return self.open_shared(&share_code).await,
            StartupRoute::Game { game_id, sheet_id } => {
                let known = self.inner.games.borrow().iter().any(|g| g.id == game_id);
                if known {
                    return self.select_game(&game_id, sheet_id.as_deref()).await;
                }
                tracing::warn!(%game_id, "unknown game in route, using default");
            }
            StartupRoute::Default => {}
        }

        match first {
            Some(game_id) => self.select_game(&game_id, None).await,
            None => Err(ApiError::NotFound("no games configured".to_string())),
        }
    }

    /// Switch game; picks `sheet_id` when the game has it, else its first sheet.
    pub async fn select_game(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<()> {
        self.inner.autosave.flush();
        let generation = self.begin_load();

        let game = self.fetch_game(game_id).await?;
        if self.superseded(generation) {
            return Ok(());
        }

        let sheet = sheet_id
            .and_then(|id| game.sheet(id))
            .or_else(|| game.sheets.first())
            .cloned()
            .unwrap_or_else(|| whole_game_sheet(&game));
        tracing::info!(game = %game.id, sheet = %sheet.id, "game selected");
        self.emit(Event::GameLoaded { game: game.clone() });
        self.load_sheet(generation, Rc::new(game), sheet).await
    }

    pub async fn select_sheet(&self, sheet_id: &str) -> ApiResult<()> {
        let Some((game, _)) = self.scope() else {
            return Ok(());
        };
        let Some(sheet) = game.sheet(sheet_id).cloned() else {
            return Err(ApiError::NotFound(format!("sheet {sheet_id}")));
        };
        self.inner.autosave.flush();
        let generation = self.begin_load();
        self.load_sheet(generation, game, sheet).await
    }

    async fn load_sheet(&self, generation: u64, game: Rc<Game>, sheet: SheetConfig) -> ApiResult<()> {
        let sheet_id = sheet.id.clone();
        self.emit(Event::SheetSelected { sheet });

        let items = self.inner.api.list_items(&game.id, sheet_filter(&sheet_id)).await?;
        if self.superseded(generation) {
            return Ok(());
        }
        tracing::debug!(count = items.items.len(), "items fetched");
        self.emit(Event::ItemsLoaded { items: items.items });

        self.resolve_for(generation, &game, &sheet_id).await
    }

    /// Re-run preset reconciliation for the current sheet.
    pub async fn resolve_presets(&self) -> ApiResult<()> {
        let Some((game, sheet_id)) = self.scope() else {
            return Ok(());
        };
        let generation = self.begin_load();
        self.resolve_for(generation, &game, &sheet_id).await
    }

    /// Try stored presets, active first. Lists that are gone or belong
    /// elsewhere are pruned; when none survives a fresh one is created.
    async fn resolve_for(&self, generation: u64, game: &Game, sheet_id: &str) -> ApiResult<()> {
        let stored = self.inner.presets.load(&game.id, sheet_id);
        let mut candidates: Vec<String> = stored.active_id.iter().cloned().collect();
        candidates.extend(
            stored
                .presets
                .iter()
                .map(|p| p.id.clone())
                .filter(|id| stored.active_id.as_ref() != Some(id)),
        );

        for id in candidates {
            match self.inner.api.get_tier_list(&id).await {
                Ok(tier_list) if tier_list.game_id == game.id && tier_list.sheet_id == sheet_id => {
                    if self.superseded(generation) {
                        return Ok(());
                    }
                    let state = self.inner.presets.set_active(&game.id, sheet_id, &id);
                    self.load_list(tier_list);
                    self.publish_presets(state);
                    return Ok(());
                }
                Ok(tier_list) => {
                    tracing::warn!(%id, game = %tier_list.game_id, sheet = %tier_list.sheet_id, "pruning preset of another sheet");
                    self.inner.presets.remove(&game.id, sheet_id, &id);
                }
                Err(err) if err.is_not_found() => {
                    tracing::info!(%id, "pruning preset whose tier list is gone");
                    self.inner.presets.remove(&game.id, sheet_id, &id);
                }
                Err(err) => return Err(err),
            }
        }

        if self.superseded(generation) {
            return Ok(());
        }
        self.create_and_load(generation, game, sheet_id, None).await
    }

    async fn create_and_load(&self, generation: u64, game: &Game, sheet_id: &str, name: Option<String>) -> ApiResult<()> {
        let stored = self.inner.presets.load(&game.id, sheet_id);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| next_preset_name(&stored));

        let tier_list = self
            .inner
            .api
            .create_tier_list(CreateTierList {
                game_id: game.id.clone(),
                sheet_id: sheet_id.to_string(),
                name: name.clone(),
                tiers: Some(game.initial_tiers()),
            })
            .await?;
        tracing::info!(id = %tier_list.id, %name, "preset created");

        // Register even when superseded so the list is not orphaned.
        let preset = Preset {
            id: tier_list.id.clone(),
            name,
        };
        let superseded = self.superseded(generation);
        let state = self.inner.presets.add(&game.id, sheet_id, preset, !superseded);
        if superseded {
            return Ok(());
        }
        self.load_list(tier_list);
        self.publish_presets(state);
        Ok(())
    }

    fn load_list(&self, tier_list: TierList) {
        tracing::debug!(id = %tier_list.id, "tier list loaded");
        self.emit(Event::TierListLoaded { tier_list });
    }

    pub async fn switch_preset(&self, preset_id: &str) -> ApiResult<()> {
        let Some((game, sheet_id)) = self.scope() else {
            return Ok(());
        };
        let state = self.inner.ctx.get_state();
        if !state.read_only && state.tier_list.as_ref().is_some_and(|tl| tl.id == preset_id) {
            return Ok(());
        }

        self.inner.autosave.flush();
        let generation = self.begin_load();
        match self.inner.api.get_tier_list(preset_id).await {
            Ok(tier_list) if tier_list.game_id == game.id && tier_list.sheet_id == sheet_id => {
                if self.superseded(generation) {
                    return Ok(());
                }
                let state = self.inner.presets.set_active(&game.id, &sheet_id, preset_id);
                self.load_list(tier_list);
                self.publish_presets(state);
                Ok(())
            }
            Ok(_) => {
                let state = self.inner.presets.remove(&game.id, &sheet_id, preset_id);
                self.publish_presets(state);
                self.resolve_for(generation, &game, &sheet_id).await
            }
            Err(err) if err.is_not_found() => {
                let state = self.inner.presets.remove(&game.id, &sheet_id, preset_id);
                self.publish_presets(state);
                self.resolve_for(generation, &game, &sheet_id).await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn create_preset(&self, name: Option<String>) -> ApiResult<()> {
        let Some((game, sheet_id)) = self.scope() else {
            return Ok(());
        };
        self.inner.autosave.flush();
        let generation = self.begin_load();
        self.create_and_load(generation, &game, &sheet_id, name).await
    }

    /// Rename locally right away, then on the server.
    pub async fn rename_preset(&self, preset_id: &str, name: &str) -> ApiResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("preset name must not be empty".to_string()));
        }
        let Some((game, sheet_id)) = self.scope() else {
            return Ok(());
        };
        let state = self.inner.presets.rename(&game.id, &sheet_id, preset_id, name);
        self.publish_presets(state);
        self.inner
            .api
            .update_tier_list(preset_id, UpdateTierList::name(name))
            .await
            .map(|_| ())
    }

    /// Delete on the server and forget it; deleting the active preset moves
    /// to the next one (or a fresh one).
    pub async fn delete_preset(&self, preset_id: &str) -> ApiResult<()> {
        let Some((game, sheet_id)) = self.scope() else {
            return Ok(());
        };
        let was_active = self
            .inner
            .ctx
            .get_state()
            .tier_list
            .as_ref()
            .is_some_and(|tl| tl.id == preset_id);
        if was_active {
            // Nothing left worth saving in a list that is about to go.
            self.inner.autosave.cancel();
        }

        match self.inner.api.delete_tier_list(preset_id).await {
            Ok(()) => tracing::info!(%preset_id, "preset deleted"),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let state = self.inner.presets.remove(&game.id, &sheet_id, preset_id);
        self.publish_presets(state);
        if was_active {
            let generation = self.begin_load();
            return self.resolve_for(generation, &game, &sheet_id).await;
        }
        Ok(())
    }

    pub async fn set_public(&self, is_public: bool) -> ApiResult<()> {
        let state = self.inner.ctx.get_state();
        if state.read_only {
            return Ok(());
        }
        let Some(id) = state.tier_list.as_ref().map(|tl| tl.id.clone()) else {
            return Ok(());
        };
        let updated = self
            .inner
            .api
            .update_tier_list(&id, UpdateTierList::is_public(is_public))
            .await?;
        self.emit(Event::ShareUpdated {
            is_public: updated.is_public,
            share_code: updated.share_code,
        });
        Ok(())
    }

    /// Show someone else's list read-only. It is not registered as a preset.
    pub async fn open_shared(&self, share_code: &str) -> ApiResult<()> {
        self.inner.autosave.flush();
        let generation = self.begin_load();

        let tier_list = self.inner.api.get_shared_tier_list(share_code).await?;
        let game = self.fetch_game(&tier_list.game_id).await?;
        if self.superseded(generation) {
            return Ok(());
        }

        let sheet = game
            .sheet(&tier_list.sheet_id)
            .cloned()
            .unwrap_or_else(|| SheetConfig {
                id: tier_list.sheet_id.clone(),
                ..whole_game_sheet(&game)
            });
        self.emit(Event::GameLoaded { game: game.clone() });
        self.emit(Event::SheetSelected { sheet });

        let items = self
            .inner
            .api
            .list_items(&game.id, sheet_filter(&tier_list.sheet_id))
            .await?;
        if self.superseded(generation) {
            return Ok(());
        }
        tracing::info!(%share_code, id = %tier_list.id, "shared tier list opened");
        self.emit(Event::ItemsLoaded { items: items.items });
        self.load_list(tier_list);
        self.emit(Event::ReadOnlyChanged { read_only: true });
        self.publish_presets(PresetState::default());
        Ok(())
    }
}
