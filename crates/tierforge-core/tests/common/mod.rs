#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::future::{poll_fn, Future};
use std::rc::Rc;
use std::task::Poll;

use async_trait::async_trait;
use serde_json::json;
use tierforge_core::{
    ApiError, ApiResult, CreateTierList, EngineConfig, Event, Game, Item, ItemList, ManualRuntime, MemoryStore,
    PersistenceApi, Runtime, TierContext, TierEngine, TierList, TierListSummary, UpdateTierList,
};

/// Holds futures until opened
#[derive(Clone, Default)]
pub struct Gate {
    open: Rc<Cell<bool>>,
}

impl Gate {
    pub fn open(&self) {
        self.open.set(true);
    }

    pub fn wait(&self) -> impl Future<Output = ()> {
        let open = Rc::clone(&self.open);
        poll_fn(move |_| if open.get() { Poll::Ready(()) } else { Poll::Pending })
    }
}

/// In-memory backend
#[derive(Default)]
pub struct MockApi {
    pub games: RefCell<Vec<Game>>,
    pub items: RefCell<Vec<Item>>,
    pub lists: RefCell<BTreeMap<String, TierList>>,
    pub calls: RefCell<Vec<String>>,
    failures: RefCell<HashMap<&'static str, ApiError>>,
    gates: RefCell<HashMap<&'static str, Gate>>,
    next_id: Cell<u32>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two games: `dos2` with two sheets, `bg3` without sheets
    pub fn seeded() -> Self {
        let api = Self::new();
        api.games.borrow_mut().push(dos2());
        api.games.borrow_mut().push(
            serde_json::from_value(json!({ "id": "bg3", "name": "Baldur's Gate 3" })).unwrap(),
        );
        let items = [
            ("i1", "skills", "Fireball", "Pyro"),
            ("i2", "skills", "Ice Lance", "Hydro"),
            ("i3", "skills", "Haste", "Pyro"),
            ("t1", "talents", "Lone Wolf", ""),
            ("t2", "talents", "Glass Cannon", ""),
            ("b1", "", "Eldritch Blast", ""),
        ];
        for (id, sheet, name, school) in items {
            let mut item = Item::new(id, name);
            item.game_id = if sheet.is_empty() { "bg3" } else { "dos2" }.into();
            item.sheet_id = sheet.into();
            if !school.is_empty() {
                item.data.insert("school".into(), json!(school));
            }
            api.items.borrow_mut().push(item);
        }
        api
    }

    /// Every later call of `op` fails with `err`
    pub fn fail(&self, op: &'static str, err: ApiError) {
        self.failures.borrow_mut().insert(op, err);
    }

    pub fn recover(&self, op: &'static str) {
        self.failures.borrow_mut().remove(op);
    }

    /// Calls of `op` wait until the returned gate opens
    pub fn hold(&self, op: &'static str) -> Gate {
        let gate = Gate::default();
        self.gates.borrow_mut().insert(op, gate.clone());
        gate
    }

    pub fn release(&self, op: &'static str) {
        if let Some(gate) = self.gates.borrow_mut().remove(op) {
            gate.open();
        }
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == op).count()
    }

    pub fn insert_list(&self, list: TierList) {
        self.lists.borrow_mut().insert(list.id.clone(), list);
    }

    pub fn list(&self, id: &str) -> Option<TierList> {
        self.lists.borrow().get(id).cloned()
    }

    async fn enter(&self, op: &'static str) -> ApiResult<()> {
        self.calls.borrow_mut().push(op.to_string());
        let gate = self.gates.borrow().get(op).cloned();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        match self.failures.borrow().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::NotFound(format!("{what} not found"))
    }
}

#[async_trait(?Send)]
impl PersistenceApi for MockApi {
    async fn list_games(&self) -> ApiResult<Vec<Game>> {
        self.enter("list_games").await?;
        Ok(self.games.borrow().clone())
    }

    async fn get_game(&self, game_id: &str) -> ApiResult<Game> {
        self.enter("get_game").await?;
        self.games
            .borrow()
            .iter()
            .find(|g| g.id == game_id)
            .cloned()
            .ok_or_else(|| Self::not_found("game"))
    }

    async fn list_items(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<ItemList> {
        self.enter("list_items").await?;
        let items: Vec<Item> = self
            .items
            .borrow()
            .iter()
            .filter(|i| i.game_id == game_id && sheet_id.map_or(true, |s| i.sheet_id == s))
            .cloned()
            .collect();
        Ok(ItemList {
            total_count: items.len(),
            items,
        })
    }

    async fn create_tier_list(&self, body: CreateTierList) -> ApiResult<TierList> {
        self.enter("create_tier_list").await?;
        let game = self
            .games
            .borrow()
            .iter()
            .find(|g| g.id == body.game_id)
            .cloned()
            .ok_or_else(|| Self::not_found("game"))?;
        let n = self.next_id.get() + 1;
        self.next_id.set(n);

        let mut list = TierList::new(format!("tl-{n}"), body.game_id, body.sheet_id, body.name);
        list.tiers = body.tiers.unwrap_or_else(|| game.initial_tiers());
        list.share_code = format!("code-{n}");
        self.insert_list(list.clone());
        Ok(list)
    }

    async fn get_tier_list(&self, id: &str) -> ApiResult<TierList> {
        self.enter("get_tier_list").await?;
        self.list(id).ok_or_else(|| Self::not_found("tier list"))
    }

    async fn update_tier_list(&self, id: &str, body: UpdateTierList) -> ApiResult<TierList> {
        self.enter("update_tier_list").await?;
        let mut lists = self.lists.borrow_mut();
        let list = lists.get_mut(id).ok_or_else(|| Self::not_found("tier list"))?;
        if let Some(name) = body.name {
            list.name = name;
        }
        if let Some(tiers) = body.tiers {
            list.tiers = tiers;
        }
        if let Some(is_public) = body.is_public {
            list.is_public = is_public;
        }
        Ok(list.clone())
    }

    async fn get_shared_tier_list(&self, share_code: &str) -> ApiResult<TierList> {
        self.enter("get_shared_tier_list").await?;
        self.lists
            .borrow()
            .values()
            .find(|l| l.share_code == share_code && l.is_public)
            .cloned()
            .ok_or_else(|| Self::not_found("shared tier list"))
    }

    async fn delete_tier_list(&self, id: &str) -> ApiResult<()> {
        self.enter("delete_tier_list").await?;
        self.lists
            .borrow_mut()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("tier list"))
    }

    async fn list_tier_lists(&self, game_id: &str, sheet_id: Option<&str>) -> ApiResult<Vec<TierListSummary>> {
        self.enter("list_tier_lists").await?;
        Ok(self
            .lists
            .borrow()
            .values()
            .filter(|l| l.game_id == game_id && sheet_id.map_or(true, |s| l.sheet_id == s))
            .map(|l| TierListSummary {
                id: l.id.clone(),
                game_id: l.game_id.clone(),
                sheet_id: l.sheet_id.clone(),
                name: l.name.clone(),
                share_code: l.share_code.clone(),
                item_count: l.ranked_count(),
                updated_at: l.updated_at.clone(),
            })
            .collect())
    }
}

pub fn dos2() -> Game {
    serde_json::from_value(json!({
        "id": "dos2",
        "name": "Divinity: Original Sin 2",
        "filters": [
            { "id": "school", "name": "School", "field": "school", "type": "multiselect", "options": ["Pyro", "Hydro"] }
        ],
        "default_tiers": [
            { "id": "s", "name": "S", "color": "#ff7f7f", "order": 0 },
            { "id": "a", "name": "A", "color": "#ffbf7f", "order": 1 }
        ],
        "sheets": [
            { "id": "skills", "name": "Skills" },
            { "id": "talents", "name": "Talents" }
        ]
    }))
    .unwrap()
}

/// Engine wired to the mock backend, memory storage and a manual clock
pub struct Harness {
    pub api: Rc<MockApi>,
    pub storage: Rc<MemoryStore>,
    pub runtime: ManualRuntime,
    pub engine: TierEngine,
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_api(MockApi::seeded())
    }

    pub fn with_api(api: MockApi) -> Self {
        Self::with_storage(api, MemoryStore::new())
    }

    pub fn with_storage(api: MockApi, storage: MemoryStore) -> Self {
        let api = Rc::new(api);
        let storage = Rc::new(storage);
        let runtime = ManualRuntime::new();
        let config = EngineConfig::default();
        let ctx = TierContext::new(config.history_cap);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        ctx.bus.on_all(move |e| sink.borrow_mut().push(e.clone())).forget();

        let engine = TierEngine::new(
            ctx,
            api.clone(),
            storage.clone(),
            Rc::new(runtime.clone()) as Rc<dyn Runtime>,
            config,
        );
        engine.start();
        Self {
            api,
            storage,
            runtime,
            engine,
            events,
        }
    }

    pub fn ctx(&self) -> &TierContext {
        self.engine.context()
    }

    pub fn state(&self) -> Rc<tierforge_core::AppState> {
        self.ctx().get_state()
    }

    pub fn emit(&self, event: Event) {
        self.ctx().emit(event);
    }

    pub fn settle(&self) {
        self.runtime.run_until_stalled();
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|e| e.kind().name()).collect()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn list_id(&self) -> Option<String> {
        self.state().tier_list.as_ref().map(|tl| tl.id.clone())
    }
}

pub fn moved(item: &str, to: &str, position: usize) -> Event {
    Event::ItemMoved {
        item_id: item.into(),
        from_tier: None,
        to_tier: to.into(),
        position,
    }
}
