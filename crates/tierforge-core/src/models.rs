//! Data Models
//!
//! Wire types shared by the frontend and the backend. Field names match the
//! JSON contract of the persistence API.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ItemId = String;
pub type TierId = String;
pub type GameId = String;
pub type SheetId = String;

/// Reserved container name for the "not yet placed" pool.
pub const UNRANKED: &str = "unranked";

/// A rankable game item (skill, spell, talent...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub game_id: GameId,
    #[serde(default)]
    pub sheet_id: SheetId,
    pub name: String,
    /// Localized display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ru: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
    /// Game-specific attributes (cost, school, level...)
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            game_id: String::new(),
            sheet_id: String::new(),
            name: name.into(),
            name_ru: None,
            icon: String::new(),
            category: String::new(),
            data: Map::new(),
        }
    }

    /// Field lookup used by filters: `category` is a top-level field,
    /// everything else lives in `data`.
    pub fn field(&self, field: &str) -> Option<Value> {
        match field {
            "category" => Some(Value::String(self.category.clone())),
            "name" => Some(Value::String(self.name.clone())),
            _ => self.data.get(field).cloned(),
        }
    }
}

/// A named, colored, ordered bucket of item ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    pub color: String,
    pub order: i32,
    /// Item ids in display order
    #[serde(default)]
    pub items: Vec<ItemId>,
}

impl Tier {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            order,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|id| id.to_string()).collect();
        self
    }
}

/// A user's tier list (server owned, client keeps a working copy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierList {
    pub id: String,
    pub game_id: GameId,
    pub sheet_id: SheetId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub share_code: String,
    #[serde(default)]
    pub is_public: bool,
    /// RFC 3339 timestamps
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl TierList {
    pub fn new(id: impl Into<String>, game_id: impl Into<String>, sheet_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            game_id: game_id.into(),
            sheet_id: sheet_id.into(),
            name: name.into(),
            author_id: None,
            tiers: Vec::new(),
            share_code: String::new(),
            is_public: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn tier(&self, tier_id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == tier_id)
    }

    /// Count of ranked item ids across all tiers
    pub fn ranked_count(&self) -> usize {
        self.tiers.iter().map(|t| t.items.len()).sum()
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierListSummary {
    pub id: String,
    pub game_id: GameId,
    pub sheet_id: SheetId,
    pub name: String,
    pub share_code: String,
    pub item_count: usize,
    pub updated_at: String,
}

/// Filter widget kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Select,
    Multiselect,
    Toggle,
}

/// A filter option for items, declared by the game config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub id: String,
    pub name: String,
    /// Field in `Item::data` (or `category`) to filter by
    pub field: String,
    #[serde(rename = "type", default)]
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_map: Option<HashMap<String, String>>,
}

/// A sheet (sub-tierlist) within a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub id: SheetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub item_filter: String,
}

/// Default tier setup declared by a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub id: TierId,
    pub name: String,
    pub color: String,
    pub order: i32,
}

impl From<&TierConfig> for Tier {
    fn from(config: &TierConfig) -> Self {
        Tier::new(config.id.clone(), config.name.clone(), config.color.clone(), config.order)
    }
}

/// Standard S-F tier configuration
pub fn default_tiers() -> Vec<TierConfig> {
    [
        ("s", "S", "#ff7f7f"),
        ("a", "A", "#ffbf7f"),
        ("b", "B", "#ffff7f"),
        ("c", "C", "#7fff7f"),
        ("d", "D", "#7fbfff"),
        ("f", "F", "#ff7fff"),
    ]
    .iter()
    .enumerate()
    .map(|(order, (id, name, color))| TierConfig {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        order: order as i32,
    })
    .collect()
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub item_schema: Value,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub default_tiers: Vec<TierConfig>,
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
    #[serde(default)]
    pub created_at: String,
}

impl Game {
    pub fn sheet(&self, sheet_id: &str) -> Option<&SheetConfig> {
        self.sheets.iter().find(|s| s.id == sheet_id)
    }

    pub fn filter(&self, filter_id: &str) -> Option<&FilterConfig> {
        self.filters.iter().find(|f| f.id == filter_id)
    }

    /// Tiers for a fresh tier list: the game's own defaults, or S-F.
    pub fn initial_tiers(&self) -> Vec<Tier> {
        if self.default_tiers.is_empty() {
            default_tiers().iter().map(Tier::from).collect()
        } else {
            self.default_tiers.iter().map(Tier::from).collect()
        }
    }
}

/// Response of the bulk item load
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemList {
    pub items: Vec<Item>,
    pub total_count: usize,
}

/// Body of tier list creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTierList {
    pub game_id: GameId,
    pub sheet_id: SheetId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<Tier>>,
}

/// Body of a partial tier list update: only supplied fields change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateTierList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<Tier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateTierList {
    pub fn tiers(tiers: Vec<Tier>) -> Self {
        Self { tiers: Some(tiers), ..Default::default() }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn is_public(is_public: bool) -> Self {
        Self { is_public: Some(is_public), ..Default::default() }
    }
}

/// A saved tier list the user can switch between
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Server tier list id
    pub id: String,
    pub name: String,
}

/// Presets for one (game, sheet) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresetState {
    #[serde(rename = "activeId")]
    pub active_id: Option<String>,
    pub presets: Vec<Preset>,
}

impl PresetState {
    pub fn active(&self) -> Option<&Preset> {
        let id = self.active_id.as_deref()?;
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.presets.iter().any(|p| p.id == id)
    }
}

/// Where an item lives: a tier, or the unranked pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Container {
    Unranked,
    Tier(TierId),
}

impl Container {
    pub fn tier(id: impl Into<String>) -> Self {
        Container::Tier(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Container::Unranked => UNRANKED,
            Container::Tier(id) => id,
        }
    }
}

impl From<String> for Container {
    fn from(value: String) -> Self {
        if value == UNRANKED {
            Container::Unranked
        } else {
            Container::Tier(value)
        }
    }
}

impl From<&str> for Container {
    fn from(value: &str) -> Self {
        Container::from(value.to_string())
    }
}

impl From<Container> for String {
    fn from(value: Container) -> Self {
        match value {
            Container::Unranked => UNRANKED.to_string(),
            Container::Tier(id) => id,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items of the current sheet in load order, indexed by id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemMap {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl ItemMap {
    /// Build from a bulk load. Later duplicates of an id are dropped.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut map = ItemMap::default();
        for item in items {
            if map.index.contains_key(&item.id) {
                continue;
            }
            map.index.insert(item.id.clone(), map.items.len());
            map.items.push(item);
        }
        map
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter().map(|item| &item.id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_serialization() {
        let json = serde_json::to_string(&Container::Unranked).unwrap();
        assert_eq!(json, "\"unranked\"");
        let json = serde_json::to_string(&Container::tier("s")).unwrap();
        assert_eq!(json, "\"s\"");

        let parsed: Container = serde_json::from_str("\"unranked\"").unwrap();
        assert_eq!(parsed, Container::Unranked);
        let parsed: Container = serde_json::from_str("\"a\"").unwrap();
        assert_eq!(parsed, Container::tier("a"));
    }

    #[test]
    fn test_item_map_keeps_load_order_and_drops_duplicates() {
        let map = ItemMap::from_items(vec![
            Item::new("b", "Bravo"),
            Item::new("a", "Alpha"),
            Item::new("b", "Bravo again"),
        ]);
        let ids: Vec<&str> = map.ids().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(map.get("b").unwrap().name, "Bravo");
        assert!(!map.contains("c"));
    }

    #[test]
    fn test_update_body_only_serializes_supplied_fields() {
        let body = UpdateTierList::name("Mine");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Mine" }));
    }

    #[test]
    fn test_preset_state_uses_active_id_key() {
        let state: PresetState = serde_json::from_str(
            r#"{"activeId":"x","presets":[{"id":"x","name":"Preset 1"}]}"#,
        )
        .unwrap();
        assert_eq!(state.active().unwrap().name, "Preset 1");
    }

    #[test]
    fn test_game_initial_tiers_fall_back_to_defaults() {
        let game: Game = serde_json::from_str(r#"{"id":"g","name":"Game"}"#).unwrap();
        let tiers = game.initial_tiers();
        assert_eq!(tiers.len(), 6);
        assert_eq!(tiers[0].name, "S");
        assert_eq!(tiers[5].order, 5);
    }

    #[test]
    fn test_item_deserializes_with_missing_optional_fields() {
        let item: Item = serde_json::from_str(
            r#"{"id":"fireball","game_id":"dos2","name":"Fireball","data":{"school":"Pyro","cost":2}}"#,
        )
        .unwrap();
        assert_eq!(item.field("school"), Some(Value::String("Pyro".into())));
        assert_eq!(item.field("category"), Some(Value::String(String::new())));
        assert!(item.name_ru.is_none());
    }
}
