//! View Model
//!
//! Pure derivations from [`AppState`] for the view layer: which cards are
//! visible, dimmed or selected, and what the tooltip shows.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{Container, FilterConfig, FilterKind, Item, ItemId, TierId};
use crate::state::AppState;

/// One card as rendered
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub item: Item,
    pub container: Container,
    /// Position inside `container`
    pub index: usize,
    pub selected: bool,
    /// Ranked card that does not match the active filters
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierView {
    pub id: TierId,
    pub name: String,
    pub color: String,
    pub order: i32,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardView {
    pub tiers: Vec<TierView>,
    /// Unranked cards that pass the filters
    pub unranked: Vec<CardView>,
    pub ranked_count: usize,
    pub total_count: usize,
    pub read_only: bool,
}

impl BoardView {
    pub fn tier(&self, id: &str) -> Option<&TierView> {
        self.tiers.iter().find(|t| t.id == id)
    }
}

/// Whether `item` passes every active filter and the search query.
/// Filters are AND-ed across ids and OR-ed within one filter's values.
pub fn item_matches(
    item: &Item,
    filters: &BTreeMap<String, Vec<String>>,
    game_filters: &[FilterConfig],
    search: &str,
) -> bool {
    let query = search.trim().to_lowercase();
    if !query.is_empty() {
        let in_name = item.name.to_lowercase().contains(&query);
        let in_localized = item
            .name_ru
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&query));
        if !in_name && !in_localized {
            return false;
        }
    }

    filters
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .all(|(filter_id, values)| {
            let config = game_filters.iter().find(|f| &f.id == filter_id);
            let field = config.map(|f| f.field.as_str()).unwrap_or(filter_id.as_str());
            let kind = config.map(|f| f.kind).unwrap_or_default();
            field_matches(item.field(field).as_ref(), kind, values)
        })
}

fn field_matches(value: Option<&Value>, kind: FilterKind, wanted: &[String]) -> bool {
    let Some(value) = value else {
        return false;
    };
    if kind == FilterKind::Toggle {
        let on = wanted.iter().any(|w| w == "true");
        return !on || truthy(value);
    }
    match value {
        Value::Array(values) => values.iter().any(|v| scalar_matches(v, wanted)),
        other => scalar_matches(other, wanted),
    }
}

fn scalar_matches(value: &Value, wanted: &[String]) -> bool {
    scalar_text(value).is_some_and(|text| wanted.iter().any(|w| *w == text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

/// Derive the whole board. Ids the item map does not know are skipped.
pub fn board_view(state: &AppState) -> BoardView {
    let game_filters: &[FilterConfig] = state.game.as_deref().map(|g| g.filters.as_slice()).unwrap_or(&[]);
    let matches = |item: &Item| item_matches(item, &state.filters, game_filters, &state.search);

    let card = |id: &ItemId, container: &Container, index: usize| {
        state.items.get(id).map(|item| CardView {
            item: item.clone(),
            container: container.clone(),
            index,
            selected: state.selection.contains(id),
            dimmed: !matches(item),
        })
    };

    let tiers: Vec<TierView> = state
        .tiers()
        .iter()
        .map(|tier| {
            let container = Container::tier(tier.id.clone());
            TierView {
                id: tier.id.clone(),
                name: tier.name.clone(),
                color: tier.color.clone(),
                order: tier.order,
                cards: tier
                    .items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, id)| card(id, &container, i))
                    .collect(),
            }
        })
        .collect();

    let unranked: Vec<CardView> = state
        .unranked
        .iter()
        .enumerate()
        .filter_map(|(i, id)| card(id, &Container::Unranked, i))
        .filter(|c| !c.dimmed)
        .collect();

    let ranked_count = tiers.iter().map(|t| t.cards.len()).sum();
    BoardView {
        tiers,
        unranked,
        ranked_count,
        total_count: state.items.len(),
        read_only: state.read_only,
    }
}

/// Label/value rows for an item's tooltip
pub fn tooltip_rows(item: &Item, game_filters: &[FilterConfig]) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    if !item.category.is_empty() {
        rows.push(("Category".to_string(), item.category.clone()));
    }
    for (key, value) in &item.data {
        let Some(text) = display_value(value) else {
            continue;
        };
        let label = game_filters
            .iter()
            .find(|f| &f.field == key)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| humanize(key));
        rows.push((label, text));
    }
    rows
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(display_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(_) => None,
        other => scalar_text(other).filter(|s| !s.is_empty()),
    }
}

/// Container position for a drop measured over the rendered cards.
///
/// `visible_index` counts `visible` ids with the `moving` ones left out;
/// the result indexes `container` with the moving ids removed, which is
/// what the move events expect. Filtered-out items between cards keep
/// their place.
pub fn drop_position(container: &[ItemId], visible: &[ItemId], moving: &[ItemId], visible_index: usize) -> usize {
    let rest: Vec<&ItemId> = container.iter().filter(|id| !moving.contains(id)).collect();
    let shown: Vec<&ItemId> = visible.iter().filter(|id| !moving.contains(id)).collect();
    let position_of = |id: &ItemId| rest.iter().position(|r| *r == id);

    match shown.get(visible_index) {
        Some(anchor) => position_of(*anchor).unwrap_or(rest.len()),
        None => shown
            .last()
            .and_then(|last| position_of(*last))
            .map_or(rest.len(), |i| i + 1),
    }
}

fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
