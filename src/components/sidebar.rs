//! Sidebar Component
//!
//! Search, game filters, progress and the pool of unranked items.

use leptos::prelude::*;
use tierforge_core::view_model::BoardView;
use tierforge_core::{Container, Event, FilterConfig, FilterKind};

use super::CardList;
use crate::context::{use_engine, use_state_slice};

/// Values of a filter after clicking `option`
fn toggle_value(kind: FilterKind, current: &[String], option: &str) -> Vec<String> {
    match kind {
        FilterKind::Toggle => {
            if current.iter().any(|v| v == "true") {
                Vec::new()
            } else {
                vec!["true".to_string()]
            }
        }
        FilterKind::Select => {
            if current.len() == 1 && current[0] == option {
                Vec::new()
            } else {
                vec![option.to_string()]
            }
        }
        FilterKind::Multiselect => {
            let mut next: Vec<String> = current.iter().filter(|v| *v != option).cloned().collect();
            if next.len() == current.len() {
                next.push(option.to_string());
            }
            next
        }
    }
}

#[component]
fn FilterGroup(filter: FilterConfig) -> impl IntoView {
    let engine = use_engine();
    let filter_id = filter.id.clone();
    let selected = use_state_slice(move |s| s.filters.get(&filter_id).cloned().unwrap_or_default());
    let kind = filter.kind;

    let emit_toggle = {
        let filter_id = filter.id.clone();
        move |option: &str| {
            let values = selected.with_untracked(|current| toggle_value(kind, current, option));
            engine.emit(Event::FilterChanged {
                filter_id: filter_id.clone(),
                values,
            });
        }
    };

    let body = if kind == FilterKind::Toggle {
        let emit_toggle = emit_toggle.clone();
        view! {
            <label class="filter-toggle">
                <input
                    type="checkbox"
                    prop:checked=move || selected.with(|v| v.iter().any(|v| v == "true"))
                    on:change=move |_| emit_toggle("true")
                />
                {filter.name.clone()}
            </label>
        }
        .into_any()
    } else {
        let icons = filter.icon_map.clone().unwrap_or_default();
        view! {
            <div class="filter-name">{filter.name.clone()}</div>
            <div class="filter-options">
                {filter
                    .options
                    .iter()
                    .map(|option| {
                        let value = option.clone();
                        let is_on = {
                            let value = value.clone();
                            move || selected.with(|v| v.contains(&value))
                        };
                        let emit_toggle = emit_toggle.clone();
                        let icon = icons.get(option).cloned();
                        view! {
                            <button
                                class=move || if is_on() { "filter-chip active" } else { "filter-chip" }
                                on:click=move |_| emit_toggle(&value)
                            >
                                {icon.map(|src| view! { <img class="filter-icon" src=src alt="" /> })}
                                {option.clone()}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
        }
        .into_any()
    };

    view! { <div class="filter-group">{body}</div> }
}

#[component]
pub fn Sidebar(board: ReadSignal<BoardView>) -> impl IntoView {
    let engine = use_engine();
    let search = use_state_slice(|s| s.search.clone());
    let filters = use_state_slice(|s| s.game.as_ref().map(|g| g.filters.clone()).unwrap_or_default());
    let any_filter = use_state_slice(|s| s.filters.values().any(|v| !v.is_empty()));
    let read_only = Memo::new(move |_| board.with(|b| b.read_only));
    let unranked = Signal::derive(move || board.with(|b| b.unranked.clone()));

    view! {
        <aside class="sidebar">
            <input
                class="search-input"
                type="search"
                placeholder="Search items…"
                prop:value=move || search.get()
                on:input=move |ev| engine.emit(Event::SearchChanged {
                    query: event_target_value(&ev),
                })
            />

            <div class="filters">
                <For
                    each=move || filters.get()
                    key=|f| f.id.clone()
                    children=move |filter| view! { <FilterGroup filter=filter /> }
                />
                <Show when=move || any_filter.get()>
                    <button class="clear-filters-btn" on:click=move |_| engine.emit(Event::FiltersCleared)>
                        "Clear filters"
                    </button>
                </Show>
            </div>

            <div class="progress">
                {move || board.with(|b| format!("{} / {} ranked", b.ranked_count, b.total_count))}
            </div>

            <CardList
                container=Container::Unranked
                cards=unranked
                read_only=read_only
                class="unranked-pool"
            />
            <Show when=move || unranked.with(Vec::is_empty)>
                <div class="pool-empty">"No unranked items"</div>
            </Show>
        </aside>
    }
}
