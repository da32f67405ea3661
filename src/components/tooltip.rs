//! Tooltip Component
//!
//! Details of the hovered card: localized name and the item's data rows.

use leptos::prelude::*;
use tierforge_core::layout::Rect;
use tierforge_core::view_model::tooltip_rows;
use tierforge_core::Item;

use crate::context::use_state_slice;

/// Gap between card and tooltip, in px
const OFFSET: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Hovered {
    pub item: Item,
    pub rect: Rect,
}

/// Which card the tooltip describes, provided via context
#[derive(Clone, Copy)]
pub struct TooltipSignal(RwSignal<Option<Hovered>>);

impl TooltipSignal {
    pub fn new() -> Self {
        Self(RwSignal::new(None))
    }

    pub fn show(&self, item: Item, rect: Rect) {
        self.0.set(Some(Hovered { item, rect }));
    }

    pub fn hide(&self) {
        if self.0.with_untracked(Option::is_some) {
            self.0.set(None);
        }
    }
}

#[component]
pub fn Tooltip() -> impl IntoView {
    let tooltip = expect_context::<TooltipSignal>();
    let filters = use_state_slice(|s| s.game.as_ref().map(|g| g.filters.clone()).unwrap_or_default());

    move || {
        tooltip.0.get().map(|Hovered { item, rect }| {
            let rows = filters.with(|filters| tooltip_rows(&item, filters));
            let style = format!("left: {}px; top: {}px;", rect.left, rect.bottom() + OFFSET);
            view! {
                <div class="tooltip" style=style>
                    <div class="tooltip-title">{item.name.clone()}</div>
                    {item.name_ru.clone().map(|name| view! { <div class="tooltip-subtitle">{name}</div> })}
                    <dl class="tooltip-rows">
                        {rows
                            .into_iter()
                            .map(|(label, value)| view! { <dt>{label}</dt> <dd>{value}</dd> })
                            .collect_view()}
                    </dl>
                </div>
            }
        })
    }
}
