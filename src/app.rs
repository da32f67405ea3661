//! TierForge Frontend App
//!
//! Builds the engine, provides the shared contexts and lays out the
//! header, the sidebar pool and the board.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{bind_global_pointer_handlers, create_dnd_signals, DndSignals};
use reactive_stores::Store;
use tierforge_core::view_model::board_view;
use tierforge_core::{EngineConfig, Event, TierContext, TierEngine};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::commands::TauriApi;
use crate::components::{Header, Sidebar, TierList, Tooltip, TooltipSignal};
use crate::context::{use_state_slice, EngineHandle};
use crate::runtime::BrowserRuntime;
use crate::store::{bind_notifications, store_dismiss_notice, UiState, UiStateStoreFields, UiStore};
use crate::{dnd, share, storage};

fn build_engine() -> TierEngine {
    let config = EngineConfig::default();
    let ctx = TierContext::new(config.history_cap);
    let engine = TierEngine::new(ctx, Rc::new(TauriApi), storage::open(), Rc::new(BrowserRuntime), config);
    engine.start();
    engine
}

/// Whether keystrokes belong to a text field rather than the board
fn is_typing(ev: &web_sys::KeyboardEvent) -> bool {
    ev.target().is_some_and(|t| {
        t.dyn_ref::<web_sys::HtmlInputElement>().is_some()
            || t.dyn_ref::<web_sys::HtmlTextAreaElement>().is_some()
            || t.dyn_ref::<web_sys::HtmlSelectElement>().is_some()
    })
}

/// Undo, redo and Escape for the whole page
fn bind_shortcuts(engine: EngineHandle, dnd: DndSignals) {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let on_keydown = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |ev: web_sys::KeyboardEvent| {
        if is_typing(&ev) {
            return;
        }
        let modifier = ev.ctrl_key() || ev.meta_key();
        let key = ev.key().to_lowercase();
        match key.as_str() {
            "z" if modifier && ev.shift_key() => {
                ev.prevent_default();
                engine.emit(Event::Redo);
            }
            "z" if modifier => {
                ev.prevent_default();
                engine.emit(Event::Undo);
            }
            "y" if ev.ctrl_key() => {
                ev.prevent_default();
                engine.emit(Event::Redo);
            }
            "escape" => {
                let was_dragging = dnd.is_dragging();
                if dnd.cancel() && was_dragging {
                    engine.emit(Event::DragEnded { committed: false });
                }
                engine.emit(Event::SelectionCleared);
            }
            _ => {}
        }
    });
    let _ = doc.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref());
    on_keydown.forget();
}

#[component]
pub fn App() -> impl IntoView {
    let engine = EngineHandle::new(build_engine());
    let store: UiStore = Store::new(UiState::default());
    let dnd = create_dnd_signals();

    provide_context(engine);
    provide_context(store);
    provide_context(dnd);
    provide_context(TooltipSignal::new());

    StoredValue::new_local(bind_notifications(&engine.context().bus, store));

    bind_global_pointer_handlers(
        dnd,
        move |point, source| dnd::resolve_target(engine, point, source),
        move |event| engine.emit(event),
    );
    bind_shortcuts(engine, dnd);

    spawn_local(async move {
        let route = share::current_route();
        tracing::info!(?route, "bootstrapping");
        let instance = engine.engine();
        let result = instance.bootstrap(route).await;
        store.games().set(instance.games());
        if let Err(err) = result {
            tracing::error!(%err, "bootstrap failed");
            engine.emit(Event::LoadFailed { message: err.to_string() });
        }
    });

    let board = use_state_slice(board_view);
    let location = use_state_slice(|s| {
        let game = s.game.as_ref()?;
        (!s.read_only).then(|| (game.id.clone(), s.sheet.as_ref().map(|sh| sh.id.clone()).unwrap_or_default()))
    });
    Effect::new(move |_| {
        if let Some((game_id, sheet_id)) = location.get() {
            share::replace_game_url(&game_id, &sheet_id);
        }
    });

    view! {
        <div class="app-layout">
            <Header />
            {move || store.notice().get().map(|message| view! {
                <div class="notice-bar">
                    <span>{message}</span>
                    <button class="icon-btn" on:click=move |_| store_dismiss_notice(&store)>"×"</button>
                </div>
            })}
            <main
                class="app-main"
                on:dragover=move |ev| dnd::drag_over(engine, dnd, &ev)
                on:drop=move |ev| dnd::drop_on_board(engine, dnd, &ev)
            >
                <Sidebar board=board />
                <TierList board=board />
            </main>
            <Tooltip />
        </div>
    }
}
