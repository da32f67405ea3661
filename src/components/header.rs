//! Header Component
//!
//! Game and sheet pickers, presets, undo/redo, save status and sharing.
//! A shared list opened read-only replaces the editing controls with a
//! banner leading back to the user's own lists.

use leptos::prelude::*;
use leptos::task::spawn_local;
use tierforge_core::{Event, SaveStatus};
use wasm_bindgen_futures::JsFuture;

use super::DeleteConfirmButton;
use crate::context::{use_engine, use_state_slice};
use crate::share;
use crate::store::{use_ui_store, UiStateStoreFields};

fn status_text(status: &SaveStatus) -> &'static str {
    match status {
        SaveStatus::Idle => "",
        SaveStatus::Saving => "Saving…",
        SaveStatus::Saved => "Saved",
        SaveStatus::Error(_) => "Not saved",
    }
}

async fn copy_to_clipboard(text: String) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let promise = window.navigator().clipboard().write_text(&text);
    if let Err(err) = JsFuture::from(promise).await {
        tracing::warn!(?err, "clipboard write failed");
    }
}

#[component]
fn PresetControls() -> impl IntoView {
    let engine = use_engine();
    let store = use_ui_store();
    let (renaming, set_renaming) = signal(false);

    let active_id = move || store.presets().with(|p| p.active_id.clone());
    let active_name = move || store.presets().with(|p| p.active().map(|a| a.name.clone()).unwrap_or_default());

    let commit_rename = move |name: String| {
        set_renaming.set(false);
        let name = name.trim().to_string();
        if let Some(preset_id) = active_id() {
            if !name.is_empty() && name != active_name() {
                engine.emit(Event::PresetRename { preset_id, name });
            }
        }
    };

    view! {
        <div class="preset-controls">
            <Show
                when=move || renaming.get()
                fallback=move || view! {
                    <select
                        class="preset-select"
                        on:change=move |ev| engine.emit(Event::PresetSwitch {
                            preset_id: event_target_value(&ev),
                        })
                    >
                        <For
                            each=move || store.presets().with(|p| p.presets.clone())
                            key=|p| (p.id.clone(), p.name.clone())
                            children=move |preset| {
                                let id = preset.id.clone();
                                view! {
                                    <option value=preset.id.clone() selected=move || active_id().as_deref() == Some(id.as_str())>
                                        {preset.name.clone()}
                                    </option>
                                }
                            }
                        />
                    </select>
                    <button class="icon-btn" title="Rename list" on:click=move |_| set_renaming.set(true)>"✎"</button>
                }
            >
                <input
                    class="preset-rename"
                    type="text"
                    prop:value=active_name
                    autofocus
                    on:keydown=move |ev| match ev.key().as_str() {
                        "Enter" => commit_rename(event_target_value(&ev)),
                        "Escape" => set_renaming.set(false),
                        _ => {}
                    }
                    on:blur=move |ev| commit_rename(event_target_value(&ev))
                />
            </Show>
            <button
                class="icon-btn"
                title="New list"
                on:click=move |_| engine.emit(Event::PresetCreate { name: None })
            >
                "+"
            </button>
            <Show when=move || store.presets().with(|p| p.presets.len() > 1)>
                <DeleteConfirmButton
                    button_class="icon-btn"
                    title="Delete this list"
                    on_confirm=Callback::new(move |_| {
                        if let Some(preset_id) = active_id() {
                            engine.emit(Event::PresetDelete { preset_id });
                        }
                    })
                />
            </Show>
        </div>
    }
}

#[component]
fn ShareControls() -> impl IntoView {
    let engine = use_engine();
    let sharing = use_state_slice(|s| s.tier_list.as_ref().map(|tl| (tl.is_public, tl.share_code.clone())));
    let link = move || {
        let (is_public, code) = sharing.get()?;
        if !is_public || code.is_empty() {
            return None;
        }
        share::page_base().map(|base| share::share_url(&base, &code))
    };

    view! {
        <div class="share-controls">
            <label class="share-toggle">
                <input
                    type="checkbox"
                    prop:checked=move || sharing.with(|s| s.as_ref().is_some_and(|(public, _)| *public))
                    disabled=move || sharing.with(Option::is_none)
                    on:change=move |ev| engine.emit(Event::ShareToggled {
                        is_public: event_target_checked(&ev),
                    })
                />
                "Public"
            </label>
            {move || link().map(|url| {
                let copied = url.clone();
                let href = url.clone();
                view! {
                    <a class="share-link" href=href target="_blank">{url}</a>
                    <button class="icon-btn" title="Copy link" on:click=move |_| {
                        spawn_local(copy_to_clipboard(copied.clone()));
                    }>
                        "Copy"
                    </button>
                }
            })}
        </div>
    }
}

#[component]
pub fn Header() -> impl IntoView {
    let engine = use_engine();
    let store = use_ui_store();
    let game_id = use_state_slice(|s| s.game.as_ref().map(|g| g.id.clone()));
    let sheets = use_state_slice(|s| s.game.as_ref().map(|g| g.sheets.clone()).unwrap_or_default());
    let sheet_id = use_state_slice(|s| s.sheet.as_ref().map(|sh| sh.id.clone()));
    let read_only = use_state_slice(|s| s.read_only);
    let can_undo = use_state_slice(|s| s.history.can_undo());
    let can_redo = use_state_slice(|s| s.history.can_redo());
    let list_name = use_state_slice(|s| s.tier_list.as_ref().map(|tl| tl.name.clone()).unwrap_or_default());

    view! {
        <header class="app-header">
            <h1 class="app-title">"TierForge"</h1>

            <select
                class="game-select"
                on:change=move |ev| engine.emit(Event::GameSwitch {
                    game_id: event_target_value(&ev),
                })
            >
                <For
                    each=move || store.games().get()
                    key=|g| g.id.clone()
                    children=move |game| {
                        let id = game.id.clone();
                        view! {
                            <option value=game.id.clone() selected=move || game_id.get().as_deref() == Some(id.as_str())>
                                {game.name.clone()}
                            </option>
                        }
                    }
                />
            </select>

            <Show when=move || sheets.with(|s| s.len() > 1)>
                <select
                    class="sheet-select"
                    on:change=move |ev| engine.emit(Event::SheetSwitch {
                        sheet_id: event_target_value(&ev),
                    })
                >
                    <For
                        each=move || sheets.get()
                        key=|sh| sh.id.clone()
                        children=move |sheet| {
                            let id = sheet.id.clone();
                            view! {
                                <option value=sheet.id.clone() selected=move || sheet_id.get().as_deref() == Some(id.as_str())>
                                    {sheet.name.clone()}
                                </option>
                            }
                        }
                    />
                </select>
            </Show>

            <Show
                when=move || !read_only.get()
                fallback=move || view! {
                    <div class="read-only-banner">
                        <span>"Viewing “" {move || list_name.get()} "” (read-only)"</span>
                        <button on:click=move |_| {
                            if let Some(game_id) = game_id.get_untracked() {
                                engine.emit(Event::GameSwitch { game_id });
                            }
                        }>
                            "Back to my lists"
                        </button>
                    </div>
                }
            >
                <PresetControls />
                <div class="history-controls">
                    <button title="Undo (Ctrl+Z)" disabled=move || !can_undo.get() on:click=move |_| engine.emit(Event::Undo)>
                        "↶"
                    </button>
                    <button title="Redo (Ctrl+Shift+Z)" disabled=move || !can_redo.get() on:click=move |_| engine.emit(Event::Redo)>
                        "↷"
                    </button>
                </div>
                <span
                    class=move || store.save_status().with(|s| match s {
                        SaveStatus::Error(_) => "save-status error",
                        _ => "save-status",
                    })
                    title=move || store.save_status().with(|s| match s {
                        SaveStatus::Error(message) => message.clone(),
                        _ => String::new(),
                    })
                >
                    {move || store.save_status().with(status_text)}
                </span>
                <ShareControls />
            </Show>
        </header>
    }
}
