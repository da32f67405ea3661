//! Page URLs
//!
//! Reading the startup route from the query string and building share
//! links: `?s=<code>` opens a shared list, `?game=<id>&sheet=<id>` a game.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tierforge_core::StartupRoute;

/// Everything except the unreserved characters of RFC 3986
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Decode `a=1&b=two` (with or without the leading `?`).
pub fn query_pairs(search: &str) -> Vec<(String, String)> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

pub fn route_from_search(search: &str) -> StartupRoute {
    StartupRoute::from_pairs(query_pairs(search))
}

/// Link that opens `share_code` read-only. `base` is origin plus path.
pub fn share_url(base: &str, share_code: &str) -> String {
    format!("{base}?s={}", encode(share_code))
}

/// Link back to a game and sheet
pub fn game_url(base: &str, game_id: &str, sheet_id: &str) -> String {
    if sheet_id.is_empty() {
        format!("{base}?game={}", encode(game_id))
    } else {
        format!("{base}?game={}&sheet={}", encode(game_id), encode(sheet_id))
    }
}

/// Current page without query or fragment
pub fn page_base() -> Option<String> {
    let location = web_sys::window()?.location();
    let origin = location.origin().ok()?;
    let path = location.pathname().ok()?;
    Some(format!("{origin}{path}"))
}

/// Point the address bar at the open game and sheet without reloading.
pub fn replace_game_url(game_id: &str, sheet_id: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let (Some(base), Ok(history)) = (page_base(), window.history()) else {
        return;
    };
    let url = game_url(&base, game_id, sheet_id);
    if let Err(err) = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url)) {
        tracing::debug!(?err, "could not update the address bar");
    }
}

pub fn current_route() -> StartupRoute {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    route_from_search(&search)
}
