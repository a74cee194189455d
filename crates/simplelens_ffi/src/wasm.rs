//! `wasm-bindgen` exports for the dashboard page.
//!
//! Envelopes cross the boundary as JSON strings; the page parses them with
//! `JSON.parse`. Only compiled on `wasm32` targets.

use crate::api;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        format!(r#"{{"ok":false,"message":"failed to encode response: {err}"}}"#)
    })
}

#[wasm_bindgen(js_name = ping)]
pub fn ping() -> String {
    api::ping()
}

#[wasm_bindgen(js_name = coreVersion)]
pub fn core_version() -> String {
    api::core_version()
}

/// Empty string on success.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: String) -> String {
    api::init_logging(level, String::new())
}

/// Call from the `refocus.lens.load` handler.
#[wasm_bindgen(js_name = lensLoad)]
pub fn lens_load(subjects_json: String, aspects_json: String, config_toml: String) -> String {
    to_json(&api::lens_load(subjects_json, aspects_json, config_toml))
}

/// Call from the `refocus.lens.realtime.change` handler with `evt.detail`.
#[wasm_bindgen(js_name = lensApplyChanges)]
pub fn lens_apply_changes(batch_json: String, now_ms: f64) -> String {
    to_json(&api::lens_apply_changes(batch_json, js_millis(now_ms)))
}

#[wasm_bindgen(js_name = lensClick)]
pub fn lens_click(row: u32, column: u32, now_ms: f64) -> String {
    to_json(&api::lens_click(row, column, js_millis(now_ms)))
}

#[wasm_bindgen(js_name = lensExpire)]
pub fn lens_expire(now_ms: f64) -> String {
    to_json(&api::lens_expire(js_millis(now_ms)))
}

#[wasm_bindgen(js_name = lensUnload)]
pub fn lens_unload() -> bool {
    api::lens_unload()
}

/// `Date.now()` arrives as a float; negative or NaN clamps to zero.
fn js_millis(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}
