//! fastvideo WASM - browser binding for the video overlay engine
//!
//! Provides:
//! - `VideoOverlays`: the overlay manager driving real DOM elements
//! - Stateless helpers for link classification and player descriptions
//!
//! ## Usage
//!
//! ```javascript
//! import init, { VideoOverlays, isVideoLink } from '@fastvideo/wasm';
//!
//! await init();
//! const overlays = new VideoOverlays({ localePrefix: '/fr', documentTitle: document.title });
//! if (isVideoLink(link.href)) {
//!   await overlays.show([link.href], link.title, true);
//! }
//! ```

use fastvideo_core::{build_surface, classify_url, Locale, VideoReference};
use wasm_bindgen::prelude::*;

mod dom_host;
mod fetch;
mod overlays;

pub use dom_host::DomHost;
pub use fetch::FetchFeedSource;
pub use overlays::VideoOverlays;

use overlays::to_js;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"[fastvideo WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether a URL can be played in an overlay
#[wasm_bindgen(js_name = isVideoLink)]
pub fn is_video_link(url: &str) -> bool {
    fastvideo_core::is_video_link(url)
}

/// Classify a reference; returns `{ kind, ... }`
#[wasm_bindgen]
pub fn classify(urls: Vec<String>, title: String, locale_prefix: Option<String>) -> Result<JsValue, JsValue> {
    let reference = VideoReference::new(urls, title).map_err(to_js)?;
    let locale = Locale::from_prefix(locale_prefix.as_deref().unwrap_or_default());
    Ok(serde_wasm_bindgen::to_value(&fastvideo_core::classify(&reference, &locale))?)
}

/// Describe the player surface for a URL, or `null` when there is nothing to play
#[wasm_bindgen(js_name = buildPlayer)]
pub fn build_player(url: &str, title: &str, autoplay: bool, locale_prefix: Option<String>) -> Result<JsValue, JsValue> {
    let locale = Locale::from_prefix(locale_prefix.as_deref().unwrap_or_default());
    match build_surface(&classify_url(url, &locale), title, autoplay) {
        Some(player) => Ok(serde_wasm_bindgen::to_value(&player)?),
        None => Ok(JsValue::NULL),
    }
}

/// Subtitle language for a locale prefix ("/fr" → "fr", "/jp" → "ja", otherwise "en")
#[wasm_bindgen(js_name = subtitleLanguage)]
pub fn subtitle_language(locale_prefix: &str) -> String {
    Locale::from_prefix(locale_prefix).subtitle_language().to_string()
}
