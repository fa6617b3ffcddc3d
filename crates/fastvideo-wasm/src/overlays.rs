//! JS-facing overlay manager
//!
//! Every operation returns a `Promise`: the first `show`/`activate` after
//! page load may have to wait for the feeds.

use crate::dom_host::{report, DomHost};
use crate::fetch::FetchFeedSource;
use fastvideo_core::{
    Error, FeedSource, OpenOutcome, OverlayConfig, OverlayId, OverlayManager, VideoReference,
};
use js_sys::Promise;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

/// Overlay manager bound to the page document
#[wasm_bindgen]
pub struct VideoOverlays {
    manager: Rc<OverlayManager<DomHost>>,
}

#[wasm_bindgen]
impl VideoOverlays {
    /// Create the page's overlay manager
    ///
    /// `config` is an optional object with `localePrefix`, `analyticsFeed`,
    /// `promotionsFeed`, `documentTitle`, `product`, `requestTimeoutMs` and `autoplay`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VideoOverlays, JsValue> {
        let config: OverlayConfig = if config.is_undefined() || config.is_null() {
            OverlayConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config.validate().map_err(to_js)?;

        let source: Rc<dyn FeedSource> = Rc::new(FetchFeedSource::same_origin(config.request_timeout_ms));
        let manager = Rc::new(OverlayManager::with_source(DomHost::new(), config, source));
        DomHost::bind(&manager).map_err(to_js)?;

        web_sys::console::log_1(&"[fastvideo] Overlay manager ready".into());
        Ok(Self { manager })
    }

    /// Open a video; resolves to the overlay id, or `null` when the page navigated instead
    pub fn show(&self, urls: Vec<String>, title: String, push_history: bool) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let reference = VideoReference::new(urls, title).map_err(to_js)?;
            let outcome = manager.show(&reference, push_history).await.map_err(to_js)?;
            Ok(outcome_to_js(outcome))
        })
    }

    /// Mount a hidden overlay to be activated later
    pub fn preload(&self, urls: Vec<String>, title: String, push_history: bool) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let reference = VideoReference::new(urls, title).map_err(to_js)?;
            let outcome = manager.preload(&reference, push_history).await.map_err(to_js)?;
            Ok(outcome_to_js(outcome))
        })
    }

    /// Show and play the preloaded overlay for `title`, pausing every other one
    pub fn activate(&self, title: String) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let id = manager.activate(&title).await.map_err(to_js)?;
            Ok(JsValue::from_str(id.as_str()))
        })
    }

    pub fn close(&self, id: String) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let id = known_id(&manager, &id).await?;
            manager.close(&id).await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Unmount and forget a preloaded overlay
    pub fn remove(&self, id: String) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let id = known_id(&manager, &id).await?;
            manager.remove(&id).await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Close the active overlay; resolves to its id or `null`
    pub fn escape(&self) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let closed = manager.escape().await.map_err(to_js)?;
            Ok(closed.map_or(JsValue::NULL, |id| JsValue::from_str(id.as_str())))
        })
    }

    /// Resolves to "active", "preloaded-inactive", "preloaded-active" or `null`
    pub fn kind(&self, id: String) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let kind = match manager.overlay_ids().await.into_iter().find(|o| o.as_str() == id) {
                Some(id) => manager.kind(&id).await,
                None => None,
            };
            Ok(kind.map_or(JsValue::NULL, |k| JsValue::from_str(&k.to_string())))
        })
    }

    /// Id of the active overlay, or `null`
    #[wasm_bindgen(js_name = activeOverlay)]
    pub fn active_overlay(&self) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let active = manager.active().await;
            Ok(active.map_or(JsValue::NULL, |id| JsValue::from_str(id.as_str())))
        })
    }

    /// Resolves to the analytics entries, fetching the feed on first use
    #[wasm_bindgen(js_name = fetchVideoAnalytics)]
    pub fn fetch_video_analytics(&self) -> Promise {
        let manager = self.manager.clone();
        future_to_promise(async move {
            let cache = manager.analytics().get().await;
            Ok(serde_wasm_bindgen::to_value(cache.entries())?)
        })
    }

    /// Subtitle language for the configured locale
    #[wasm_bindgen(js_name = subtitleLanguage)]
    pub fn subtitle_language(&self) -> String {
        self.manager.config().locale().subtitle_language().to_string()
    }
}

async fn known_id(manager: &OverlayManager<DomHost>, id: &str) -> Result<OverlayId, JsValue> {
    manager
        .overlay_ids()
        .await
        .into_iter()
        .find(|o| o.as_str() == id)
        .ok_or_else(|| to_js(Error::UnknownOverlay(id.to_string())))
}

fn outcome_to_js(outcome: OpenOutcome) -> JsValue {
    match outcome {
        OpenOutcome::Opened(id) => JsValue::from_str(id.as_str()),
        OpenOutcome::Navigated(_) => JsValue::NULL,
    }
}

pub(crate) fn to_js(e: Error) -> JsValue {
    report(&e);
    js_sys::Error::new(&e.to_string()).into()
}
