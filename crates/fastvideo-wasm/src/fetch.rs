//! Feed source backed by `window.fetch`

use async_trait::async_trait;
use fastvideo_core::{Error, FeedSource, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, RequestInit, Response, Window};

/// Fetches feeds relative to the page origin
///
/// Requests still pending after `timeout_ms` are aborted through an
/// `AbortController`, which fails the fetch like any network error.
#[derive(Debug, Clone)]
pub struct FetchFeedSource {
    /// Prepended to every feed path; empty means same-origin relative
    origin: String,
    timeout_ms: u64,
}

impl FetchFeedSource {
    pub fn new(origin: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    /// Same-origin source
    pub fn same_origin(timeout_ms: u64) -> Self {
        Self::new("", timeout_ms)
    }

    async fn request(&self, window: &Window, path: &str, init: &RequestInit) -> Result<String> {
        let url = format!("{}{}", self.origin, path);
        let response = JsFuture::from(window.fetch_with_str_and_init(&url, init))
            .await
            .map_err(|e| Error::FeedFetch(format!("{url}: {e:?}")))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| Error::FeedFetch(format!("{url}: not a Response")))?;

        if !response.ok() {
            return Err(Error::FeedStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let text = response
            .text()
            .map_err(|e| Error::FeedFetch(format!("{url}: {e:?}")))?;
        JsFuture::from(text)
            .await
            .map_err(|e| Error::FeedFetch(format!("{url}: {e:?}")))?
            .as_string()
            .ok_or_else(|| Error::FeedFetch(format!("{url}: body is not text")))
    }
}

#[async_trait(?Send)]
impl FeedSource for FetchFeedSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        let window = web_sys::window().ok_or_else(|| Error::host("no window"))?;

        let controller = AbortController::new().map_err(|e| Error::host(format!("{e:?}")))?;
        let init = RequestInit::new();
        init.set_signal(Some(&controller.signal()));

        let abort = Closure::<dyn FnMut()>::new(move || controller.abort());
        let timeout = i32::try_from(self.timeout_ms).unwrap_or(i32::MAX);
        let timer = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(abort.as_ref().unchecked_ref(), timeout)
            .map_err(|e| Error::host(format!("{e:?}")))?;

        // the timer must not fire after `abort` is dropped
        let body = self.request(&window, path, &init).await;
        window.clear_timeout_with_handle(timer);
        drop(abort);
        body
    }
}
