//! JSON feed sources and the single-flight cache built on them
//!
//! Both auxiliary feeds (analytics, promotions) are fetched at most once per
//! process. Concurrent first callers share one in-flight fetch; a failed fetch
//! memoizes the empty document instead of erroring.

use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Where feed documents come from
#[async_trait(?Send)]
pub trait FeedSource {
    /// Fetch the raw body of the feed at `path`
    async fn fetch(&self, path: &str) -> Result<String>;
}

/// Document type a feed body decodes into
pub trait FeedDocument: Default {
    /// Human-readable feed name for logs
    const NAME: &'static str;

    fn parse(body: &str) -> Result<Self>;
}

/// Single-flight, process-lifetime cache of one feed document
pub struct FeedCache<T> {
    source: Box<dyn FeedSource>,
    path: String,
    cell: OnceCell<T>,
}

impl<T: FeedDocument> FeedCache<T> {
    pub fn new(source: Box<dyn FeedSource>, path: impl Into<String>) -> Self {
        Self {
            source,
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Feed path this cache populates from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether population already completed
    pub fn is_populated(&self) -> bool {
        self.cell.initialized()
    }

    /// The cached document, fetching it on first use
    pub async fn get(&self) -> &T {
        self.cell
            .get_or_init(|| async {
                match self.load().await {
                    Ok(doc) => {
                        debug!(feed = T::NAME, path = %self.path, "Feed cached");
                        doc
                    }
                    Err(e) => {
                        warn!(feed = T::NAME, path = %self.path, error = %e, "Feed unavailable, using empty cache");
                        T::default()
                    }
                }
            })
            .await
    }

    async fn load(&self) -> Result<T> {
        let body = self.source.fetch(&self.path).await?;
        T::parse(&body)
    }
}

/// HTTP feed source rooted at a site origin
#[cfg(feature = "http")]
pub struct HttpFeedSource {
    client: reqwest::Client,
    origin: url::Url,
}

#[cfg(feature = "http")]
impl HttpFeedSource {
    pub fn new(origin: url::Url, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client, origin })
    }
}

#[cfg(feature = "http")]
#[async_trait(?Send)]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.origin.join(path).map_err(|e| Error::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })?;

        debug!(url = %url, "Fetching feed");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// In-memory feed source; unknown paths fail like a missing file
#[derive(Default)]
pub struct StaticFeedSource {
    bodies: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl StaticFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `path`
    pub fn with(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(path.into(), body.into());
        self
    }

    /// Number of fetches served so far (including failed ones)
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait(?Send)]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(path)
            .cloned()
            .ok_or_else(|| Error::FeedFetch(format!("no feed at {path}")))
    }
}

#[async_trait(?Send)]
impl<S: FeedSource + ?Sized> FeedSource for std::rc::Rc<S> {
    async fn fetch(&self, path: &str) -> Result<String> {
        (**self).fetch(path).await
    }
}
