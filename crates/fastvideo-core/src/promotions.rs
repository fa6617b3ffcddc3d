//! Promotional content shown in place of a finished video

use crate::classify::normalize_video_path;
use crate::feed::{FeedCache, FeedDocument, FeedSource};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct FeedRow {
    #[serde(rename = "Video", default)]
    video: Option<String>,
    #[serde(rename = "Promotion", default)]
    promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    data: Vec<FeedRow>,
}

/// Video path → promotion HTML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionCache {
    promotions: HashMap<String, String>,
}

impl FeedDocument for PromotionCache {
    const NAME: &'static str = "video-promotions";

    fn parse(body: &str) -> Result<Self> {
        let feed: Feed = serde_json::from_str(body)?;
        let promotions = feed
            .data
            .into_iter()
            .filter_map(|row| match (row.video, row.promotion) {
                (Some(video), Some(promotion)) if !video.is_empty() => {
                    Some((normalize_video_path(&video), promotion))
                }
                _ => None,
            })
            .collect();
        Ok(Self { promotions })
    }
}

impl PromotionCache {
    /// Promotion for a playback URL, matched on its path
    pub fn lookup(&self, video_url: &str) -> Option<&str> {
        self.promotions
            .get(&normalize_video_path(video_url))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// Iterate (video path, promotion) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.promotions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Locale-scoped promotions feed cache
pub struct PromotionService {
    cache: FeedCache<PromotionCache>,
}

impl PromotionService {
    pub fn new(source: Box<dyn FeedSource>, path: impl Into<String>) -> Self {
        Self {
            cache: FeedCache::new(source, path),
        }
    }

    pub async fn get(&self) -> &PromotionCache {
        self.cache.get().await
    }

    /// Promotion HTML for a playback URL
    pub async fn resolve(&self, video_url: &str) -> Option<String> {
        let promotion = self.get().await.lookup(video_url).map(str::to_string);
        if promotion.is_none() {
            debug!(video = video_url, "No promotion for video");
        }
        promotion
    }
}
