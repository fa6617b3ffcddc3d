//! Video analytics metadata
//!
//! The analytics feed maps page paths to the videos they embed. When a native
//! surface loads or closes, the matching entry becomes the detail of a
//! `videoloaded` / `videoclosed` document event.

use crate::feed::{FeedCache, FeedDocument, FeedSource};
use crate::{MediaSnapshot, OverlayId, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw analytics feed row
#[derive(Debug, Clone, Deserialize)]
struct FeedRow {
    #[serde(rename = "Page", default)]
    page: String,
    #[serde(rename = "Filenames", default)]
    filenames: Option<String>,
    #[serde(rename = "videoName", default)]
    video_name: Option<String>,
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
    #[serde(rename = "videoDescription", default)]
    video_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    data: Vec<FeedRow>,
}

/// Analytics metadata for the videos of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEntry {
    /// Page path fragment this entry applies to
    pub page: String,
    /// Substrings identifying the video files
    pub filenames: Vec<String>,
    pub video_name: Option<String>,
    pub video_id: Option<String>,
    pub description: Option<String>,
}

impl AnalyticsEntry {
    fn matches(&self, page_path: &str, current_src: &str) -> bool {
        page_path.contains(&self.page)
            && self
                .filenames
                .iter()
                .any(|name| current_src.contains(name.as_str()))
    }
}

impl From<FeedRow> for AnalyticsEntry {
    fn from(row: FeedRow) -> Self {
        Self {
            page: row.page,
            filenames: row
                .filenames
                .map(|f| {
                    f.split('\n')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            video_name: row.video_name,
            video_id: row.video_id,
            description: row.video_description,
        }
    }
}

/// All analytics entries from the feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsCache {
    entries: Vec<AnalyticsEntry>,
}

impl FeedDocument for AnalyticsCache {
    const NAME: &'static str = "video-analytics";

    fn parse(body: &str) -> Result<Self> {
        let feed: Feed = serde_json::from_str(body)?;
        Ok(Self {
            entries: feed.data.into_iter().map(AnalyticsEntry::from).collect(),
        })
    }
}

impl AnalyticsCache {
    pub fn entries(&self) -> &[AnalyticsEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose page is part of `page_path` and whose filenames match `current_src`
    pub fn lookup(&self, page_path: &str, current_src: &str) -> Option<&AnalyticsEntry> {
        self.entries
            .iter()
            .find(|entry| entry.matches(page_path, current_src))
    }
}

/// Parameters reported with a video document event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub video_name: Option<String>,
    pub video_id: Option<String>,
    pub video_length: Option<f64>,
    pub product: String,
    pub video_category: String,
    pub video_description: Option<String>,
    pub video_player: String,
    pub video_media_type: String,
}

/// Detail of a `videoloaded` / `videoclosed` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEventDetail {
    /// Overlay hosting the video
    pub video: OverlayId,
    /// Source the media element was playing
    pub source: String,
    pub parameters: VideoParameters,
}

impl VideoEventDetail {
    pub fn new(video: OverlayId, media: &MediaSnapshot, entry: &AnalyticsEntry, product: &str) -> Self {
        Self {
            video,
            source: media.current_src.clone(),
            parameters: VideoParameters {
                video_name: entry.video_name.clone(),
                video_id: entry.video_id.clone(),
                video_length: media.duration,
                product: product.to_string(),
                video_category: "default".to_string(),
                video_description: entry.description.clone(),
                video_player: "html5-video".to_string(),
                video_media_type: "VOD".to_string(),
            },
        }
    }
}

/// Event emitted on the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "lowercase")]
pub enum DocumentEvent {
    VideoLoaded(VideoEventDetail),
    VideoClosed(VideoEventDetail),
}

impl DocumentEvent {
    /// DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::VideoLoaded(_) => "videoloaded",
            DocumentEvent::VideoClosed(_) => "videoclosed",
        }
    }

    pub fn detail(&self) -> &VideoEventDetail {
        match self {
            DocumentEvent::VideoLoaded(d) | DocumentEvent::VideoClosed(d) => d,
        }
    }
}

/// Analytics feed cache plus event resolution
pub struct AnalyticsService {
    cache: FeedCache<AnalyticsCache>,
    product: String,
}

impl AnalyticsService {
    pub fn new(source: Box<dyn FeedSource>, path: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            cache: FeedCache::new(source, path),
            product: product.into(),
        }
    }

    /// The analytics cache, fetched on first use
    pub async fn get(&self) -> &AnalyticsCache {
        self.cache.get().await
    }

    /// Event detail for the media of an overlay, if the feed knows it
    pub async fn resolve(&self, overlay: &OverlayId, page_path: &str, media: &MediaSnapshot) -> Option<VideoEventDetail> {
        let cache = self.get().await;
        match cache.lookup(page_path, &media.current_src) {
            Some(entry) => Some(VideoEventDetail::new(overlay.clone(), media, entry, &self.product)),
            None => {
                debug!(page = page_path, src = %media.current_src, "No analytics entry");
                None
            }
        }
    }
}
