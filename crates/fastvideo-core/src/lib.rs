//! fastvideo Core - Video Overlay Engine
//!
//! This crate turns a video reference (hosted-player URL or local media
//! asset) into a playable, closable, optionally preloaded modal overlay:
//! - Link classification (YouTube, Vimeo, AdobeTV, local media, generic embeds)
//! - Player surface construction (native media element or iframe)
//! - Single-flight analytics and promotion feed caches
//! - Overlay lifecycle with a single active playback
//! - Deep-linkable history entries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        fastvideo Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │     URL      │  │  Analytics   │  │  Promotion   │           │
//! │  │  Classifier  │  │    Cache     │  │    Cache     │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │  ┌──────┴───────┐         └────────┬────────┘                   │
//! │  │    Player    │                  │                            │
//! │  │   Builder    │                  │                            │
//! │  └──────┬───────┘                  │                            │
//! │         └─────────────┬────────────┘                            │
//! │                ┌──────┴──────┐        ┌──────────────┐          │
//! │                │   Overlay   │───────▶│ OverlayHost  │          │
//! │                │   Manager   │        │  (DOM, test) │          │
//! │                └─────────────┘        └──────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod classify;
pub mod surface;
pub mod feed;
pub mod analytics;
pub mod promotions;
pub mod history;
pub mod overlay;

pub use error::{Error, Result};
pub use types::*;
pub use config::{Locale, OverlayConfig, VIMEO_APP_ID};
pub use classify::{classify, classify_url, is_video_link, mime_type, Classification};
pub use surface::{build_surface, PlayerSurface, VideoSource, Surface};
pub use feed::{FeedCache, FeedDocument, FeedSource, StaticFeedSource};
#[cfg(feature = "http")]
pub use feed::HttpFeedSource;
pub use analytics::{AnalyticsCache, AnalyticsEntry, AnalyticsService, DocumentEvent, VideoEventDetail, VideoParameters};
pub use promotions::{PromotionCache, PromotionService};
pub use history::{HistoryEntry, HistoryState};
pub use overlay::{OpenOutcome, OverlayHost, OverlayManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "fastvideo core initialized");
}
