//! Core types for the overlay engine

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A caller-supplied video: one or more URLs plus a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    urls: Vec<String>,
    title: String,
}

impl VideoReference {
    /// Create a reference, rejecting an empty URL list
    pub fn new(urls: Vec<String>, title: impl Into<String>) -> Result<Self> {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(Error::EmptyReference);
        }
        Ok(Self {
            urls,
            title: title.into(),
        })
    }

    /// Reference with a single URL
    pub fn single(url: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        Self::new(vec![url.into()], title)
    }

    /// First URL; drives provider detection
    pub fn primary_url(&self) -> &str {
        self.urls.first().map(String::as_str).unwrap_or_default()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Overlay identifier, derived from the video title
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayId(String);

impl OverlayId {
    /// Id of the overlay for a given title
    pub fn from_title(title: &str) -> Self {
        Self(format!("video-overlay-{}", slugify(title)))
    }

    /// Id of an overlay opened directly with `show`
    pub fn modal(title: &str) -> Self {
        Self(format!("video-modal-{}", slugify(title)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Embedding strategy a URL requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    #[serde(rename = "youtube")]
    YouTube,
    Vimeo,
    #[serde(rename = "adobetv")]
    AdobeTv,
    Html5Local,
    GenericIframe,
}

impl Provider {
    /// Tag used as the surface CSS class
    pub fn tag(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::AdobeTv => "adobetv",
            Provider::Html5Local => "html5",
            Provider::GenericIframe => "default",
        }
    }

    /// Whether the surface is an iframe
    pub fn is_iframe(&self) -> bool {
        !matches!(self, Provider::Html5Local)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::YouTube => write!(f, "youtube"),
            Provider::Vimeo => write!(f, "vimeo"),
            Provider::AdobeTv => write!(f, "adobetv"),
            Provider::Html5Local => write!(f, "html5-local"),
            Provider::GenericIframe => write!(f, "generic-iframe"),
        }
    }
}

/// Observable kind of a registered overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    /// Opened with `show`; visible until closed
    Active,
    /// Preloaded, hidden and paused
    PreloadedInactive,
    /// Preloaded, visible and playing
    PreloadedActive,
}

impl OverlayKind {
    pub fn is_playing(&self) -> bool {
        matches!(self, OverlayKind::Active | OverlayKind::PreloadedActive)
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayKind::Active => write!(f, "active"),
            OverlayKind::PreloadedInactive => write!(f, "preloaded-inactive"),
            OverlayKind::PreloadedActive => write!(f, "preloaded-active"),
        }
    }
}

/// Lifecycle notification reported by the host for a native surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// First frame of data is available
    DataAvailable,
    /// Playback reached the end
    Ended,
}

/// Playback command sent to a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
}

impl MediaCommand {
    /// Command name understood by embedded players over postMessage
    pub fn iframe_func(&self) -> &'static str {
        match self {
            MediaCommand::Play => "playVideo",
            MediaCommand::Pause => "stopVideo",
        }
    }

    /// Full postMessage payload for an embedded player
    pub fn iframe_message(&self) -> String {
        format!(r#"{{"event":"command","func":"{}","args":""}}"#, self.iframe_func())
    }
}

/// Point-in-time view of a native media element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaSnapshot {
    /// Source the element resolved and is playing
    pub current_src: String,
    /// Duration in seconds, when known
    pub duration: Option<f64>,
}

/// Turn a title into a URL/CSS-safe slug
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Make a Flyer!"), "make-a-flyer");
        assert_eq!(slugify("  --Intro   Video-- "), "intro-video");
        assert_eq!(slugify("Étape 2"), "tape-2");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_reference_rejects_empty() {
        assert!(matches!(
            VideoReference::new(vec![" ".into()], "t"),
            Err(Error::EmptyReference)
        ));
        let r = VideoReference::new(vec!["".into(), "https://vimeo.com/1".into()], "t").unwrap();
        assert_eq!(r.primary_url(), "https://vimeo.com/1");
    }

    #[test]
    fn test_overlay_id_from_title() {
        assert_eq!(OverlayId::from_title("Quick Tour").as_str(), "video-overlay-quick-tour");
    }

    #[test]
    fn test_iframe_message() {
        assert_eq!(
            MediaCommand::Play.iframe_message(),
            r#"{"event":"command","func":"playVideo","args":""}"#
        );
    }
}
