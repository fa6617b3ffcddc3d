//! Video link classification
//!
//! Maps a raw reference to the embedding strategy it needs and the
//! normalized URLs the player surface should load. Pure: no I/O, no DOM.

use crate::{Locale, Provider, VideoReference, VIMEO_APP_ID};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::{Position, Url};

/// Origin used to resolve relative references ("/express/media_x.mp4")
const PLACEHOLDER_ORIGIN: &str = "http://localhost/";

const ADOBETV_HOST: &str = "video.tv.adobe.com";
const LOCAL_MEDIA_MARKER: &str = "/media_";
const LOCAL_MEDIA_EXTENSIONS: [&str; 3] = ["mp4", "webm", "m3u8"];

/// Result of classifying a video reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Classification {
    #[serde(rename = "youtube")]
    YouTube { video_id: String, url: String },
    Vimeo { video_id: String, url: String },
    #[serde(rename = "adobetv")]
    AdobeTv { url: String },
    Html5Local { sources: Vec<String>, start_offset: u32 },
    #[serde(rename = "generic")]
    GenericIframe { url: String },
}

impl Classification {
    pub fn provider(&self) -> Provider {
        match self {
            Classification::YouTube { .. } => Provider::YouTube,
            Classification::Vimeo { .. } => Provider::Vimeo,
            Classification::AdobeTv { .. } => Provider::AdobeTv,
            Classification::Html5Local { .. } => Provider::Html5Local,
            Classification::GenericIframe { .. } => Provider::GenericIframe,
        }
    }

    /// Normalized playback URLs, in preference order
    pub fn playback_urls(&self) -> &[String] {
        match self {
            Classification::YouTube { url, .. }
            | Classification::Vimeo { url, .. }
            | Classification::AdobeTv { url }
            | Classification::GenericIframe { url } => std::slice::from_ref(url),
            Classification::Html5Local { sources, .. } => sources,
        }
    }

    pub fn primary_url(&self) -> Option<&str> {
        self.playback_urls().first().map(String::as_str)
    }

    /// Seconds to seek to once media data is available
    pub fn start_offset(&self) -> u32 {
        match self {
            Classification::Html5Local { start_offset, .. } => *start_offset,
            _ => 0,
        }
    }
}

/// Classify a full reference (every URL is kept for local media)
pub fn classify(reference: &VideoReference, locale: &Locale) -> Classification {
    classify_urls(reference.urls(), locale)
}

/// Classify a single URL
pub fn classify_url(url: &str, locale: &Locale) -> Classification {
    classify_urls(std::slice::from_ref(&url.to_string()), locale)
}

fn classify_urls(urls: &[String], locale: &Locale) -> Classification {
    let primary = urls.first().map(String::as_str).unwrap_or_default();

    let classification = if is_adobetv(primary) {
        Classification::AdobeTv {
            url: primary.trim_end_matches('/').to_string(),
        }
    } else if primary.contains("youtu") {
        match youtube_id(primary) {
            Some(id) => Classification::YouTube {
                url: format!("https://www.youtube.com/embed/{id}?feature=oembed&enablejsapi=1"),
                video_id: id,
            },
            None => generic(primary),
        }
    } else if primary.contains("vimeo") {
        match vimeo_id(primary) {
            Some(id) => Classification::Vimeo {
                url: format!(
                    "https://player.vimeo.com/video/{id}?app_id={VIMEO_APP_ID}&texttrack={}&enablejsapi=1",
                    locale.subtitle_language()
                ),
                video_id: id,
            },
            None => generic(primary),
        }
    } else if primary.contains(LOCAL_MEDIA_MARKER) {
        let sources: Vec<String> = urls
            .iter()
            .filter_map(|u| parse_lenient(u))
            .map(|u| u[Position::BeforePath..].to_string())
            .collect();
        if sources.is_empty() {
            generic(primary)
        } else {
            Classification::Html5Local {
                start_offset: parse_lenient(primary)
                    .and_then(|u| u.fragment().map(start_offset_from_fragment))
                    .unwrap_or(0),
                sources,
            }
        }
    } else {
        generic(primary)
    };

    debug!(url = primary, provider = %classification.provider(), "Classified video link");
    classification
}

fn generic(url: &str) -> Classification {
    Classification::GenericIframe {
        url: url.to_string(),
    }
}

/// Whether a URL can be played inline instead of navigated to
pub fn is_video_link(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    url.contains("youtube.com/watch")
        || url.contains("youtu.be/")
        || url.contains("vimeo")
        || is_adobetv(url)
        || parse_lenient(url).is_some_and(|u| is_local_media_path(u.path()))
}

/// MIME type for a native `<source>` element
pub fn mime_type(src: &str) -> String {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    if path.ends_with(".m3u8") {
        return "application/x-mpegURL".to_string();
    }
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("video/{}", ext.to_lowercase()),
        _ => "video/mp4".to_string(),
    }
}

/// Path-only key used to match a playback URL against promotions
pub fn normalize_video_path(url: &str) -> String {
    parse_lenient(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| url.to_string())
}

fn is_adobetv(url: &str) -> bool {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| rest.starts_with(ADOBETV_HOST))
}

fn is_local_media_path(path: &str) -> bool {
    path.find(LOCAL_MEDIA_MARKER).is_some_and(|i| {
        let rest = &path[i + LOCAL_MEDIA_MARKER.len()..];
        LOCAL_MEDIA_EXTENSIONS.iter().any(|ext| rest.ends_with(ext))
    })
}

fn parse_lenient(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PLACEHOLDER_ORIGIN).ok()?.join(raw).ok()
        }
        Err(_) => None,
    }
}

fn youtube_id(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    let id = parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(str::to_string)
        })?;
    (!id.is_empty()).then_some(id)
}

/// Numeric id anywhere in the path ("/video/123", "/123/abcdef"), else the first segment
fn vimeo_id(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    segments
        .iter()
        .find(|s| s.chars().all(|c| c.is_ascii_digit()))
        .or_else(|| segments.first())
        .map(|s| s.to_string())
}

/// Leading integer of a `t=` fragment; anything else means "from the start"
fn start_offset_from_fragment(fragment: &str) -> u32 {
    fragment
        .strip_prefix("t=")
        .map(|t| {
            let digits: String = t.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .unwrap_or(0)
}
