//! Player surface construction
//!
//! Turns a [`Classification`] into a description of the element the host
//! must mount: a native media element with fallback sources, or an iframe
//! for hosted players.

use crate::classify::{mime_type, Classification};
use crate::Provider;
use serde::{Deserialize, Serialize};

/// Permissions granted to hosted player iframes
pub const EMBED_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; fullscreen";

/// Permissions granted to the AdobeTV player iframe
pub const ADOBETV_ALLOW: &str = "autoplay";

/// One `<source>` of a native media element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub src: String,
    pub mime: String,
}

/// Playback surface to mount inside an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Surface {
    /// Native `<video controls playsinline>` element
    Native {
        sources: Vec<VideoSource>,
        start_offset: u32,
        autoplay: bool,
        controls: bool,
        plays_inline: bool,
    },
    /// Hosted player in an iframe
    Iframe {
        title: String,
        src: String,
        /// Attribute name/value pairs, in insertion order
        attributes: Vec<(String, String)>,
    },
}

impl Surface {
    /// Whether the surface is a native media element
    pub fn is_native(&self) -> bool {
        matches!(self, Surface::Native { .. })
    }

    /// The URL loaded first
    pub fn primary_src(&self) -> &str {
        match self {
            Surface::Native { sources, .. } => sources.first().map(|s| s.src.as_str()).unwrap_or_default(),
            Surface::Iframe { src, .. } => src,
        }
    }

    /// Look up an iframe attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Surface::Iframe { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Surface::Native { .. } => None,
        }
    }
}

/// A surface plus what the overlay needs to know about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSurface {
    pub provider: Provider,
    /// CSS class added to the container
    pub class_name: String,
    pub surface: Surface,
    /// A close control is always appended next to the surface
    pub close_control: bool,
}

/// Build the surface for a classification; `None` when there is nothing to play
pub fn build_surface(classification: &Classification, title: &str, autoplay: bool) -> Option<PlayerSurface> {
    let primary = classification.primary_url()?;
    if primary.is_empty() {
        return None;
    }

    let provider = classification.provider();
    let surface = match classification {
        Classification::Html5Local { sources, start_offset } => Surface::Native {
            sources: sources
                .iter()
                .map(|src| VideoSource {
                    mime: mime_type(src),
                    src: src.clone(),
                })
                .collect(),
            start_offset: *start_offset,
            autoplay,
            controls: true,
            plays_inline: true,
        },
        Classification::AdobeTv { url } => {
            let src = if autoplay {
                format!("{url}/?autoplay=true")
            } else {
                url.clone()
            };
            Surface::Iframe {
                title: title.to_string(),
                src,
                attributes: attrs(&[
                    ("frameborder", "0"),
                    ("allow", ADOBETV_ALLOW),
                    ("webkitallowfullscreen", ""),
                    ("mozallowfullscreen", ""),
                    ("allowfullscreen", ""),
                    ("scrolling", "no"),
                ]),
            }
        }
        Classification::YouTube { url, .. }
        | Classification::Vimeo { url, .. }
        | Classification::GenericIframe { url } => Surface::Iframe {
            title: title.to_string(),
            src: url.clone(),
            attributes: attrs(&[
                ("frameborder", "0"),
                ("allow", EMBED_ALLOW),
                ("allowfullscreen", ""),
            ]),
        },
    };

    Some(PlayerSurface {
        provider,
        class_name: provider.tag().to_string(),
        surface,
        close_control: true,
    })
}

fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
