//! Error types for fastvideo core

use thiserror::Error;

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Overlay engine error types
#[derive(Error, Debug)]
pub enum Error {
    // Feed errors
    #[error("Failed to fetch feed: {0}")]
    FeedFetch(String),

    #[error("Failed to parse feed: {0}")]
    FeedParse(#[from] serde_json::Error),

    #[error("Feed returned HTTP {status}: {path}")]
    FeedStatus { path: String, status: u16 },

    // Reference errors
    #[error("Invalid video URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Video reference has no URLs")]
    EmptyReference,

    // Overlay errors
    #[error("No overlay registered under id: {0}")]
    UnknownOverlay(String),

    #[error("Invalid overlay state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Host operation failed: {0}")]
    Host(String),

    // Network errors
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a host error
    pub fn host(msg: impl Into<String>) -> Self {
        Error::Host(msg.into())
    }

    /// Returns true if retrying the same operation could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::FeedFetch(_) | Error::FeedStatus { .. } => true,
            #[cfg(feature = "http")]
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::FeedFetch(_) => "FEED_FETCH",
            Error::FeedParse(_) => "FEED_PARSE",
            Error::FeedStatus { .. } => "FEED_STATUS",
            Error::InvalidUrl { .. } => "INVALID_URL",
            Error::EmptyReference => "EMPTY_REFERENCE",
            Error::UnknownOverlay(_) => "UNKNOWN_OVERLAY",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Host(_) => "HOST",
            #[cfg(feature = "http")]
            Error::Network(_) => "NETWORK",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
