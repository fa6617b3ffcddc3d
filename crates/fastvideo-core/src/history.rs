//! Deep-linkable history entries for opened overlays
//!
//! Only the push side lives here; back/forward handling belongs to the
//! page router, which can drive `show`/`close` from the pushed state.

use crate::slugify;
use serde::{Deserialize, Serialize};

/// State object stored with the history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub url: String,
    pub title: String,
}

/// A history entry to push when an overlay opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: HistoryState,
    /// Document title for the entry
    pub page_title: String,
    /// Visible URL fragment, including the leading '#'
    pub hash: String,
}

impl HistoryEntry {
    pub fn new(url: &str, title: &str, document_title: &str) -> Self {
        let page_title = if document_title.is_empty() {
            title.to_string()
        } else {
            format!("{document_title} | {title}")
        };
        Self {
            state: HistoryState {
                url: url.to_string(),
                title: title.to_string(),
            },
            page_title,
            hash: format!("#{}", slugify(title)),
        }
    }
}
