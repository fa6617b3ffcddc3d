//! Output formatting for CLI

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON, falling back to an empty object
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Render rows as a rounded table
pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Shorten long cells for table output
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{head}…")
}

#[derive(Debug, Serialize, Tabled)]
pub struct ClassificationRow {
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "Provider")]
    pub provider: String,
    #[tabled(rename = "Playback")]
    pub playback: String,
    #[tabled(rename = "Offset")]
    pub start_offset: u32,
}

#[derive(Debug, Serialize, Tabled)]
pub struct LinkRow {
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "Video")]
    pub video: bool,
}

#[derive(Debug, Serialize, Tabled)]
pub struct AnalyticsRow {
    #[tabled(rename = "Page")]
    pub page: String,
    #[tabled(rename = "Files")]
    pub filenames: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct PromotionRow {
    #[tabled(rename = "Video")]
    pub video: String,
    #[tabled(rename = "Promotion")]
    pub promotion: String,
}
