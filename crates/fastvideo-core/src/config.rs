//! Overlay engine configuration and locale handling

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Vimeo application id embedded in every player URL
pub const VIMEO_APP_ID: &str = "122963";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Locale path prefix of the current page ("" for the default locale, "/fr", "/jp", ...)
    pub locale_prefix: String,
    /// Path of the analytics feed (not locale-scoped)
    pub analytics_feed: String,
    /// Path of the promotions feed, appended to the locale prefix
    pub promotions_feed: String,
    /// Document title used as the history entry title prefix
    pub document_title: String,
    /// Product name reported in analytics events
    pub product: String,
    /// Feed request timeout in milliseconds (reqwest client timeout, or an
    /// `AbortController` deadline in the browser)
    pub request_timeout_ms: u64,
    /// Start native media in overlays opened with `show` as soon as data is available
    pub autoplay: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            locale_prefix: String::new(),
            analytics_feed: "/express/video-analytics.json".to_string(),
            promotions_feed: "/express/video-promotions.json".to_string(),
            document_title: String::new(),
            product: "Adobe Express".to_string(),
            request_timeout_ms: 10_000,
            autoplay: false,
        }
    }
}

impl OverlayConfig {
    /// Config for a locale prefix, everything else default
    pub fn for_locale(prefix: impl Into<String>) -> Self {
        Self {
            locale_prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Active locale
    pub fn locale(&self) -> Locale {
        Locale::from_prefix(&self.locale_prefix)
    }

    /// Locale-scoped promotions feed path
    pub fn promotions_feed_path(&self) -> String {
        format!("{}{}", self.locale_prefix.trim_end_matches('/'), self.promotions_feed)
    }

    /// Check the config for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.analytics_feed.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "analytics feed must be an absolute path: {}",
                self.analytics_feed
            )));
        }
        if !self.promotions_feed.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "promotions feed must be an absolute path: {}",
                self.promotions_feed
            )));
        }
        if !self.locale_prefix.is_empty() && !self.locale_prefix.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "locale prefix must be empty or start with '/': {}",
                self.locale_prefix
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Page locale, identified by its path prefix
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locale {
    code: String,
}

impl Locale {
    /// Locale from a path prefix such as "/fr" or ""
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            code: prefix.trim_matches('/').to_lowercase(),
        }
    }

    /// Locale code, empty for the default locale
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Subtitle track language available on hosted players for this locale
    pub fn subtitle_language(&self) -> &'static str {
        match self.code.as_str() {
            "fr" => "fr",
            "de" => "de",
            "jp" => "ja",
            _ => "en",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_language_table() {
        assert_eq!(Locale::from_prefix("/fr").subtitle_language(), "fr");
        assert_eq!(Locale::from_prefix("/de").subtitle_language(), "de");
        assert_eq!(Locale::from_prefix("/jp").subtitle_language(), "ja");
        assert_eq!(Locale::from_prefix("/es").subtitle_language(), "en");
        assert_eq!(Locale::from_prefix("").subtitle_language(), "en");
    }

    #[test]
    fn test_promotions_feed_is_locale_prefixed() {
        assert_eq!(
            OverlayConfig::for_locale("/fr").promotions_feed_path(),
            "/fr/express/video-promotions.json"
        );
        assert_eq!(
            OverlayConfig::default().promotions_feed_path(),
            "/express/video-promotions.json"
        );
    }

    #[test]
    fn test_validate() {
        assert!(OverlayConfig::default().validate().is_ok());
        assert!(OverlayConfig::for_locale("fr").validate().is_err());

        let config = OverlayConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"localePrefix":"/de","documentTitle":"Express"}"#).unwrap();
        assert_eq!(config.locale().code(), "de");
        assert_eq!(config.document_title, "Express");
        assert_eq!(config.analytics_feed, "/express/video-analytics.json");
        assert!(!config.autoplay);

        let config: OverlayConfig = serde_json::from_str(r#"{"autoplay":true}"#).unwrap();
        assert!(config.autoplay);
    }
}
