//! Public configuration for the Gemini client.

use std::time::Duration;

use packsmith_core::GeminiSettings;
use packsmith_core::config::{DEFAULT_FLASH_MODEL, DEFAULT_PRO_MODEL};

/// Default model for chat calls.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";

/// Configuration for the Gemini client.
///
/// # Example
///
/// ```
/// use packsmith_gemini::GeminiConfig;
/// use std::time::Duration;
///
/// let config = GeminiConfig::new()
///     .with_api_key("key")
///     .with_timeout(Duration::from_secs(90))
///     .with_image_size(Some("2K".into()));
/// ```
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    /// Used for edits and masked edits.
    pub(crate) flash_model: String,
    /// Used for new products.
    pub(crate) pro_model: String,
    pub(crate) chat_model: String,
    /// Only sent with chat calls; image models reject it.
    pub(crate) thinking_level: Option<String>,
    pub(crate) image_size: Option<String>,
    pub(crate) aspect_ratio: String,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u8,
    pub(crate) retry_base_delay: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            flash_model: DEFAULT_FLASH_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            thinking_level: Some("low".to_string()),
            image_size: Some("1K".to_string()),
            aspect_ratio: "1:1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

impl GeminiConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from application settings.
    pub fn from_settings(settings: &GeminiSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            flash_model: settings.flash_model.clone(),
            pro_model: settings.pro_model.clone(),
            thinking_level: settings.thinking_level.clone(),
            image_size: settings.image_size.clone(),
            aspect_ratio: settings.aspect_ratio.clone(),
            ..Self::default()
        }
    }

    /// Defaults to `https://generativelanguage.googleapis.com`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_models(mut self, flash: impl Into<String>, pro: impl Into<String>) -> Self {
        self.flash_model = flash.into();
        self.pro_model = pro.into();
        self
    }

    #[must_use]
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    #[must_use]
    pub fn with_thinking_level(mut self, level: Option<String>) -> Self {
        self.thinking_level = level;
        self
    }

    #[must_use]
    pub fn with_image_size(mut self, size: Option<String>) -> Self {
        self.image_size = size;
        self
    }

    #[must_use]
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    /// Per-request timeout. Defaults to 120 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries for 5xx and network errors. Defaults to 2.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GeminiConfig::new();
        assert_eq!(config.flash_model, "gemini-2.5-flash-image");
        assert_eq!(config.pro_model, "gemini-3-pro-image-preview");
        assert_eq!(config.aspect_ratio, "1:1");
        assert!(!config.is_configured());
    }

    #[test]
    fn from_settings_copies_models_and_key() {
        let settings = GeminiSettings {
            api_key: Some("k".into()),
            flash_model: "flash-x".into(),
            image_size: None,
            ..GeminiSettings::default()
        };
        let config = GeminiConfig::from_settings(&settings);
        assert!(config.is_configured());
        assert_eq!(config.flash_model, "flash-x");
        assert!(config.image_size.is_none());
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn empty_key_is_not_configured() {
        assert!(!GeminiConfig::new().with_api_key("").is_configured());
    }
}
