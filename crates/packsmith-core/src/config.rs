//! Application configuration read from environment variables.
//!
//! Values come from the process environment (the CLI loads `.env` first).
//! [`AppConfig::from_lookup`] takes any lookup function so tests never touch
//! the real environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_FLASH_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-image-preview";

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Gemini image and chat settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    /// Model used for edits (fast, no thinking support).
    pub flash_model: String,
    /// Model used for new products.
    pub pro_model: String,
    pub thinking_level: Option<String>,
    /// `1K`, `2K` or `4K`.
    pub image_size: Option<String>,
    pub aspect_ratio: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            flash_model: DEFAULT_FLASH_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            thinking_level: Some("low".to_string()),
            image_size: Some("1K".to_string()),
            aspect_ratio: "1:1".to_string(),
        }
    }
}

/// Trellis job polling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrellisSettings {
    pub fal_key: Option<String>,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for TrellisSettings {
    fn default() -> Self {
        Self {
            fal_key: None,
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Everything the service needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub gemini: GeminiSettings,
    pub trellis: TrellisSettings,
    /// Write generated images, downloaded models and state snapshots to disk.
    pub save_artifacts_locally: bool,
    pub artifacts_dir: PathBuf,
    pub db_path: PathBuf,
    pub cache_dir: PathBuf,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiSettings::default(),
            trellis: TrellisSettings::default(),
            save_artifacts_locally: false,
            artifacts_dir: PathBuf::from("artifacts"),
            db_path: PathBuf::from("packsmith.db"),
            cache_dir: PathBuf::from(".packsmith/cache"),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.gemini.api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("GEMINI_FLASH_MODEL") {
            config.gemini.flash_model = model;
        }
        if let Some(model) = get("GEMINI_PRO_MODEL") {
            config.gemini.pro_model = model;
        }
        if let Some(level) = lookup("GEMINI_THINKING_LEVEL") {
            config.gemini.thinking_level = Some(level.trim().to_string()).filter(|v| !v.is_empty());
        }
        if let Some(size) = lookup("GEMINI_IMAGE_SIZE") {
            config.gemini.image_size = Some(size.trim().to_string()).filter(|v| !v.is_empty());
        }
        if let Some(ratio) = get("GEMINI_IMAGE_ASPECT_RATIO") {
            config.gemini.aspect_ratio = ratio;
        }

        config.trellis.fal_key = get("FAL_KEY");
        if let Some(raw) = get("TRELLIS_POLL_INTERVAL_MS") {
            config.trellis.poll_interval =
                Duration::from_millis(parse_number("TRELLIS_POLL_INTERVAL_MS", &raw)?);
        }
        if let Some(raw) = get("TRELLIS_TIMEOUT_SECS") {
            config.trellis.timeout =
                Duration::from_secs(parse_number("TRELLIS_TIMEOUT_SECS", &raw)?);
        }

        if let Some(raw) = get("SAVE_ARTIFACTS_LOCALLY") {
            config.save_artifacts_locally = parse_bool("SAVE_ARTIFACTS_LOCALLY", &raw)?;
        }
        if let Some(dir) = get("ARTIFACTS_DIR") {
            config.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("PACKSMITH_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(dir) = get("PACKSMITH_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("PACKSMITH_PORT") {
            config.port = raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "PACKSMITH_PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(config)
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.gemini.pro_model, DEFAULT_PRO_MODEL);
        assert_eq!(config.gemini.thinking_level.as_deref(), Some("low"));
        assert!(!config.save_artifacts_locally);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_FLASH_MODEL", "flash-x"),
            ("FAL_KEY", "fal-key"),
            ("SAVE_ARTIFACTS_LOCALLY", "True"),
            ("ARTIFACTS_DIR", "/tmp/art"),
            ("PACKSMITH_PORT", "9001"),
            ("TRELLIS_POLL_INTERVAL_MS", "250"),
            ("TRELLIS_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.gemini.flash_model, "flash-x");
        assert_eq!(config.trellis.fal_key.as_deref(), Some("fal-key"));
        assert!(config.save_artifacts_locally);
        assert_eq!(config.artifacts_dir, PathBuf::from("/tmp/art"));
        assert_eq!(config.port, 9001);
        assert_eq!(config.trellis.poll_interval, Duration::from_millis(250));
        assert_eq!(config.trellis.timeout, Duration::from_secs(30));
    }

    #[test]
    fn empty_image_size_disables_it() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_IMAGE_SIZE", "")])).unwrap();
        assert!(config.gemini.image_size.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("PACKSMITH_PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("SAVE_ARTIFACTS_LOCALLY", "maybe")])).is_err());
        let err = AppConfig::from_lookup(lookup(&[("TRELLIS_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(err.to_string().contains("TRELLIS_POLL_INTERVAL_MS"));
    }
}
