//! Public configuration for the fal.ai client.

use std::time::Duration;

use packsmith_core::TrellisSettings;

/// Single-image Trellis app.
pub const TRELLIS_APP: &str = "fal-ai/trellis";
/// Multi-view Trellis app.
pub const TRELLIS_MULTI_APP: &str = "fal-ai/trellis/multi";

/// Configuration for the fal.ai queue client.
///
/// # Example
///
/// ```
/// use packsmith_fal::FalConfig;
/// use std::time::Duration;
///
/// let config = FalConfig::new()
///     .with_api_key("key")
///     .with_poll_interval(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct FalConfig {
    pub(crate) queue_base: String,
    pub(crate) api_key: Option<String>,
    /// Fixed delay between status polls.
    pub(crate) poll_interval: Duration,
    /// Give up on a job after this long.
    pub(crate) timeout: Duration,
    /// Timeout of each HTTP call.
    pub(crate) request_timeout: Duration,
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            queue_base: "https://queue.fal.run".to_string(),
            api_key: None,
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl FalConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &TrellisSettings) -> Self {
        Self {
            api_key: settings.fal_key.clone(),
            poll_interval: settings.poll_interval,
            timeout: settings.timeout,
            ..Self::default()
        }
    }

    /// Defaults to `https://queue.fal.run`.
    #[must_use]
    pub fn with_queue_base(mut self, url: impl Into<String>) -> Self {
        self.queue_base = url.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
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
    fn settings_carry_over() {
        let settings = TrellisSettings {
            fal_key: Some("abc".into()),
            poll_interval: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
        };
        let config = FalConfig::from_settings(&settings);
        assert!(config.is_configured());
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.queue_base, "https://queue.fal.run");
    }
}
