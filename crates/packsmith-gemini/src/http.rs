//! HTTP backend for the Gemini REST API.
//!
//! The trait lets tests swap in a fake that records request bodies.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::config::GeminiConfig;
use crate::error::{GeminiError, GeminiResult};

/// Posts JSON bodies and returns the decoded JSON answer.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn post_json(&self, url: &Url, body: &Value) -> GeminiResult<Value>;
}

/// Production backend using reqwest, retrying 5xx and network errors with
/// exponential backoff.
pub struct ReqwestBackend {
    client: reqwest::Client,
    api_key: String,
    max_retries: u8,
    retry_base_delay: Duration,
}

impl ReqwestBackend {
    pub fn new(config: &GeminiConfig) -> GeminiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(GeminiError::NotConfigured)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    async fn send_once(&self, url: &Url, body: &Value) -> GeminiResult<Value> {
        let response = self
            .client
            .post(url.as_str())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let text = response.text().await.unwrap_or_default();
        Err(GeminiError::Api {
            status: status.as_u16(),
            message: api_message(&text),
        })
    }
}

/// Pull `error.message` out of a Gemini error body, or return the body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

const fn is_retryable(err: &GeminiError) -> bool {
    match err {
        GeminiError::Api { status, .. } => *status >= 500,
        GeminiError::Network(_) => true,
        _ => false,
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json(&self, url: &Url, body: &Value) -> GeminiResult<Value> {
        let mut attempt: u8 = 0;
        loop {
            match self.send_once(url, body).await {
                Err(e) if is_retryable(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_base_delay * 2u32.pow(u32::from(attempt) - 1);
                    warn!(
                        target: "packsmith.gemini",
                        attempt,
                        error = %e,
                        ?delay,
                        "Retrying Gemini request"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns queued responses in order and records every request.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Mutex<VecDeque<GeminiResult<Value>>>,
        pub requests: Mutex<Vec<(String, Value)>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, response: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        pub fn with_error(self, error: GeminiError) -> Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn recorded(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn post_json(&self, url: &Url, body: &Value) -> GeminiResult<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GeminiError::Missing("canned response")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_requires_key() {
        assert!(matches!(
            ReqwestBackend::new(&GeminiConfig::new()),
            Err(GeminiError::NotConfigured)
        ));
        let backend = ReqwestBackend::new(&GeminiConfig::new().with_api_key("k")).unwrap();
        assert_eq!(backend.max_retries, 2);
    }

    #[test]
    fn extracts_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_message(body), "Quota exceeded for metric");
        assert_eq!(api_message("upstream connect error\n"), "upstream connect error");
    }

    #[test]
    fn only_server_and_network_errors_retry() {
        assert!(is_retryable(&GeminiError::Api {
            status: 503,
            message: String::new()
        }));
        assert!(!is_retryable(&GeminiError::Api {
            status: 429,
            message: String::new()
        }));
        assert!(!is_retryable(&GeminiError::Missing("image")));
    }
}
