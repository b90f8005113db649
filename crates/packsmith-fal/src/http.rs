//! HTTP backend for the fal.ai queue API.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::FalConfig;
use crate::error::{FalError, FalResult};

#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn post_json(&self, url: &Url, body: &Value) -> FalResult<Value>;

    async fn get_json(&self, url: &Url) -> FalResult<Value>;
}

/// Production backend; every call carries `Authorization: Key <FAL_KEY>`.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_header: String,
}

impl ReqwestBackend {
    pub fn new(config: &FalConfig) -> FalResult<Self> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(FalError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            auth_header: format!("Key {key}"),
        })
    }

    async fn decode(response: reqwest::Response) -> FalResult<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").map(ToString::to_string))
            .unwrap_or(body);
        Err(FalError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json(&self, url: &Url, body: &Value) -> FalResult<Value> {
        let response = self
            .client
            .post(url.as_str())
            .header("Authorization", &self.auth_header)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_json(&self, url: &Url) -> FalResult<Value> {
        let response = self
            .client
            .get(url.as_str())
            .header("Authorization", &self.auth_header)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend: queued replies are matched by URL substring in order.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<VecDeque<(String, FalResult<Value>)>>,
        pub calls: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, url_contains: &str, reply: Value) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back((url_contains.to_string(), Ok(reply)));
            self
        }

        pub fn fail(self, url_contains: &str, error: FalError) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back((url_contains.to_string(), Err(error)));
            self
        }

        fn next(&self, url: &Url, body: Option<&Value>) -> FalResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), body.cloned()));
            let mut replies = self.replies.lock().unwrap();
            let position = replies
                .iter()
                .position(|(pattern, _)| url.as_str().contains(pattern.as_str()));
            match position.and_then(|i| replies.remove(i)) {
                Some((_, reply)) => reply,
                None => Err(FalError::Api {
                    status: 404,
                    message: format!("no scripted reply for {url}"),
                }),
            }
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn post_json(&self, url: &Url, body: &Value) -> FalResult<Value> {
            self.next(url, Some(body))
        }

        async fn get_json(&self, url: &Url) -> FalResult<Value> {
            self.next(url, None)
        }
    }
}
