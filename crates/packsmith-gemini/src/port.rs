//! Core port implementations for `GeminiClient`.

use async_trait::async_trait;
use serde_json::Value;

use packsmith_core::ports::{
    ChatGenerator, ChatRequest, GenerationError, ImageGenerator, ImageRequest,
};

use crate::client::GeminiClient;
use crate::http::HttpBackend;

#[async_trait]
impl<B: HttpBackend> ImageGenerator for GeminiClient<B> {
    async fn generate_images(
        &self,
        request: &ImageRequest,
    ) -> Result<Vec<String>, GenerationError> {
        Ok(self.generate_views(request).await?)
    }

    async fn edit_image(
        &self,
        original: &str,
        mask: &str,
        prompt: &str,
    ) -> Result<Option<String>, GenerationError> {
        Ok(self.masked_edit(original, mask, prompt).await?)
    }
}

#[async_trait]
impl<B: HttpBackend> ChatGenerator for GeminiClient<B> {
    async fn generate(&self, request: &ChatRequest) -> Result<Value, GenerationError> {
        Ok(self.chat(request).await?)
    }
}

/// Stand-in used when no API key is configured; every call fails with
/// `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGemini;

fn not_configured() -> GenerationError {
    GenerationError::NotConfigured("GEMINI_API_KEY is not set".into())
}

#[async_trait]
impl ImageGenerator for UnconfiguredGemini {
    async fn generate_images(
        &self,
        _request: &ImageRequest,
    ) -> Result<Vec<String>, GenerationError> {
        Err(not_configured())
    }

    async fn edit_image(
        &self,
        _original: &str,
        _mask: &str,
        _prompt: &str,
    ) -> Result<Option<String>, GenerationError> {
        Err(not_configured())
    }
}

#[async_trait]
impl ChatGenerator for UnconfiguredGemini {
    async fn generate(&self, _request: &ChatRequest) -> Result<Value, GenerationError> {
        Err(not_configured())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;
    use crate::http::testing::FakeBackend;
    use packsmith_core::ports::ImageWorkflow;
    use serde_json::json;

    #[tokio::test]
    async fn port_maps_quota_errors() {
        let backend = FakeBackend::new().with_error(crate::GeminiError::Api {
            status: 429,
            message: "quota".into(),
        });
        let client = GeminiClient::with_backend(GeminiConfig::new().with_api_key("k"), backend);
        let port: &dyn ImageGenerator = &client;
        let err = port
            .generate_images(&ImageRequest::new("a mug on a desk", ImageWorkflow::Create))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn unconfigured_fails_every_call() {
        let chat: &dyn ChatGenerator = &UnconfiguredGemini;
        let err = chat
            .generate(&ChatRequest {
                prompt: "hi".into(),
                task: packsmith_core::ChatTask::Default,
                response_schema: Some(json!({})),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotConfigured");
    }
}
