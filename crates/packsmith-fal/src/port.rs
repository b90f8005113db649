//! `ModelGenerator` implementations.

use async_trait::async_trait;

use packsmith_core::TrellisArtifacts;
use packsmith_core::ports::{GenerationError, ModelGenerator, ModelRequest, ProgressSink};

use crate::client::FalClient;
use crate::http::HttpBackend;

#[async_trait]
impl<B: HttpBackend> ModelGenerator for FalClient<B> {
    async fn generate_3d(
        &self,
        request: &ModelRequest,
        progress: &dyn ProgressSink,
    ) -> Result<TrellisArtifacts, GenerationError> {
        Ok(self.run(request, progress).await?)
    }
}

/// Stand-in used when `FAL_KEY` is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredFal;

#[async_trait]
impl ModelGenerator for UnconfiguredFal {
    async fn generate_3d(
        &self,
        _request: &ModelRequest,
        _progress: &dyn ProgressSink,
    ) -> Result<TrellisArtifacts, GenerationError> {
        Err(GenerationError::NotConfigured("FAL_KEY is not set".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FalConfig;
    use crate::http::testing::FakeBackend;
    use packsmith_core::ports::NoopProgress;

    #[tokio::test]
    async fn port_maps_rejections() {
        let backend = FakeBackend::new().fail(
            "fal-ai/trellis",
            crate::FalError::Api {
                status: 422,
                message: "bad image".into(),
            },
        );
        let client = FalClient::with_backend(FalConfig::new().with_api_key("k"), backend);
        let port: &dyn ModelGenerator = &client;
        let err = port
            .generate_3d(&ModelRequest::from_images(vec!["x".into()]), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unconfigured_reports_not_configured() {
        let err = UnconfiguredFal
            .generate_3d(&ModelRequest::from_images(vec!["x".into()]), &NoopProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotConfigured");
    }
}
