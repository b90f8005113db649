//! Gemini client: model selection, multi-view generation and chat.

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use url::Url;

use packsmith_core::ports::{ChatRequest, ImageRequest, ImageWorkflow};
use packsmith_core::prompts;

use crate::config::GeminiConfig;
use crate::error::{GeminiError, GeminiResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{
    GenerateContentResponse, chat_request_body, image_part, image_request_body,
};

/// Gemini client over the reqwest backend.
pub type DefaultGeminiClient = GeminiClient<ReqwestBackend>;

/// Client for the Gemini `generateContent` API, generic over its HTTP backend.
pub struct GeminiClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: GeminiConfig,
}

impl DefaultGeminiClient {
    /// Fails with [`GeminiError::NotConfigured`] when no API key is set.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        info!(
            target: "packsmith.gemini",
            pro = %config.pro_model,
            flash = %config.flash_model,
            "Gemini client initialised"
        );
        Ok(Self { backend, config })
    }
}

impl<B: HttpBackend> GeminiClient<B> {
    #[cfg(test)]
    pub(crate) const fn with_backend(config: GeminiConfig, backend: B) -> Self {
        Self { backend, config }
    }

    /// New products use the pro model, edits the flash model.
    pub fn model_for(&self, workflow: ImageWorkflow) -> &str {
        match workflow {
            ImageWorkflow::Create => &self.config.pro_model,
            ImageWorkflow::Edit => &self.config.flash_model,
        }
    }

    fn endpoint(&self, model: &str) -> GeminiResult<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{base}/v1beta/models/{model}:generateContent"
        ))?)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &Value,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.endpoint(model)?;
        let raw = self.backend.post_json(&url, body).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// One image from a prompt and optional reference images.
    async fn single_image(
        &self,
        model: &str,
        prompt: &str,
        references: &[String],
    ) -> GeminiResult<String> {
        let parts = references
            .iter()
            .map(|r| image_part(r))
            .collect::<GeminiResult<Vec<_>>>()?;
        let body = image_request_body(
            prompt,
            &parts,
            &self.config.aspect_ratio,
            self.config.image_size.as_deref(),
        );
        debug!(
            target: "packsmith.gemini",
            model,
            prompt_len = prompt.len(),
            references = parts.len(),
            "Calling Gemini"
        );
        self.generate_content(model, &body).await?.first_image()
    }

    /// Prompt sent for one view.
    ///
    /// Textures go through unchanged; views with a reference get the
    /// edit-the-same-product wrapper; the rest get the studio-photo wrapper.
    fn view_prompt(request: &ImageRequest, references: &[String], index: usize) -> String {
        if request.is_texture {
            request.prompt.clone()
        } else if references.is_empty() {
            prompts::product_photo_prompt(&request.prompt, index)
        } else {
            prompts::reference_view_prompt(
                &request.prompt,
                request.base_description.as_deref(),
                index,
            )
        }
    }

    /// Generate `image_count` views.
    ///
    /// Create: view 0 from text, later views use view 0 as reference.
    /// Edit: every view uses the supplied references. Textures always carry
    /// the supplied references. Failed views are skipped; the last error is
    /// returned only when nothing succeeded.
    pub async fn generate_views(&self, request: &ImageRequest) -> GeminiResult<Vec<String>> {
        let model = self.model_for(request.workflow).to_string();
        info!(
            target: "packsmith.gemini",
            workflow = %request.workflow,
            model = %model,
            count = request.image_count,
            "Generating images"
        );

        let mut images: Vec<String> = Vec::new();
        let mut last_error = None;
        for index in 0..request.image_count as usize {
            let references: Vec<String> = match (request.workflow, index) {
                _ if request.is_texture => request.reference_images.clone(),
                (ImageWorkflow::Create, 0) => Vec::new(),
                (ImageWorkflow::Create, _) => images.first().cloned().into_iter().collect(),
                (ImageWorkflow::Edit, _) => request.reference_images.clone(),
            };
            let prompt = Self::view_prompt(request, &references, index);
            match self.single_image(&model, &prompt, &references).await {
                Ok(image) => {
                    info!(
                        target: "packsmith.gemini",
                        view = index + 1,
                        total = request.image_count,
                        "Image generated"
                    );
                    images.push(image);
                }
                Err(e) => {
                    error!(
                        target: "packsmith.gemini",
                        view = index + 1,
                        total = request.image_count,
                        error = %e,
                        "Image generation failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        info!(
            target: "packsmith.gemini",
            generated = images.len(),
            total = request.image_count,
            "Finished image generation"
        );
        match last_error {
            Some(e) if images.is_empty() => Err(e),
            _ => Ok(images),
        }
    }

    /// Masked edit of one image with the flash model.
    pub async fn masked_edit(
        &self,
        original: &str,
        mask: &str,
        prompt: &str,
    ) -> GeminiResult<Option<String>> {
        let parts = vec![image_part(original)?, image_part(mask)?];
        let body = image_request_body(
            &prompts::masked_edit_prompt(prompt),
            &parts,
            &self.config.aspect_ratio,
            self.config.image_size.as_deref(),
        );
        let model = self.config.flash_model.clone();
        match self.generate_content(&model, &body).await?.first_image() {
            Ok(image) => Ok(Some(image)),
            Err(GeminiError::Missing(_)) => {
                warn!(target: "packsmith.gemini", "Masked edit returned no image");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Chat call; JSON when a schema is given, otherwise `{"text": ...}`.
    pub async fn chat(&self, request: &ChatRequest) -> GeminiResult<Value> {
        let body = chat_request_body(
            &request.prompt,
            request.task.temperature(),
            self.config.thinking_level.as_deref(),
            request.response_schema.as_ref(),
        );
        let model = self.config.chat_model.clone();
        info!(
            target: "packsmith.gemini",
            model = %model,
            task = %request.task,
            structured = request.response_schema.is_some(),
            "Chat request"
        );
        let text = self.generate_content(&model, &body).await?.text()?;
        if request.response_schema.is_some() {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(json!({ "text": text }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;
    use packsmith_core::ports::ChatTask;

    fn image_response(data: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": data}}
        ]}}]})
    }

    fn client(backend: FakeBackend) -> GeminiClient<FakeBackend> {
        GeminiClient::with_backend(GeminiConfig::new().with_api_key("k"), backend)
    }

    #[tokio::test]
    async fn create_uses_pro_model_and_first_view_as_reference() {
        let backend = FakeBackend::new()
            .with_response(image_response("VjE="))
            .with_response(image_response("VjI="))
            .with_response(image_response("VjM="));
        let client = client(backend);
        let request = ImageRequest::new("a ceramic mug", ImageWorkflow::Create).with_count(3);
        let images = client.generate_views(&request).await.unwrap();
        assert_eq!(images.len(), 3);

        let calls = client.backend.recorded();
        assert!(calls[0].0.ends_with("/v1beta/models/gemini-3-pro-image-preview:generateContent"));
        let first_parts = calls[0].1["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(first_parts.len(), 1);
        assert!(
            first_parts[0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Create a professional studio product photograph of a ceramic mug")
        );

        let second_parts = calls[1].1["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(second_parts[1]["inlineData"]["data"], "VjE=");
        assert!(second_parts[0]["text"].as_str().unwrap().contains("45-degree angle"));
    }

    #[tokio::test]
    async fn edit_uses_flash_and_supplied_references() {
        let backend = FakeBackend::new().with_response(image_response("RQ=="));
        let client = client(backend);
        let request = ImageRequest::new("make it blue", ImageWorkflow::Edit)
            .with_references(vec!["data:image/png;base64,T0xE".into()])
            .with_base_description(Some("a ceramic mug".into()));
        client.generate_views(&request).await.unwrap();

        let calls = client.backend.recorded();
        assert!(calls[0].0.contains("gemini-2.5-flash-image"));
        let text = calls[0].1["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("BASE PRODUCT: a ceramic mug"));
        assert!(text.contains("USER EDIT REQUEST: make it blue"));
    }

    #[tokio::test]
    async fn texture_prompt_is_sent_verbatim() {
        let client = client(FakeBackend::new().with_response(image_response("VA==")));
        let request = ImageRequest::new("exact panel prompt", ImageWorkflow::Create).texture();
        client.generate_views(&request).await.unwrap();
        let calls = client.backend.recorded();
        assert_eq!(calls[0].1["contents"][0]["parts"][0]["text"], "exact panel prompt");
    }

    #[tokio::test]
    async fn partial_failures_are_skipped_total_failure_is_reported() {
        let backend = FakeBackend::new()
            .with_response(image_response("VjE="))
            .with_error(GeminiError::Api { status: 500, message: "boom".into() });
        let client = client(backend);
        let request = ImageRequest::new("a ceramic mug", ImageWorkflow::Create).with_count(2);
        assert_eq!(client.generate_views(&request).await.unwrap().len(), 1);

        let backend = FakeBackend::new().with_error(GeminiError::Api {
            status: 429,
            message: "quota".into(),
        });
        let client = self::client(backend);
        let err = client
            .generate_views(&ImageRequest::new("a ceramic mug", ImageWorkflow::Create))
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn masked_edit_sends_original_then_mask() {
        let client = client(FakeBackend::new().with_response(image_response("T1VU")));
        let out = client
            .masked_edit("data:image/png;base64,T1JJRw==", "TUFTSw==", "remove the logo")
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("data:image/png;base64,T1VU"));
        let calls = client.backend.recorded();
        let parts = calls[0].1["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1]["inlineData"]["data"], "T1JJRw==");
        assert_eq!(parts[2]["inlineData"]["data"], "TUFTSw==");
    }

    #[tokio::test]
    async fn chat_returns_text_or_parsed_json() {
        let text_reply = json!({"candidates": [{"content": {"parts": [{"text": "hello"}]}}]});
        let json_reply = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"name\":\"mug\"}"}]}}]
        });
        let client = client(FakeBackend::new().with_response(text_reply).with_response(json_reply));

        let plain = ChatRequest {
            prompt: "hi".into(),
            task: ChatTask::Creative,
            response_schema: None,
        };
        assert_eq!(client.chat(&plain).await.unwrap(), json!({"text": "hello"}));

        let structured = ChatRequest {
            prompt: "extract".into(),
            task: ChatTask::Extraction,
            response_schema: Some(json!({"type": "object"})),
        };
        assert_eq!(client.chat(&structured).await.unwrap(), json!({"name": "mug"}));
        let calls = client.backend.recorded();
        assert!(calls[1].0.contains(crate::config::DEFAULT_CHAT_MODEL));
    }
}
