//! Wire types for `generateContent` requests and responses.

use serde::Deserialize;
use serde_json::{Value, json};

use packsmith_core::data_url::{self, DataUrl};

use crate::error::{GeminiError, GeminiResult};

/// Finish reasons that mean the output was withheld.
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_SAFETY",
    "BLOCKLIST",
    "SPII",
];

/// An `inlineData` part for an image given as a data URL or bare base64.
///
/// Bare payloads are assumed to be PNG.
pub fn image_part(image: &str) -> GeminiResult<Value> {
    let (mime_type, data) = if data_url::is_data_url(image) {
        let parsed = DataUrl::parse(image)
            .ok_or_else(|| GeminiError::InvalidImage("malformed data URL".into()))?;
        (parsed.mime_type.clone(), parsed.base64())
    } else {
        let trimmed = image.trim();
        if trimmed.is_empty() {
            return Err(GeminiError::InvalidImage("empty image".into()));
        }
        ("image/png".to_string(), trimmed.to_string())
    };
    Ok(json!({ "inlineData": { "mimeType": mime_type, "data": data } }))
}

/// Request body for an image call: prompt first, then reference images.
pub fn image_request_body(
    prompt: &str,
    images: &[Value],
    aspect_ratio: &str,
    image_size: Option<&str>,
) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    parts.extend(images.iter().cloned());
    let mut image_config = json!({ "aspectRatio": aspect_ratio });
    if let Some(size) = image_size {
        image_config["imageSize"] = json!(size);
    }
    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "imageConfig": image_config },
    })
}

/// Request body for a chat call.
pub fn chat_request_body(
    prompt: &str,
    temperature: f32,
    thinking_level: Option<&str>,
    response_schema: Option<&Value>,
) -> Value {
    let mut config = json!({ "temperature": temperature });
    if let Some(level) = thinking_level {
        config["thinkingConfig"] = json!({ "thinkingLevel": level });
    }
    if let Some(schema) = response_schema {
        config["responseMimeType"] = json!("application/json");
        config["responseSchema"] = schema.clone();
    }
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": config,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default = "default_mime", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    /// Error when the prompt or the first candidate was blocked.
    fn check_blocked(&self) -> GeminiResult<()> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GeminiError::Blocked { reason });
        }
        if let Some(reason) = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
        {
            return Err(GeminiError::Blocked {
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// First inline image as a data URL.
    pub fn first_image(&self) -> GeminiResult<String> {
        if let Some(data) = self.parts().find_map(|p| p.inline_data.as_ref()) {
            return Ok(data_url::from_base64(&data.mime_type, &data.data));
        }
        self.check_blocked()?;
        Err(GeminiError::Missing("image"))
    }

    /// Concatenated text parts.
    pub fn text(&self) -> GeminiResult<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if !text.is_empty() {
            return Ok(text);
        }
        self.check_blocked()?;
        Err(GeminiError::Missing("text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(v: Value) -> GenerateContentResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn image_body_puts_prompt_before_references() {
        let refs = vec![image_part("data:image/jpeg;base64,AAAA").unwrap()];
        let body = image_request_body("a mug", &refs, "1:1", Some("1K"));
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "a mug");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["generationConfig"]["imageConfig"]["imageSize"], "1K");
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn bare_base64_is_png_and_bad_data_url_fails() {
        let part = image_part("iVBORw0KGgo=").unwrap();
        assert_eq!(part["inlineData"]["mimeType"], "image/png");
        assert!(image_part("data:image/png;base64,@@").is_err());
        assert!(image_part("  ").is_err());
    }

    #[test]
    fn chat_body_with_schema_requests_json() {
        let schema = json!({"type": "object"});
        let body = chat_request_body("hi", 0.1, Some("low"), Some(&schema));
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["thinkingConfig"]["thinkingLevel"], "low");
        assert!((config["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn extracts_first_inline_image() {
        let resp = parse(json!({
            "candidates": [{"content": {"parts": [
                {"text": "here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "QUJD"}}
            ]}}]
        }));
        assert_eq!(resp.first_image().unwrap(), "data:image/png;base64,QUJD");
    }

    #[test]
    fn blocked_prompt_is_safety_error() {
        let resp = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert!(matches!(resp.first_image(), Err(GeminiError::Blocked { .. })));

        let resp = parse(json!({"candidates": [{"finishReason": "IMAGE_SAFETY"}]}));
        assert!(matches!(resp.first_image(), Err(GeminiError::Blocked { .. })));

        let resp = parse(json!({
            "candidates": [{"finishReason": "STOP", "content": {"parts": []}}]
        }));
        assert!(matches!(resp.first_image(), Err(GeminiError::Missing("image"))));
    }

    #[test]
    fn joins_text_parts() {
        let resp = parse(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }));
        assert_eq!(resp.text().unwrap(), "{\"a\":1}");
    }
}
