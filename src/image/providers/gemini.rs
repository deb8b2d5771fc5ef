//! Gemini (Google) multimodal outfit editing.
//!
//! The source portrait and the optional reference garment are both sent as
//! inline image parts, with the composed instruction text between them.

use crate::error::{Result, TryOnError};
use crate::image::prompt::compose_instruction;
use crate::image::provider::{ImageEditor, DEFAULT_TIMEOUT};
use crate::image::providers::{http_client, require_api_key, success_body};
use crate::image::types::{DataUri, EditRequest, ImageLocator, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiEditorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings and no credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded with the `GOOGLE_API_KEY` env var, if set.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the client-side timeout for each edit call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the editor. Fails without a credential.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = require_api_key(self.api_key, API_KEY_ENV)?;

        Ok(GeminiEditor {
            client: http_client(self.timeout)?,
            api_key,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

/// Gemini outfit editor.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new [`GeminiEditorBuilder`].
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<ImageLocator> {
        request.validate()?;
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_edit_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            reference = request.has_reference(),
            "submitting Gemini edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let text = success_body(response).await?;

        match GeminiOutcome::decode(&text) {
            GeminiOutcome::Image(data) => {
                tracing::debug!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Gemini edit complete"
                );
                Ok(ImageLocator::from_base64_png(&data))
            }
            GeminiOutcome::Missing(reason) => Err(TryOnError::NoImage(reason)),
        }
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> Result<ImageLocator> {
        self.edit_impl(request).await.inspect_err(|e| {
            tracing::warn!(provider = "gemini", error = %e, "edit failed");
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

impl GeminiRequestPart {
    fn image(uri: &DataUri) -> Self {
        Self::InlineData {
            inline_data: GeminiInlineData {
                mime_type: uri.mime_type().to_string(),
                data: uri.payload().to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        // Order matters: portrait, instruction, then the reference garment.
        let mut parts = vec![
            GeminiRequestPart::image(&req.source_image),
            GeminiRequestPart::Text {
                text: compose_instruction(&req.prompt, req.has_reference()),
            },
        ];

        if let Some(ref reference) = req.reference_image {
            parts.push(GeminiRequestPart::image(reference));
        }

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default)]
    data: String,
}

/// What a `generateContent` body resolved to.
#[derive(Debug, PartialEq, Eq)]
enum GeminiOutcome {
    /// Base64 bytes of the first inline image part.
    Image(String),
    /// No usable image, with the reason.
    Missing(String),
}

impl GeminiOutcome {
    fn decode(body: &str) -> Self {
        let response: GeminiResponse = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => {
                return Self::Missing(format!("unreadable Gemini response: {e}"));
            }
        };

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Self::Missing(format!("prompt blocked by Gemini: {reason}"));
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Self::Missing("no candidates in Gemini response".into());
        };

        let image = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .filter_map(|p| p.inline_data)
            .map(|d| d.data)
            .find(|data| !data.is_empty());

        match (image, candidate.finish_reason) {
            (Some(data), _) => Self::Image(data),
            (None, Some(reason)) => {
                Self::Missing(format!("Gemini returned no image (finish reason {reason})"))
            }
            (None, None) => Self::Missing("no image data in Gemini response".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::prompt::{IDENTITY_DIRECTIVE, REFERENCE_INSTRUCTION};

    fn source() -> DataUri {
        DataUri::parse("data:image/png;base64,U09VUkNF").unwrap()
    }

    fn reference() -> DataUri {
        DataUri::parse("data:image/jpeg;base64,UkVG").unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::FlashImage.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::ProImage.as_str(), "gemini-3-pro-image-preview");
        assert_eq!(GeminiModel::default(), GeminiModel::FlashImage);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let editor = GeminiEditorBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::ProImage)
            .build()
            .unwrap();
        assert_eq!(editor.model(), GeminiModel::ProImage);
        assert_eq!(editor.kind(), ProviderKind::Gemini);
    }

    #[test]
    fn test_builder_without_key_fails() {
        let result = GeminiEditorBuilder::new().build();
        assert!(matches!(result, Err(TryOnError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_base_url() {
        let builder = GeminiEditorBuilder::new().base_url("http://localhost:9/");
        assert_eq!(builder.base_url, "http://localhost:9");
    }

    #[test]
    fn test_request_parts_without_reference() {
        let req = EditRequest::new(source(), "A camel trench coat");
        let json = serde_json::to_value(GeminiRequest::from_edit_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["data"], "U09VUkNF");
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");

        let text = parts[1]["text"].as_str().unwrap();
        assert!(text.starts_with(IDENTITY_DIRECTIVE));
        assert!(text.ends_with("A camel trench coat"));
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_request_parts_with_reference() {
        let req = EditRequest::new(source(), "Match this jacket").with_reference(reference());
        let json = serde_json::to_value(GeminiRequest::from_edit_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[1]["text"]
            .as_str()
            .unwrap()
            .ends_with(REFERENCE_INSTRUCTION));
        assert_eq!(parts[2]["inlineData"]["data"], "UkVG");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_outcome_first_inline_image_wins() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your outfit"},
                        {"inlineData": {"mimeType": "image/png", "data": "FIRST"}},
                        {"inlineData": {"mimeType": "image/png", "data": "SECOND"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(
            GeminiOutcome::decode(json),
            GeminiOutcome::Image("FIRST".into())
        );
    }

    #[test]
    fn test_outcome_text_only_is_missing() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "no"}]}}]}"#;
        assert!(matches!(
            GeminiOutcome::decode(json),
            GeminiOutcome::Missing(_)
        ));
    }

    #[test]
    fn test_outcome_prompt_blocked() {
        let json = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        match GeminiOutcome::decode(json) {
            GeminiOutcome::Missing(reason) => assert!(reason.contains("SAFETY")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_outcome_finish_reason_reported() {
        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        match GeminiOutcome::decode(json) {
            GeminiOutcome::Missing(reason) => assert!(reason.contains("IMAGE_SAFETY")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_outcome_malformed_body_is_missing() {
        assert!(matches!(
            GeminiOutcome::decode("<html>gateway</html>"),
            GeminiOutcome::Missing(_)
        ));
        assert!(matches!(
            GeminiOutcome::decode(r#"{"candidates": "nope"}"#),
            GeminiOutcome::Missing(_)
        ));
    }
}
