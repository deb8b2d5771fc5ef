//! Image-generation REST provider (`POST /v1/images/generations`).
//!
//! The source portrait travels as a full data URI in `image_url`. This
//! endpoint takes a single image, so a reference garment is only mentioned
//! in the instruction text and its pixels are never sent.

use crate::error::{Result, TryOnError};
use crate::image::prompt::compose_instruction;
use crate::image::provider::{ImageEditor, DEFAULT_TIMEOUT};
use crate::image::providers::{http_client, require_api_key, success_body};
use crate::image::types::{EditRequest, ImageLocator, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.together.xyz";
const DEFAULT_MODEL: &str = "black-forest-labs/FLUX.1-kontext-pro";
const DEFAULT_SIZE: (u32, u32) = (1024, 1024);
const API_KEY_ENV: &str = "TOGETHER_API_KEY";

/// Builder for [`RestEditor`].
#[derive(Debug, Clone)]
pub struct RestEditorBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    width: u32,
    height: u32,
    timeout: Duration,
}

impl Default for RestEditorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RestEditorBuilder {
    /// Creates a new builder with default settings and no credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded with the `TOGETHER_API_KEY` env var, if set.
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

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the output size in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the client-side timeout for each edit call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the editor. Fails without a credential.
    pub fn build(self) -> Result<RestEditor> {
        let api_key = require_api_key(self.api_key, API_KEY_ENV)?;
        if self.width == 0 || self.height == 0 {
            return Err(TryOnError::Configuration(format!(
                "invalid output size {}x{}",
                self.width, self.height
            )));
        }

        Ok(RestEditor {
            client: http_client(self.timeout)?,
            api_key,
            model: self.model,
            endpoint: format!("{}/v1/images/generations", self.base_url),
            width: self.width,
            height: self.height,
        })
    }
}

/// Outfit editor backed by an image-generation REST endpoint.
pub struct RestEditor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    width: u32,
    height: u32,
}

impl RestEditor {
    /// Creates a new [`RestEditorBuilder`].
    pub fn builder() -> RestEditorBuilder {
        RestEditorBuilder::new()
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, request: &'a EditRequest) -> RestRequest<'a> {
        RestRequest {
            model: &self.model,
            prompt: compose_instruction(&request.prompt, request.has_reference()),
            image_url: request.source_image.as_str(),
            width: self.width,
            height: self.height,
            n: 1,
            response_format: "url",
        }
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<ImageLocator> {
        request.validate()?;
        let start = Instant::now();

        let body = self.request_body(request);

        tracing::debug!(
            model = %self.model,
            reference = request.has_reference(),
            "submitting image generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let text = success_body(response).await?;
        let locator = RestResponse::locate(&text)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            inline = locator.is_inline(),
            "image generation complete"
        );
        Ok(locator)
    }
}

#[async_trait]
impl ImageEditor for RestEditor {
    async fn edit(&self, request: &EditRequest) -> Result<ImageLocator> {
        self.edit_impl(request).await.inspect_err(|e| {
            tracing::warn!(provider = "rest", error = %e, "edit failed");
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Rest
    }
}

#[derive(Debug, Serialize)]
struct RestRequest<'a> {
    model: &'a str,
    prompt: String,
    image_url: &'a str,
    width: u32,
    height: u32,
    n: u32,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    data: Vec<RestImage>,
}

/// One generated image. A URL wins over inline bytes when both are present.
#[derive(Debug, Deserialize)]
struct RestImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl RestResponse {
    fn locate(body: &str) -> Result<ImageLocator> {
        let response: RestResponse = serde_json::from_str(body)
            .map_err(|e| TryOnError::NoImage(format!("unreadable image response: {e}")))?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TryOnError::NoImage("response contained no images".into()))?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        if let Some(url) = non_empty(image.url) {
            return Ok(ImageLocator::Remote(url));
        }
        if let Some(b64) = non_empty(image.b64_json) {
            return Ok(ImageLocator::from_base64_png(&b64));
        }
        Err(TryOnError::NoImage(
            "first generated image carries neither url nor b64_json".into(),
        ))
    }
}
