//! Core types for outfit editing.

use crate::error::{Result, TryOnError};
use base64::Engine;
use std::path::Path;

const BASE64_MARKER: &str = ";base64,";

/// Image formats accepted as uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// A base64 `data:` URI carrying an image.
///
/// This is the encoding uploads arrive in and the encoding providers'
/// inline results are returned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    uri: String,
    payload_start: usize,
}

impl DataUri {
    /// Parses a `data:<mime>;base64,<payload>` string.
    pub fn parse(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with("data:") {
            return Err(TryOnError::InvalidRequest(
                "image must be a data URI (data:<mime>;base64,...)".into(),
            ));
        }
        let marker = uri.find(BASE64_MARKER).ok_or_else(|| {
            TryOnError::InvalidRequest("data URI is not base64 encoded".into())
        })?;
        let payload_start = marker + BASE64_MARKER.len();
        if uri[payload_start..].trim().is_empty() {
            return Err(TryOnError::InvalidRequest("data URI has no payload".into()));
        }
        Ok(Self { uri, payload_start })
    }

    /// Encodes raw image bytes, rejecting anything that is not a known image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(data).ok_or_else(|| {
            TryOnError::InvalidRequest("file is not a PNG, JPEG, WebP or GIF image".into())
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        Ok(Self::from_parts(format.mime_type(), &encoded))
    }

    /// Reads an image file into a data URI.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Wraps an already base64-encoded payload without re-encoding it.
    pub(crate) fn from_parts(mime_type: &str, payload: &str) -> Self {
        let prefix = format!("data:{mime_type}{BASE64_MARKER}");
        Self {
            payload_start: prefix.len(),
            uri: prefix + payload,
        }
    }

    /// Returns the full URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Returns the base64 payload with the `data:` prefix stripped.
    pub fn payload(&self) -> &str {
        &self.uri[self.payload_start..]
    }

    /// Returns the declared MIME type (`image/png` when the URI omits it).
    pub fn mime_type(&self) -> &str {
        let mime = &self.uri["data:".len()..self.payload_start - BASE64_MARKER.len()];
        let mime = mime.split(';').next().unwrap_or_default();
        if mime.is_empty() {
            "image/png"
        } else {
            mime
        }
    }

    /// Decodes the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let cleaned: String = self
            .payload()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(&cleaned)
            .map_err(|e| TryOnError::Decode(e.to_string()))
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl std::str::FromStr for DataUri {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Where the edited image can be found.
///
/// Either form can be used directly as an image source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the edited image should be displayed or saved"]
pub enum ImageLocator {
    /// Image embedded inline.
    DataUri(DataUri),
    /// Image hosted by the provider.
    Remote(String),
}

impl ImageLocator {
    /// Wraps a provider's base64 payload as a PNG data URI, verbatim.
    pub fn from_base64_png(payload: &str) -> Self {
        Self::DataUri(DataUri::from_parts("image/png", payload))
    }

    /// Returns the locator as a displayable string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DataUri(uri) => uri.as_str(),
            Self::Remote(url) => url,
        }
    }

    /// Returns true if the image is embedded inline.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::DataUri(_))
    }
}

impl std::fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-edit provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Multimodal generation (Gemini `generateContent`).
    Gemini,
    /// Image-generation REST endpoint (`/v1/images/generations`).
    Rest,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

/// A request to restyle the outfit in a portrait.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// The portrait to edit.
    pub source_image: DataUri,
    /// Free text describing the desired clothing change.
    pub prompt: String,
    /// Optional garment or style exemplar.
    pub reference_image: Option<DataUri>,
}

impl EditRequest {
    /// Creates a new request for the given portrait and outfit description.
    pub fn new(source_image: DataUri, prompt: impl Into<String>) -> Self {
        Self {
            source_image,
            prompt: prompt.into(),
            reference_image: None,
        }
    }

    /// Attaches a reference garment image.
    pub fn with_reference(mut self, image: DataUri) -> Self {
        self.reference_image = Some(image);
        self
    }

    /// Returns true if a reference image is attached.
    pub fn has_reference(&self) -> bool {
        self.reference_image.is_some()
    }

    /// Checks the request can be sent.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(TryOnError::InvalidRequest(
                "an outfit description is required".into(),
            ));
        }
        Ok(())
    }
}
