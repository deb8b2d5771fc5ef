//! Error types for outfit editing.

/// Maximum length of a provider error body carried in [`TryOnError::Api`].
const MAX_ERROR_BODY_LEN: usize = 512;

/// Errors that can occur while preparing or performing an edit.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    /// Credential missing or provider misconfigured. Raised before any I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request inputs are missing or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider error body, trimmed.
        message: String,
    },

    /// Network or HTTP error (connection, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The call succeeded but no image could be located in the response.
    #[error("no image returned: {0}")]
    NoImage(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload or saving a result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TryOnError {
    /// Returns true if the failure happened on the wire (status or network).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Network(_))
    }

    /// Returns the HTTP status code attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for outfit editing operations.
pub type Result<T> = std::result::Result<T, TryOnError>;

/// Collapses whitespace in a provider error body and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "empty error body".to_string();
    }
    if collapsed.chars().count() <= MAX_ERROR_BODY_LEN {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_BODY_LEN).collect();
    truncated.push_str("...");
    truncated
}
