//! Image-edit providers.

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "rest")]
mod rest;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

#[cfg(feature = "rest")]
pub use rest::{RestEditor, RestEditorBuilder};

use crate::error::{sanitize_error_message, Result, TryOnError};
use std::time::Duration;

/// Resolves the credential handed to a builder; blank keys count as missing.
pub(crate) fn require_api_key(api_key: Option<String>, env_var: &str) -> Result<String> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(TryOnError::Configuration(format!(
            "no API key provided (set {env_var} or pass one to the builder)"
        ))),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TryOnError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Returns the body of a successful response, or an `Api` error carrying
/// the status code and provider error body.
pub(crate) async fn success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(TryOnError::Api {
            status: status.as_u16(),
            message: sanitize_error_message(&text),
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_api_key() {
        assert_eq!(
            require_api_key(Some("k".into()), "X_KEY").unwrap(),
            "k".to_string()
        );

        let err = require_api_key(None, "X_KEY").unwrap_err();
        assert!(matches!(err, TryOnError::Configuration(ref m) if m.contains("X_KEY")));

        assert!(require_api_key(Some("  ".into()), "X_KEY").is_err());
    }
}
