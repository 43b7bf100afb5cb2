//! Error types for recipe and image generation.

use std::time::Duration;

/// Maximum length of an API error message carried inside a [`ChefError`].
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Errors that can occur while talking to the model or handling its output.
#[derive(Debug, thiserror::Error)]
pub enum ChefError {
    /// No credential source produced a usable API key.
    #[error("no API key found: set VITE_API_KEY, GEMINI_API_KEY or API_KEY")]
    MissingCredential,

    /// The text model answered without any text.
    #[error("the model returned no recipe text")]
    EmptyGeneration,

    /// API key rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait suggested by the `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// Prompt was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters (unknown model, bad payload).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A string that should have been a `data:` URI was not.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving an image).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChefError {
    /// Returns true for failures of the remote call itself, as opposed to
    /// local problems (missing key, bad input, disk errors).
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::ContentBlocked(_)
                | Self::InvalidRequest(_)
                | Self::Network(_)
                | Self::Json(_)
        )
    }
}

/// Result type alias for recipe-chef operations.
pub type Result<T> = std::result::Result<T, ChefError>;

/// Reduces a raw API error body to something fit for an error message.
///
/// Google APIs wrap errors as `{"error": {"message": ...}}`; when that shape
/// is present only the message is kept. The result is truncated.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        message
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
