//! Error types for image editing and generation.

use std::time::Duration;

/// Fallback shown when an error carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Errors that can occur while editing or generating an image.
#[derive(Debug, thiserror::Error)]
pub enum RetouchError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, from the Retry-After header.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Missing or invalid user input; no external call is made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Reading the source file failed.
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    /// A data URL did not contain a comma-delimited base64 segment.
    #[error("failed to extract base64 data: {0}")]
    Extraction(String),

    /// Failed to decode base64 or image data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response arrived but did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl RetouchError {
    /// Converts the error into the single user-facing display string.
    ///
    /// An `Api` error's body message is passed through verbatim; everything
    /// else uses its `Display` form. A blank message falls back to
    /// [`UNKNOWN_ERROR_MESSAGE`].
    pub fn display_message(&self) -> String {
        let message = match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for editing and generation operations.
pub type Result<T> = std::result::Result<T, RetouchError>;

/// Maximum length of an error message lifted from a response body.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Extracts a readable message from an API error body.
///
/// Gemini endpoints return `{"error": {"message": ...}}` on failure; proxies
/// sometimes return HTML pages instead. The result is trimmed and clamped so
/// it is safe to surface directly to the user.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let text = if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    } else if body.trim_start().starts_with('<') {
        // HTML error page, not worth showing
        String::new()
    } else {
        body.to_string()
    };

    let text = text.trim();
    if text.len() > MAX_ERROR_MESSAGE_LEN {
        let mut end = MAX_ERROR_MESSAGE_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

/// Parses a Retry-After header value as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_passed_through() {
        let err = RetouchError::Api {
            status: 429,
            message: "quota exceeded".into(),
        };
        assert_eq!(err.display_message(), "quota exceeded");
    }

    #[test]
    fn test_blank_api_message_falls_back() {
        let err = RetouchError::Api {
            status: 500,
            message: "   ".into(),
        };
        assert_eq!(err.display_message(), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_non_api_errors_use_display_form() {
        let err = RetouchError::ContentBlocked("safety filter triggered".into());
        assert_eq!(
            err.display_message(),
            "content blocked: safety filter triggered"
        );
    }

    #[test]
    fn test_sanitize_extracts_gemini_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid model name", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(sanitize_error_message(body), "Invalid model name");
    }

    #[test]
    fn test_sanitize_drops_html_bodies() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        assert_eq!(sanitize_error_message(body), "");
    }

    #[test]
    fn test_sanitize_clamps_long_messages() {
        let body = "x".repeat(1000);
        let sanitized = sanitize_error_message(&body);
        assert!(sanitized.len() <= MAX_ERROR_MESSAGE_LEN + 3);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));

        let empty = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&empty), None);
    }

    #[test]
    fn test_error_display() {
        let err = RetouchError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = RetouchError::Extraction("no comma-delimited segment".into());
        assert_eq!(
            err.to_string(),
            "failed to extract base64 data: no comma-delimited segment"
        );
    }
}
