//! Error types for image remixing.

use std::time::Duration;

/// Maximum length of a provider error body carried in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while preparing inputs or calling the generator.
#[derive(Debug, thiserror::Error)]
pub enum RemixError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Invalid request parameters or configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode image data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading an input file, saving a result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered with something we could not interpret.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for remix operations.
pub type Result<T> = std::result::Result<T, RemixError>;

/// Trims a provider error body down to something safe to show a user.
///
/// Collapses whitespace, masks anything that looks like a bearer token and
/// truncates long bodies on a char boundary.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .map(|word| {
            if word.starts_with("sk-") || word.starts_with("key-") {
                "[redacted]"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
