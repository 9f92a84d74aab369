//! Errors produced by backend calls.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout, or other transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("server responded {status}: {}", status_detail(.error, .body))]
    Status { status: u16, body: String, error: Option<String> },

    /// The response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Build a status error, lifting the backend's `{"error": "..."}` message when present.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        let error = backend_error_field(&body);
        Self::Status { status, body, error }
    }

    /// The human-readable message the backend attached to a rejection, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Whether the backend rejected the presented credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

fn status_detail<'a>(error: &'a Option<String>, body: &'a str) -> &'a str {
    error.as_deref().unwrap_or(body)
}

fn backend_error_field(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.error.or(parsed.message).filter(|m| !m.is_empty())
}
