//! Typed failures returned by the service client.

use thiserror::Error;

/// Error raised by an [`ApiClient`](super::ApiClient) call.
///
/// Transport failures, service-reported failures and unreadable bodies are
/// kept apart so callers can tell "could not reach the service" from "the
/// service said no".
#[derive(Debug, Error)]
pub enum ApiError {
    /// DNS failure, refused connection, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with `success: false`.
    #[error("{message}")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: String,
        retry_after: Option<u64>,
    },

    /// The body was not the JSON envelope we expect.
    #[error("Invalid response from service (HTTP {status}): {reason}")]
    Parse { status: u16, reason: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Machine-readable code for the error channel.
    pub fn code(&self) -> &str {
        match self {
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Service { code, .. } => code,
            ApiError::Parse { .. } => "PARSE_ERROR",
            ApiError::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// Seconds the service asked us to wait, when it said so.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::Service { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Builds the code for a failed envelope: the service's own code wins,
    /// then 429 maps to `RATE_LIMITED`, anything else to `HTTP_{status}`.
    pub(crate) fn service_code(status: u16, supplied: Option<String>) -> String {
        match supplied {
            Some(code) if !code.is_empty() => code,
            _ if status == 429 => "RATE_LIMITED".to_string(),
            _ => format!("HTTP_{}", status),
        }
    }
}
