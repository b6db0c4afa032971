//! Error types for the remote document store.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when interacting with the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials were rejected by the store.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The document does not exist. Callers treat this as "empty document,
    /// no version token".
    #[error("document not found: {0}")]
    NotFound(String),

    /// The compare-and-swap failed: the remote document changed since the
    /// supplied version token was observed.
    #[error("version conflict on {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("rate limited{}", match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    })]
    RateLimited {
        /// Seconds to wait before retrying (from Retry-After header, optional).
        retry_after_secs: Option<u64>,
    },

    /// Server-side failure (5xx).
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// HTTP request failed (connection, timeout, protocol).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload could not be decoded as valid JSON.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// The store answered with something outside its protocol.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Check if this error is transient and worth retrying.
    ///
    /// `NotFound`, `Unauthorized`, `Conflict`, and `Corrupt` are terminal by
    /// classification and must never be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::RateLimited { .. } | StoreError::Upstream { .. } | StoreError::Http(_)
        )
    }

    /// The server-suggested retry delay, if the store provided one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}
