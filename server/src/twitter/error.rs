//! Twitter client error types.

use std::time::Duration;

use thiserror::Error;

use crate::model::ListId;

/// Errors raised while talking to the Twitter API.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// Credentials were rejected (HTTP 401) or are not configured.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A read or write call failed remotely.
    #[error("Twitter API error{}: {message}", status.map(|s| format!(" {s}")).unwrap_or_default())]
    RemoteFetch {
        status: Option<u16>,
        message: String,
    },

    /// Rate limited; `retry_after` in seconds.
    #[error("rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Adding or removing list members failed. The local edit is kept.
    #[error("could not update list {list}: {source}")]
    WriteConflict {
        list: ListId,
        #[source]
        source: Box<TwitterError>,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OAuth signature generation failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

impl TwitterError {
    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RemoteFetch { status, .. } => matches!(status, Some(s) if *s >= 500 || *s == 429),
            Self::RateLimited { .. } => true,
            Self::WriteConflict { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Server-suggested delay before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(Duration::from_secs(*retry_after)),
            Self::WriteConflict { source, .. } => source.retry_after(),
            _ => None,
        }
    }

    /// True when the session cannot continue without new credentials.
    pub fn is_authentication(&self) -> bool {
        match self {
            Self::Authentication(_) => true,
            Self::WriteConflict { source, .. } => source.is_authentication(),
            _ => false,
        }
    }
}

/// Result type for Twitter operations.
pub type TwitterResult<T> = Result<T, TwitterError>;
