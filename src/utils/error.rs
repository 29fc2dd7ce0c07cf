//! Error types for feed fetching and payload decoding
//!
//! This module defines the errors raised while pulling the upstream feeds.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Client error with status code (never retried)
    #[error("Client error: {0}")]
    ClientError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Every attempt failed; carries the last failure
    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            500..=599 => Self::ServerError(status),
            _ => Self::ClientError(status),
        }
    }

    /// Whether another attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::RateLimit | Self::ServerError(_) | Self::Timeout => true,
            Self::ClientError(_) | Self::InvalidUrl(_) | Self::Exhausted { .. } => false,
        }
    }
}

/// Errors for feed payloads that arrived but cannot be used
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Feed decoded fine but holds no records
    #[error("{feed} feed is empty")]
    Empty { feed: &'static str },

    /// Feed body is not the expected JSON shape
    #[error("{feed} feed is malformed: {source}")]
    Malformed {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
