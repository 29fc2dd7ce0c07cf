//! Notification channels for delivering the report
//!
//! A channel takes a rendered [`ReportMessage`] and posts it to a chat
//! service, either through an incoming webhook or a bot account.

pub mod bot;
pub mod webhook;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::report::ReportMessage;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The service refused the message (4xx other than 429)
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Channel temporarily unavailable (5xx)
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Every attempt failed
    #[error("Delivery failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<ChannelError> },
}

impl ChannelError {
    /// Whether another attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(e) => !e.is_builder(),
            Self::Unavailable(_) | Self::RateLimited(_) => true,
            Self::InvalidConfig(_)
            | Self::Rejected { .. }
            | Self::SerializationError(_)
            | Self::Exhausted { .. } => false,
        }
    }
}

/// Response from sending a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Channel that delivered the notification
    pub channel: String,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Attempts used
    pub attempts: u32,
    /// Timestamp of delivery
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    pub fn delivered(
        channel: impl Into<String>,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            channel: channel.into(),
            message: Some(message.into()),
            attempts,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[DELIVERED] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Trait for notification channels
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Send the report through this channel
    async fn send(&self, message: &ReportMessage) -> ChannelResult<DeliveryStatus>;

    /// Channel settings as JSON for logging, secrets left out
    fn config(&self) -> serde_json::Value;
}

/// POST a JSON payload with bounded retry; returns the attempts used
///
/// `build` produces a fresh request for every attempt.
pub(crate) async fn post_with_retry<F>(
    retry: &RetryConfig,
    build: F,
    payload: &serde_json::Value,
) -> ChannelResult<u32>
where
    F: Fn() -> RequestBuilder,
{
    let counter = AtomicU32::new(0);
    let counter = &counter;
    let build = &build;

    let result = with_retry_if(
        retry,
        move || async move {
            counter.fetch_add(1, Ordering::Relaxed);
            let response = build().json(payload).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            Err::<(), ChannelError>(match status.as_u16() {
                429 => ChannelError::RateLimited(body),
                code if status.is_server_error() => {
                    ChannelError::Unavailable(format!("HTTP {code}: {body}"))
                }
                code => ChannelError::Rejected { status: code, body },
            })
        },
        ChannelError::is_recoverable,
    )
    .await;

    match result {
        Ok(()) => Ok(counter.load(Ordering::Relaxed)),
        Err(failure) if failure.exhausted => Err(ChannelError::Exhausted {
            attempts: failure.attempts,
            last: Box::new(failure.error),
        }),
        Err(failure) => Err(failure.error),
    }
}
