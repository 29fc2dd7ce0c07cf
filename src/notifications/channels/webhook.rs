//! Webhook notification channel
//!
//! This module provides a webhook channel for posting the report via HTTP POST requests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{post_with_retry, Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::report::ReportMessage;
use crate::utils::retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS};

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum delivery attempts
    #[serde(default = "default_attempts")]
    pub max_attempts: u32,
}

fn default_timeout() -> u64 {
    10
}

fn default_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
            max_attempts: default_attempts(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| format!("Invalid webhook URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notification channel
///
/// Posts the report as the JSON body of an incoming-webhook request:
///
/// ```json
/// {
///   "content": "Statistics from ... to ...",
///   "embeds": [
///     { "title": "General Statistics", "description": "...", "color": 16753920, "fields": [] },
///     { "title": "Most Downloads", "description": "...", "color": 16753920,
///       "fields": [{ "name": "...", "value": "...", "inline": false }] }
///   ]
/// }
/// ```
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
    retry: RetryConfig,
}

impl WebhookChannel {
    /// Create a new webhook channel
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let retry = RetryConfig::new(config.max_attempts);
        Ok(Self {
            config,
            client,
            retry,
        })
    }

    /// Create a simple webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Host of the webhook URL; the path carries the secret
    fn host(&self) -> String {
        url::Url::parse(&self.config.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &ReportMessage) -> ChannelResult<DeliveryStatus> {
        let payload = serde_json::to_value(message)?;

        let attempts = post_with_retry(
            &self.retry,
            || self.client.post(&self.config.url),
            &payload,
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to deliver webhook"))?;

        let host = self.host();
        tracing::info!(host = %host, attempts = attempts, "Webhook delivered");

        Ok(DeliveryStatus::delivered(
            self.name(),
            format!("Delivered to {host}"),
            attempts,
        ))
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "host": self.host(),
            "timeout_secs": self.config.timeout_secs,
            "max_attempts": self.config.max_attempts,
        })
    }
}
