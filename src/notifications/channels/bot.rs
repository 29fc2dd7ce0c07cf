//! Bot-account notification channel
//!
//! Posts the report into a channel as a bot user, the way the chat
//! service's REST API expects: `POST {api_base}/channels/{id}/messages`
//! with an `Authorization: Bot <token>` header.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::Duration;

use super::{post_with_retry, Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::DEFAULT_BOT_API_BASE;
use crate::report::ReportMessage;
use crate::utils::retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS};

/// Bot channel configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub api_base: String,
    pub token: String,
    pub channel_id: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl BotConfig {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_BOT_API_BASE.to_string(),
            token: token.into(),
            channel_id: channel_id.into(),
            timeout_secs: 10,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Point the channel at another API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("Bot token cannot be empty".to_string());
        }
        if self.channel_id.trim().is_empty() {
            return Err("Channel id cannot be empty".to_string());
        }
        if !self.channel_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Channel id must be numeric: {}", self.channel_id));
        }
        url::Url::parse(&self.api_base).map_err(|e| format!("Invalid API base URL: {e}"))?;
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Endpoint that creates a message in the configured channel
    pub fn messages_url(&self) -> String {
        format!(
            "{}/channels/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.channel_id
        )
    }
}

/// Posts the report as a bot user
pub struct BotChannel {
    config: BotConfig,
    client: Client,
    retry: RetryConfig,
    endpoint: String,
}

impl BotChannel {
    pub fn new(config: BotConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.messages_url(),
            retry: RetryConfig::new(config.max_attempts),
            config,
            client,
        })
    }
}

#[async_trait]
impl Channel for BotChannel {
    fn name(&self) -> &str {
        "bot"
    }

    async fn send(&self, message: &ReportMessage) -> ChannelResult<DeliveryStatus> {
        let payload = serde_json::to_value(message)?;
        let authorization = format!("Bot {}", self.config.token);

        let attempts = post_with_retry(
            &self.retry,
            || {
                self.client
                    .post(&self.endpoint)
                    .header(AUTHORIZATION, &authorization)
            },
            &payload,
        )
        .await
        .inspect_err(|e| {
            tracing::error!(
                channel_id = %self.config.channel_id,
                error = %e,
                "Bot delivery failed"
            );
        })?;

        tracing::info!(
            channel_id = %self.config.channel_id,
            attempts = attempts,
            "Report posted by bot"
        );

        Ok(DeliveryStatus::delivered(
            self.name(),
            format!("Posted to channel {}", self.config.channel_id),
            attempts,
        ))
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "api_base": self.config.api_base,
            "channel_id": self.config.channel_id,
            "max_attempts": self.config.max_attempts,
        })
    }
}
