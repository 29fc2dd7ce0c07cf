//! Report delivery
//!
//! The rendered report is posted through one [`Channel`]: an incoming
//! webhook or a bot account. Both share the same bounded retry.
//!
//! # Example
//!
//! ```rust,ignore
//! use weekly_report::notifications::{build_channel, Channel};
//!
//! let channel = build_channel(&config.delivery, None)?;
//! let status = channel.send(&message).await?;
//! println!("{status}");
//! ```

pub mod channels;

pub use channels::bot::{BotChannel, BotConfig};
pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};

use crate::config::{DeliveryConfig, DeliveryKind};

/// Build the configured delivery channel
///
/// A webhook URL given on the command line wins over the configured
/// target, whatever its kind.
///
/// # Errors
///
/// Returns [`ChannelError::InvalidConfig`] when the selected target is
/// missing its URL, token or channel id, or any of them is malformed.
pub fn build_channel(
    config: &DeliveryConfig,
    webhook_override: Option<&str>,
) -> ChannelResult<Box<dyn Channel>> {
    if let Some(url) = webhook_override {
        return Ok(Box::new(webhook_channel(config, url)?));
    }

    match config.kind {
        DeliveryKind::Webhook => {
            let url = config.webhook_url.as_deref().ok_or_else(|| {
                ChannelError::InvalidConfig(
                    "no webhook URL given (argument, REPORT_WEBHOOK_URL or delivery.webhook_url)"
                        .to_string(),
                )
            })?;
            Ok(Box::new(webhook_channel(config, url)?))
        }
        DeliveryKind::Bot => {
            let token = config.bot_token.as_deref().ok_or_else(|| {
                ChannelError::InvalidConfig(
                    "delivery.bot_token is required for bot delivery".into(),
                )
            })?;
            let channel_id = config.channel_id.as_deref().ok_or_else(|| {
                ChannelError::InvalidConfig(
                    "delivery.channel_id is required for bot delivery".into(),
                )
            })?;

            let bot = BotConfig::new(token, channel_id)
                .with_api_base(config.api_base.clone())
                .with_timeout(config.timeout_secs)
                .with_max_attempts(config.max_attempts);
            Ok(Box::new(BotChannel::new(bot)?))
        }
    }
}

fn webhook_channel(config: &DeliveryConfig, url: &str) -> ChannelResult<WebhookChannel> {
    WebhookChannel::new(
        WebhookConfig::new(url)
            .with_timeout(config.timeout_secs)
            .with_max_attempts(config.max_attempts),
    )
}
