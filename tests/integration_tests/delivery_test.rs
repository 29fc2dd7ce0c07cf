//! Delivery channel integration tests

use weekly_report::config::{DeliveryConfig, DeliveryKind};
use weekly_report::notifications::{build_channel, BotChannel, BotConfig, Channel, ChannelError};
use weekly_report::report::{Embed, EmbedField, ReportMessage};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message() -> ReportMessage {
    ReportMessage {
        content: "Statistics from Sunday, March 3, 2024 to Sunday, March 10, 2024. (12:00 PM)"
            .to_string(),
        embeds: vec![Embed {
            title: "Most Downloads".to_string(),
            description: None,
            color: 0xFFA500,
            fields: vec![EmbedField::new(":one: Alpha", "+200 downloads")],
        }],
    }
}

#[tokio::test]
async fn test_bot_posts_with_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v10/channels/123456/messages"))
        .and(header("authorization", "Bot secret-token"))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{ "title": "Most Downloads" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":\"1\"}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = BotChannel::new(
        BotConfig::new("secret-token", "123456")
            .with_api_base(format!("{}/api/v10", mock_server.uri())),
    )
    .unwrap();

    let status = channel.send(&message()).await.unwrap();
    assert_eq!(status.channel, "bot");
    assert_eq!(status.attempts, 1);
}

#[tokio::test]
async fn test_bot_forbidden_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing Access"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = DeliveryConfig {
        kind: DeliveryKind::Bot,
        bot_token: Some("token".to_string()),
        channel_id: Some("42".to_string()),
        api_base: mock_server.uri(),
        ..Default::default()
    };
    let channel = build_channel(&config, None).unwrap();

    let err = channel.send(&message()).await.unwrap_err();
    match err {
        ChannelError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Missing Access");
        }
        other => panic!("Expected rejection, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_webhook_sends_message_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{ "fields": [{ "name": ":one: Alpha", "value": "+200 downloads", "inline": false }] }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = build_channel(
        &DeliveryConfig::default(),
        Some(&format!("{}/hook", mock_server.uri())),
    )
    .unwrap();

    let status = channel.send(&message()).await.unwrap();
    assert_eq!(status.channel, "webhook");
}

#[tokio::test]
async fn test_webhook_limited_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = DeliveryConfig {
        webhook_url: Some(format!("{}/hook", mock_server.uri())),
        max_attempts: 2,
        ..Default::default()
    };
    let channel = build_channel(&config, None).unwrap();

    let err = channel.send(&message()).await.unwrap_err();
    assert!(matches!(err, ChannelError::Exhausted { attempts: 2, .. }));
}
