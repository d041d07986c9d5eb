//! Slack incoming-webhook announcer.

use async_trait::async_trait;
use serde::Serialize;

use super::Announcer;
use crate::error::{AppError, Result};
use crate::models::{Release, SlackConfig};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<&'a str>,
}

/// Posts announcements to a Slack webhook.
pub struct SlackAnnouncer {
    client: reqwest::Client,
    webhook_url: String,
    username: Option<String>,
    icon_url: Option<String>,
    enabled: bool,
}

impl SlackAnnouncer {
    pub fn new(client: reqwest::Client, webhook_url: impl Into<String>) -> Self {
        let webhook_url = webhook_url.into();
        Self {
            client,
            enabled: !webhook_url.trim().is_empty(),
            webhook_url,
            username: None,
            icon_url: None,
        }
    }

    pub fn from_config(config: &SlackConfig, client: reqwest::Client) -> Self {
        let mut announcer = Self::new(client, config.webhook_url.clone());
        announcer.enabled &= config.enabled;
        announcer.username = config.username.clone();
        announcer.icon_url = config.icon_url.clone();
        announcer
    }

    fn payload<'a>(&'a self, release: &Release) -> WebhookPayload<'a> {
        WebhookPayload {
            text: release.announcement(),
            username: self.username.as_deref(),
            icon_url: self.icon_url.as_deref(),
        }
    }
}

#[async_trait]
impl Announcer for SlackAnnouncer {
    fn name(&self) -> &str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, release: &Release) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(release))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(
                "slack",
                format!("webhook returned {}: {}", status, body.trim()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_release;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn announcer_for(server: &MockServer) -> SlackAnnouncer {
        let config = SlackConfig {
            enabled: true,
            webhook_url: format!("{}/hook", server.uri()),
            username: Some("release-bot".to_string()),
            icon_url: None,
        };
        SlackAnnouncer::from_config(&config, reqwest::Client::new())
    }

    #[test]
    fn test_payload_omits_unset_fields() {
        let announcer = SlackAnnouncer::new(reqwest::Client::new(), "https://hooks.example/x");
        let json = serde_json::to_value(announcer.payload(&sample_release("v1.2.3"))).unwrap();

        assert_eq!(
            json["text"],
            "acme/widget v1.2.3 is out! Check it out at https://github.com/acme/widget/releases/tag/v1.2.3"
        );
        assert!(json.get("username").is_none());
        assert!(json.get("icon_url").is_none());
    }

    #[test]
    fn test_from_config() {
        let config = SlackConfig {
            enabled: true,
            webhook_url: "https://hooks.example/x".to_string(),
            username: Some("release-bot".to_string()),
            icon_url: None,
        };
        let announcer = SlackAnnouncer::from_config(&config, reqwest::Client::new());
        assert!(announcer.is_enabled());

        let json = serde_json::to_value(announcer.payload(&sample_release("v1.0.0"))).unwrap();
        assert_eq!(json["username"], "release-bot");
    }

    #[test]
    fn test_disabled_without_webhook() {
        let config = SlackConfig {
            enabled: true,
            ..SlackConfig::default()
        };
        assert!(!SlackAnnouncer::from_config(&config, reqwest::Client::new()).is_enabled());
    }

    #[tokio::test]
    async fn test_notify_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "text": "acme/widget v1.2.3 is out! Check it out at https://github.com/acme/widget/releases/tag/v1.2.3",
                "username": "release-bot",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        announcer_for(&server)
            .notify(&sample_release("v1.2.3"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notify_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500).set_body_string("no_service\n"))
            .expect(1)
            .mount(&server)
            .await;

        let err = announcer_for(&server)
            .notify(&sample_release("v1.2.3"))
            .await
            .unwrap_err();

        match err {
            AppError::Notify { channel, message } => {
                assert_eq!(channel, "slack");
                assert!(message.contains("500"));
                assert!(message.ends_with("no_service"));
            }
            other => panic!("expected notify error, got {other:?}"),
        }
    }
}
