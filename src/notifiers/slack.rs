use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::WatchError;
use crate::notifiers::{Alert, Notifier};

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack notification service, posts alerts to a configured channel
pub struct SlackNotifier {
    /// Slack bot token
    token: String,
    /// Destination channel ID or name
    channel: String,
    /// HTTP client
    client: Client,
}

impl SlackNotifier {
    /// Create a new Slack notification service
    pub fn new(token: &str, channel: &str) -> Self {
        // Create HTTP client with timeout; a dispatch never outlives it
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            token: token.to_string(),
            channel: channel.to_string(),
            client,
        }
    }

    /// Post one message via chat.postMessage and return the raw response body
    async fn post_message(&self, text: &str) -> Result<String, WatchError> {
        let payload = serde_json::json!({
            "channel": self.channel,
            "text": text,
        });

        debug!("Posting message to Slack channel {}", self.channel);

        let response = self.client.post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WatchError::Notify(format!("Slack request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Notify(format!("Slack request failed, status code: {}", status)));
        }

        let body = response.text()
            .await
            .map_err(|e| WatchError::Notify(format!("failed to read Slack response: {}", e)))?;

        debug!("Slack response: {}", body);
        Ok(body)
    }
}

/// Check the Slack response envelope; the API reports errors in the body
/// with HTTP 200
fn check_response(raw: &str) -> Result<(), WatchError> {
    let data: Value = serde_json::from_str(raw)
        .map_err(|e| WatchError::Notify(format!("failed to parse Slack response: {}", e)))?;

    if data["ok"].as_bool().unwrap_or(false) {
        Ok(())
    } else {
        let reason = data["error"].as_str().unwrap_or("unknown error");
        Err(WatchError::Notify(format!("Slack API error: {}", reason)))
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), WatchError> {
        if self.token.is_empty() {
            error!("Slack bot token is not set, cannot send notification");
            return Err(WatchError::Notify("Slack bot token is not set".to_string()));
        }

        debug!("Sending Slack notification: {}", alert.message);

        let text = format!("*{}*\n\n{}", alert.message, alert.details);
        let response = self.post_message(&text).await?;
        check_response(&response)?;

        debug!("Notification sent successfully");
        Ok(())
    }
}
