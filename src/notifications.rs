//! Webhook notifications for run lifecycle events.

use crate::config::{NotificationConfig, WebhookType};
use crate::error::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Timeout for a single webhook request
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Message sent by `POST /test-webhook`
pub const TEST_MESSAGE: &str = "This is a test notification from Subtitlarr!";

/// Run lifecycle events that can be notified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A run started
    Start,
    /// A run finished; the message is the summary
    Completion,
    /// A run could not scan
    Error,
    /// Manual test, sent whenever notifications are enabled
    Test,
}

impl WebhookEvent {
    fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::Start => "start",
            WebhookEvent::Completion => "completion",
            WebhookEvent::Error => "error",
            WebhookEvent::Test => "test",
        }
    }

    fn allowed_by(&self, config: &NotificationConfig) -> bool {
        match self {
            WebhookEvent::Start => config.notify_on_start,
            WebhookEvent::Completion => config.notify_on_completion,
            WebhookEvent::Error => config.notify_on_errors,
            WebhookEvent::Test => true,
        }
    }
}

/// JSON body posted to the webhook; exactly one field is set
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    /// Discord and generic receivers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Slack
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl WebhookPayload {
    /// Build the payload shape matching `config` for `message`
    pub fn for_target(config: &NotificationConfig, message: &str) -> Self {
        let message = format!("Subtitlarr: {message}");
        let slack = match config.webhook_type {
            WebhookType::Slack => true,
            WebhookType::Discord => false,
            WebhookType::Auto => config.webhook_url.contains("hooks.slack.com"),
        };
        if slack {
            Self {
                content: None,
                text: Some(message),
            }
        } else {
            Self {
                content: Some(message),
                text: None,
            }
        }
    }
}

/// Sends webhook notifications
#[derive(Clone, Debug)]
pub struct Notifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create a notifier with the standard timeout
    pub fn new() -> Self {
        Self::with_timeout(WEBHOOK_TIMEOUT)
    }

    /// Create a notifier with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Whether `event` would be sent with `config`
    pub fn should_send(config: &NotificationConfig, event: WebhookEvent) -> bool {
        config.enabled && !config.webhook_url.is_empty() && event.allowed_by(config)
    }

    /// Post `message` for `event`
    ///
    /// Returns `Ok(false)` when the event is filtered out by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] when the request fails or times out and
    /// [`Error::Other`] for a non-success response.
    pub async fn send(
        &self,
        config: &NotificationConfig,
        event: WebhookEvent,
        message: &str,
    ) -> Result<bool> {
        if !Self::should_send(config, event) {
            return Ok(false);
        }

        let payload = WebhookPayload::for_target(config, message);
        let response = self
            .client
            .post(&config.webhook_url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Other(format!(
                "Webhook returned non-success status: {status}"
            )));
        }

        tracing::debug!(event = event.as_str(), "webhook sent successfully");
        Ok(true)
    }

    /// Like [`send`](Self::send), logging failures instead of returning them
    pub async fn notify(&self, config: &NotificationConfig, event: WebhookEvent, message: &str) {
        if let Err(e) = self.send(config, event, message).await {
            tracing::warn!(event = event.as_str(), error = %e, "webhook failed");
        }
    }
}
