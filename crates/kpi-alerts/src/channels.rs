//! Alert delivery.
//!
//! Delivering a message to a chat room is an external collaborator's job;
//! [`AlertSink`] is the seam. Checks hand a rendered [`Notification`] to a
//! sink and record it in their ledger only if the sink reports success.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AlertError, Result};
use crate::types::CheckKind;

/// A rendered alert message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The check that produced this notification.
    pub kind: CheckKind,
    /// First line of the message.
    pub title: String,
    /// Body lines.
    pub lines: Vec<String>,
}

impl Notification {
    /// Creates a notification with a title and no body.
    #[must_use]
    pub fn new(kind: CheckKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a body line.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// The full message text.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.title.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Result of sending a notification.
#[derive(Debug, Clone)]
pub struct NotificationResult {
    /// Whether the notification was delivered.
    pub success: bool,
    /// The sink that processed this notification.
    pub channel: String,
    /// Optional message or error description.
    pub message: Option<String>,
    /// Response status code (if applicable).
    pub status_code: Option<u16>,
}

impl NotificationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            status_code: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            status_code: None,
        }
    }

    /// Sets the status code.
    #[must_use]
    pub const fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

/// Something that can deliver an alert message.
pub trait AlertSink: fmt::Debug {
    /// Returns the name of this sink.
    fn name(&self) -> &str;

    /// Sends a notification.
    ///
    /// A returned [`NotificationResult`] with `success == false` is a
    /// delivery failure just like an `Err`.
    fn send(&self, notification: &Notification) -> Result<NotificationResult>;
}

/// Sends `notification` through `sink`, turning any failure into
/// [`AlertError::NotificationFailed`].
pub fn deliver(sink: &dyn AlertSink, notification: &Notification) -> Result<NotificationResult> {
    let result = sink.send(notification)?;
    if !result.success {
        warn!(channel = %result.channel, message = ?result.message, "notification failed");
        return Err(AlertError::NotificationFailed {
            reason: result
                .message
                .unwrap_or_else(|| format!("{} reported failure", result.channel)),
        });
    }
    info!(channel = %result.channel, kind = %notification.kind, "notification sent");
    Ok(result)
}

/// A sink that writes notifications to the log.
#[derive(Debug, Clone)]
pub struct LogChannel {
    name: String,
}

impl LogChannel {
    /// Creates a new log sink.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new("log")
    }
}

impl AlertSink for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        warn!(
            kind = %notification.kind,
            lines = notification.lines.len(),
            message = %notification.text(),
            "ALERT"
        );
        Ok(NotificationResult::success(self.name()).with_message("logged to tracing"))
    }
}

/// Configuration for a chat incoming-webhook sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The name of this webhook.
    pub name: String,
    /// The URL to post messages to.
    pub url: String,
    /// Timeout in seconds for HTTP requests.
    pub timeout_secs: u64,
}

impl WebhookConfig {
    /// Creates a new webhook configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotificationFailed` if the URL is empty or not http(s).
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(AlertError::NotificationFailed {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(AlertError::NotificationFailed {
                reason: format!("webhook URL must be http(s): {url}"),
            });
        }
        Ok(Self {
            name: name.into(),
            url,
            timeout_secs: 30,
        })
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Payload posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Message text.
    pub text: String,
}

impl WebhookPayload {
    /// Creates a payload from a notification.
    #[must_use]
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            text: notification.text(),
        }
    }
}

/// Posts notifications as `{"text": ...}` JSON to an incoming-webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::blocking::Client,
}

impl WebhookChannel {
    /// Creates a new webhook sink.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotificationFailed` if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AlertError::NotificationFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Formats the notification as JSON.
    pub fn format_payload(&self, notification: &Notification) -> Result<String> {
        let payload = WebhookPayload::from_notification(notification);
        serde_json::to_string(&payload).map_err(AlertError::from)
    }
}

impl AlertSink for WebhookChannel {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        let payload = WebhookPayload::from_notification(notification);
        debug!(channel = %self.name(), url = %self.config.url, "posting webhook");

        let response = self
            .client
            .post(&self.config.url)
            .json(&payload)
            .send()
            .map_err(|e| AlertError::NotificationFailed {
                reason: format!("webhook request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(NotificationResult::success(self.name()).with_status_code(status.as_u16()))
        } else {
            Ok(NotificationResult::failure(self.name(), format!("webhook returned {status}"))
                .with_status_code(status.as_u16()))
        }
    }
}

/// A sink that keeps sent notifications in memory.
///
/// Can be told to fail, to exercise the no-record-on-failure path.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl MemoryChannel {
    /// Creates a sink that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects everything.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Notifications accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

impl AlertSink for MemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        if self.fail {
            return Ok(NotificationResult::failure(self.name(), "rejected"));
        }
        self.sent.lock().push(notification.clone());
        Ok(NotificationResult::success(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        let mut n = Notification::new(CheckKind::BelowAverage, "title");
        n.push_line("line 1");
        n.push_line("line 2");
        n
    }

    #[test]
    fn text_joins_lines() {
        assert_eq!(notification().text(), "title\nline 1\nline 2");
    }

    #[test]
    fn deliver_success() {
        let sink = MemoryChannel::new();
        let result = deliver(&sink, &notification()).expect("deliver");
        assert!(result.success);
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn deliver_failure_is_error() {
        let sink = MemoryChannel::failing();
        let err = deliver(&sink, &notification()).unwrap_err();
        assert!(matches!(err, AlertError::NotificationFailed { ref reason } if reason == "rejected"));
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn log_channel_always_succeeds() {
        let channel = LogChannel::default();
        assert_eq!(channel.name(), "log");
        assert!(channel.send(&notification()).unwrap().success);
    }

    #[test]
    fn webhook_config_validation() {
        assert!(WebhookConfig::new("chat", "").is_err());
        assert!(WebhookConfig::new("chat", "ftp://x").is_err());
        let config = WebhookConfig::new("chat", "https://hooks.example.com/T/B")
            .unwrap()
            .with_timeout_secs(5);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn webhook_payload_shape() {
        let channel =
            WebhookChannel::new(WebhookConfig::new("chat", "https://hooks.example.com/x").unwrap())
                .unwrap();
        assert_eq!(channel.url(), "https://hooks.example.com/x");
        let json = channel.format_payload(&notification()).unwrap();
        assert_eq!(json, r#"{"text":"title\nline 1\nline 2"}"#);
    }

    #[test]
    fn webhook_unreachable_is_error() {
        let config = WebhookConfig::new("chat", "http://127.0.0.1:9/hook")
            .unwrap()
            .with_timeout_secs(2);
        let channel = WebhookChannel::new(config).unwrap();
        assert!(deliver(&channel, &notification()).is_err());
    }
}
