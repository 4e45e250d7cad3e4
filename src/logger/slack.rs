//! Slack incoming-webhook sink.

use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};

use super::{LogContext, LogLevel, Logger};
use crate::error::{Error, Result};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers a JSON document to a webhook URL.
///
/// Implement this to plug a different HTTP client into [`SlackLogger`], or to
/// capture payloads in tests.
pub trait WebhookTransport: Send + Sync {
    /// POSTs `body` (a JSON document) to `url`.
    ///
    /// Anything other than a `200 OK` response is a delivery failure.
    fn post_json(&self, url: &str, body: &str) -> Result<()>;
}

/// The default transport, backed by a blocking `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Creates a transport with a short request timeout.
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(WEBHOOK_TIMEOUT).build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl WebhookTransport for UreqTransport {
    fn post_json(&self, url: &str, body: &str) -> Result<()> {
        match self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(body)
        {
            Ok(response) if response.status() == 200 => Ok(()),
            Ok(response) => Err(Error::Delivery(format!(
                "the webhook responded with status {}",
                response.status()
            ))),
            Err(ureq::Error::Status(status, _)) => Err(Error::Delivery(format!(
                "the webhook responded with status {}",
                status
            ))),
            Err(err) => Err(Error::Delivery(err.to_string())),
        }
    }
}

/// Sends log entries to a Slack channel via an incoming webhook.
///
/// An entry is sent only if its level meets or exceeds the logger's minimum
/// level. The minimum defaults to [`LogLevel::Debug`], so out of the box every
/// entry is sent.
///
/// Each entry becomes one Block Kit message: a heading, the level and message in
/// bold, and one context element per context entry.
pub struct SlackLogger {
    webhook_url: String,
    min_log_level: LogLevel,
    transport: Box<dyn WebhookTransport>,
}

impl SlackLogger {
    /// Creates a logger posting to `webhook_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if the URL is not an absolute `http` or
    /// `https` URL.
    pub fn new(webhook_url: &str) -> Result<Self> {
        if !is_valid_webhook_url(webhook_url) {
            return Err(Error::invalid_option(
                "webhook_url",
                webhook_url,
                "a valid URL",
            ));
        }

        Ok(Self {
            webhook_url: webhook_url.to_string(),
            min_log_level: LogLevel::Debug,
            transport: Box::new(UreqTransport::new()),
        })
    }

    /// Sets the minimum level an entry must have to be sent.
    pub fn with_min_log_level(mut self, level: LogLevel) -> Self {
        self.min_log_level = level;
        self
    }

    /// Replaces the HTTP transport.
    pub fn with_transport(mut self, transport: impl WebhookTransport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// Returns the webhook URL.
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Returns the minimum level an entry must have to be sent.
    pub fn min_log_level(&self) -> LogLevel {
        self.min_log_level
    }

    /// Builds the Slack message for one entry.
    pub fn payload(&self, level: LogLevel, message: &str, context: &LogContext) -> Value {
        let emoji = emoji(level);

        let elements: Vec<Value> = context
            .iter()
            .map(|(name, value)| {
                json!({
                    "type": "mrkdwn",
                    "text": format!("{}: {}", name, format_context_value(value)),
                })
            })
            .collect();

        json!({
            "text": format!("{} Defence handled suspicious request", emoji),
            "blocks": [
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": "Handled suspicious request.",
                    },
                },
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*{} {}: {}*", emoji, capitalize(level.as_str()), message),
                    },
                },
                {
                    "type": "context",
                    "elements": elements,
                },
            ],
        })
    }

    /// Sends one entry, reporting delivery failures to the caller.
    ///
    /// Entries below the minimum level are skipped and count as success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`] if the webhook could not be reached or did
    /// not answer `200 OK`.
    pub fn try_log(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()> {
        if !level.meets(self.min_log_level) {
            return Ok(());
        }

        let body = self.payload(level, message, context).to_string();
        self.transport.post_json(&self.webhook_url, &body)
    }
}

impl fmt::Debug for SlackLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackLogger")
            .field("webhook_url", &self.webhook_url)
            .field("min_log_level", &self.min_log_level)
            .finish_non_exhaustive()
    }
}

impl Logger for SlackLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        if let Err(err) = self.try_log(level, message, context) {
            tracing::error!(error = %err, "failed to send a log entry to Slack");
        }
    }
}

fn is_valid_webhook_url(url: &str) -> bool {
    let Ok(uri) = url.parse::<http::Uri>() else {
        return false;
    };

    let has_web_scheme = matches!(uri.scheme_str(), Some("http") | Some("https"));
    let has_host = uri.host().is_some_and(|host| !host.is_empty());

    has_web_scheme && has_host
}

fn emoji(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
            ":bangbang:"
        }
        LogLevel::Warning => ":warning:",
        LogLevel::Notice | LogLevel::Info | LogLevel::Debug => ":information_source:",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Scalars are shown as-is, anything else as a pretty-printed code block.
fn format_context_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_default();
            format!("```{}```", pretty)
        }
    }
}
