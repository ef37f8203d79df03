// # Webhook Notifier
//
// Delivers notices to a chat-bot webhook that verifies an HMAC signature.
//
// ## Delivery Contract
//
// - One POST per `deliver` call; retry and backoff belong to the
//   `Dispatcher` in wifiwatch-core
// - Success means HTTP 200 and, when the reply carries one, `code == 0`
// - Requests are bounded by the configured timeout (10 seconds by default)
//
// ## Security
//
// The webhook URL embeds the bot token and the secret signs every request.
// Neither appears in Debug output, logs or error messages.

mod message;
mod sign;

pub use message::{TIME_FORMAT, TextContent, WebhookMessage, WebhookReply, render_text};
pub use sign::sign;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use wifiwatch_core::{Error, Notice, Notifier, NotifyConfig, Result};

/// Signed webhook notifier
pub struct WebhookNotifier {
    url: String,
    secret: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &"<REDACTED>")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

impl WebhookNotifier {
    /// Build a notifier from the notification settings
    ///
    /// Credentials are not checked here; an incomplete configuration makes
    /// every `deliver` fail instead.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: config.webhook_url.clone(),
            secret: config.webhook_secret.clone(),
            client,
        })
    }

    /// Build the signed body for `notice` at `timestamp`
    pub fn message(&self, notice: &Notice, timestamp: i64) -> Result<WebhookMessage> {
        let signature = sign(timestamp, &self.secret)?;
        Ok(WebhookMessage::text(render_text(notice), timestamp, signature))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<()> {
        if self.url.is_empty() || self.secret.is_empty() {
            return Err(Error::config("webhook URL or secret not configured"));
        }

        let message = self.message(notice, Utc::now().timestamp())?;

        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::http(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != reqwest::StatusCode::OK {
            let snippet: String = body.chars().take(200).collect();
            return Err(Error::http(format!("webhook returned {status}: {snippet}")));
        }

        // Some deployments reply with an empty or non-JSON body
        if let Ok(reply) = serde_json::from_str::<WebhookReply>(&body)
            && reply.code != 0
        {
            return Err(Error::notification(format!(
                "webhook rejected message: code {} ({})",
                reply.code, reply.msg
            )));
        }

        debug!("Webhook accepted {} notice", notice.kind);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "webhook"
    }
}
