//! Message body and text templates
//!
//! ```json
//! {
//!   "msg_type": "text",
//!   "content": { "text": "..." },
//!   "timestamp": 1700000000,
//!   "sign": "..."
//! }
//! ```

use serde::{Deserialize, Serialize};
use wifiwatch_core::{NotificationKind, Notice};

/// Local time format used in every template
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// JSON body POSTed to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub msg_type: String,
    pub content: TextContent,
    /// Unix seconds
    pub timestamp: i64,
    pub sign: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

impl WebhookMessage {
    /// Plain-text message signed at `timestamp`
    pub fn text(text: impl Into<String>, timestamp: i64, sign: impl Into<String>) -> Self {
        Self {
            msg_type: "text".to_string(),
            content: TextContent { text: text.into() },
            timestamp,
            sign: sign.into(),
        }
    }
}

/// Reply body; `code` is 0 on success
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookReply {
    #[serde(default, alias = "StatusCode")]
    pub code: i64,
    #[serde(default, alias = "StatusMessage")]
    pub msg: String,
}

/// Render the chat text for `notice`
pub fn render_text(notice: &Notice) -> String {
    let at = notice.observed_at.format(TIME_FORMAT);
    let network = &notice.network;
    let current = notice.current;

    match (notice.kind, notice.previous) {
        (NotificationKind::AddressChanged, Some(previous)) => format!(
            "🌐 WiFi连接状态更新\n网络：{network}\n🔄 IP地址变化：{previous} → {current}\n时间：{at}"
        ),
        (NotificationKind::Reconnect, _) => format!(
            "🌐 WiFi重新连接通知\n网络：{network}\n✅ 已重新连接，IP地址：{current}\n时间：{at}"
        ),
        _ => format!(
            "🌐 WiFi连接状态通知\n网络：{network}\n✅ 已连接，IP地址：{current}\n时间：{at}"
        ),
    }
}
