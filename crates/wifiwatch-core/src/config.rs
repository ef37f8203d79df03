//! Configuration types for the wifiwatch system
//!
//! This module defines all configuration structures used throughout the crate.
//! Values arrive from the daemon's command line; webhook credentials may also
//! come from the environment (see [`NotifyConfig::apply_env`]).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the webhook URL
pub const WEBHOOK_URL_ENV: &str = "FEISHU_WEBHOOK_URL";

/// Environment variable holding the webhook signing secret
pub const WEBHOOK_SECRET_ENV: &str = "FEISHU_SECRET";

/// Main watchdog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Network the host must stay attached to
    pub target: TargetConfig,

    /// Scheduling and tick behaviour
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Webhook notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl WatchdogConfig {
    /// Create a configuration for `network` with defaults everywhere else
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            target: TargetConfig::new(network, None),
            reconciler: ReconcilerConfig::default(),
            notify: NotifyConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.target.validate()?;
        self.reconciler.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}

/// The desired network: name plus optional pre-shared secret
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Network name (SSID), never empty once validated
    pub network: String,

    /// Pre-shared secret; `None` relies on credentials the OS already stores
    #[serde(default)]
    pub secret: Option<String>,
}

// Custom Debug implementation that hides the pre-shared secret
impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("network", &self.network)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl TargetConfig {
    /// Create a new target; blank secrets are treated as absent
    pub fn new(network: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            network: network.into(),
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Validate the target
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.network.trim().is_empty() {
            return Err(crate::Error::config("Target network name cannot be empty"));
        }
        Ok(())
    }
}

/// Reconciler scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds between ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Execute a single tick and return
    #[serde(default)]
    pub run_once: bool,

    /// Pause after enabling the adapter before trusting further queries
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Notify on every tick that reads an address, changed or not
    #[serde(default)]
    pub always_notify: bool,
}

impl ReconcilerConfig {
    /// Validate the scheduling settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Check interval must be > 0 seconds"));
        }
        Ok(())
    }

    /// Tick interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_once: false,
            settle_delay_secs: default_settle_delay_secs(),
            always_notify: false,
        }
    }
}

/// Webhook notification configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether notifications are sent at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Webhook endpoint
    #[serde(default)]
    pub webhook_url: String,

    /// Signing secret shared with the webhook
    #[serde(default)]
    pub webhook_secret: String,

    /// Total delivery attempts per notice (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay; attempt `n` waits `n * base` before the next try
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Custom Debug implementation that hides the signing secret
impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("enabled", &self.enabled)
            .field("webhook_url", &redacted(&self.webhook_url))
            .field("webhook_secret", &redacted(&self.webhook_secret))
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay_secs", &self.retry_base_delay_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl NotifyConfig {
    /// Validate the notification settings
    ///
    /// Missing credentials are not an error here; see [`NotifyConfig::is_complete`].
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("Notification attempts must be >= 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Webhook request timeout must be > 0"));
        }
        if !self.webhook_url.is_empty()
            && !self.webhook_url.starts_with("https://")
            && !self.webhook_url.starts_with("http://")
        {
            return Err(crate::Error::config(
                "Webhook URL must use HTTP or HTTPS scheme",
            ));
        }
        Ok(())
    }

    /// Both URL and secret are present
    pub fn is_complete(&self) -> bool {
        !self.webhook_url.is_empty() && !self.webhook_secret.is_empty()
    }

    /// Fold environment-supplied credentials into this configuration
    ///
    /// A non-blank environment value replaces whatever the command line
    /// supplied. Returns the names of the variables that took effect.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(url) = lookup(WEBHOOK_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.webhook_url = url.trim().to_string();
            applied.push(WEBHOOK_URL_ENV);
        }
        if let Some(secret) = lookup(WEBHOOK_SECRET_ENV).filter(|v| !v.trim().is_empty()) {
            self.webhook_secret = secret.trim().to_string();
            applied.push(WEBHOOK_SECRET_ENV);
        }

        applied
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// The webhook URL carries the bot token, so it is hidden like the secret
fn redacted(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<REDACTED>" }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            webhook_url: String::new(),
            webhook_secret: String::new(),
            max_attempts: default_max_attempts(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_settle_delay_secs() -> u64 {
    3
}

fn default_enabled() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_secs() -> u64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_network_rejected() {
        let config = WatchdogConfig::new("   ");
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = WatchdogConfig::new("Home");
        config.reconciler.interval_secs = 0;
        assert!(config.validate().is_err());

        config.reconciler.interval_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_cli_credentials() {
        let env: HashMap<&str, &str> = [
            (WEBHOOK_URL_ENV, "https://hooks.example/env"),
            (WEBHOOK_SECRET_ENV, "env-secret"),
        ]
        .into_iter()
        .collect();

        let mut notify = NotifyConfig {
            webhook_url: "https://hooks.example/cli".to_string(),
            webhook_secret: "cli-secret".to_string(),
            ..NotifyConfig::default()
        };

        let applied = notify.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(applied, vec![WEBHOOK_URL_ENV, WEBHOOK_SECRET_ENV]);
        assert_eq!(notify.webhook_url, "https://hooks.example/env");
        assert_eq!(notify.webhook_secret, "env-secret");
    }

    #[test]
    fn test_blank_env_keeps_cli_credentials() {
        let mut notify = NotifyConfig {
            webhook_url: "https://hooks.example/cli".to_string(),
            ..NotifyConfig::default()
        };

        let applied = notify.apply_env(|key| match key {
            WEBHOOK_URL_ENV => Some("  ".to_string()),
            _ => None,
        });

        assert!(applied.is_empty());
        assert_eq!(notify.webhook_url, "https://hooks.example/cli");
        assert!(!notify.is_complete());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let target = TargetConfig::new("Home", Some("hunter2".to_string()));
        let notify = NotifyConfig {
            webhook_secret: "s3cr3t".to_string(),
            ..NotifyConfig::default()
        };

        assert!(!format!("{:?}", target).contains("hunter2"));
        assert!(!format!("{:?}", notify).contains("s3cr3t"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: WatchdogConfig =
            serde_json::from_str(r#"{ "target": { "network": "Home" } }"#).unwrap();

        assert_eq!(config.reconciler.interval_secs, 30);
        assert_eq!(config.notify.max_attempts, 3);
        assert!(config.notify.enabled);
        assert!(config.target.secret.is_none());
    }
}
