//! Command-line flags

use clap::{Parser, ValueEnum};
use tracing::Level;
use wifiwatch_core::{NotifyConfig, ReconcilerConfig, TargetConfig, WatchdogConfig};

/// Keep this host on a wireless network and report address changes
#[derive(Debug, Parser)]
#[command(name = "wifiwatchd", version, about)]
pub struct Cli {
    /// Network name (SSID) to stay on
    #[arg(short = 'w', long = "wifi", value_name = "SSID")]
    pub network: String,

    /// Pre-shared key for the network
    #[arg(short = 'p', long = "password", value_name = "KEY")]
    pub password: Option<String>,

    /// Seconds between checks
    #[arg(short = 'i', long = "interval", default_value_t = 30, value_name = "SECS")]
    pub interval: u64,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// Webhook URL (FEISHU_WEBHOOK_URL takes precedence when set)
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Webhook signing secret (FEISHU_SECRET takes precedence when set)
    #[arg(long, value_name = "SECRET")]
    pub webhook_secret: Option<String>,

    /// Disable webhook notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Notify on every successful check, not only on changes
    #[arg(long)]
    pub always_notify: bool,

    /// Log verbosity
    #[arg(long, env = "WIFIWATCH_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl Cli {
    /// Watchdog settings from the flags alone; environment is applied later
    pub fn to_config(&self) -> WatchdogConfig {
        WatchdogConfig {
            target: TargetConfig::new(self.network.trim(), self.password.clone()),
            reconciler: ReconcilerConfig {
                interval_secs: self.interval,
                run_once: self.once,
                always_notify: self.always_notify,
                ..ReconcilerConfig::default()
            },
            notify: NotifyConfig {
                enabled: !self.no_notify,
                webhook_url: self.webhook_url.clone().unwrap_or_default(),
                webhook_secret: self.webhook_secret.clone().unwrap_or_default(),
                ..NotifyConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_flags_use_defaults() {
        let cli = Cli::try_parse_from(["wifiwatchd", "-w", "Home"]).unwrap();
        let config = cli.to_config();

        assert_eq!(config.target.network, "Home");
        assert!(config.target.secret.is_none());
        assert_eq!(config.reconciler.interval_secs, 30);
        assert!(!config.reconciler.run_once);
        assert!(config.notify.enabled);
        assert!(!config.notify.is_complete());
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "wifiwatchd",
            "--wifi",
            "Office",
            "--password",
            "hunter2",
            "--interval",
            "60",
            "--once",
            "--webhook-url",
            "https://hooks.example/abc",
            "--webhook-secret",
            "s3cr3t",
            "--always-notify",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = cli.to_config();

        assert_eq!(config.target.secret.as_deref(), Some("hunter2"));
        assert_eq!(config.reconciler.interval_secs, 60);
        assert!(config.reconciler.run_once);
        assert!(config.reconciler.always_notify);
        assert!(config.notify.is_complete());
        assert_eq!(Level::from(cli.log_level), Level::DEBUG);
    }

    #[test]
    fn test_network_is_required() {
        assert!(Cli::try_parse_from(["wifiwatchd", "--once"]).is_err());
    }

    #[test]
    fn test_no_notify_disables_notifications() {
        let cli = Cli::try_parse_from(["wifiwatchd", "-w", "Home", "--no-notify"]).unwrap();
        assert!(!cli.to_config().notify.enabled);
    }
}
