// # wifiwatchd - Wireless Reachability Watchdog
//
// Thin integration layer: parse flags, fold in environment credentials,
// set up logging, pick the connector for this platform and hand control
// to the reconciler. All watchdog logic lives in wifiwatch-core.
//
// ## Configuration
//
// Flags are documented by `wifiwatchd --help`. Environment variables:
//
// - `FEISHU_WEBHOOK_URL`: Webhook URL, overrides `--webhook-url`
// - `FEISHU_SECRET`: Signing secret, overrides `--webhook-secret`
// - `WIFIWATCH_LOG_LEVEL`: Default for `--log-level`
//
// ## Example
//
// ```bash
// export FEISHU_WEBHOOK_URL=https://open.feishu.cn/open-apis/bot/v2/hook/...
// export FEISHU_SECRET=...
//
// wifiwatchd --wifi Home --password hunter2 --interval 60
// ```

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use wifiwatch_core::{ConnectorRegistry, Dispatcher, Reconciler, WatchdogConfig, WifiConnector};

use crate::cli::Cli;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown (or a completed `--once` run)
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WatchdogExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<WatchdogExitCode> for ExitCode {
    fn from(code: WatchdogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also land here
            let _ = e.print();
            return if e.use_stderr() {
                WatchdogExitCode::ConfigError.into()
            } else {
                WatchdogExitCode::CleanShutdown.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(cli.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatchdogExitCode::ConfigError.into();
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return WatchdogExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WatchdogExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let reconciler = match build_reconciler(config).await {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return WatchdogExitCode::ConfigError;
            }
        };

        match run_daemon(reconciler).await {
            Ok(()) => WatchdogExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                WatchdogExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Flags plus environment credentials, validated
fn load_config(cli: &Cli) -> Result<WatchdogConfig> {
    let mut config = cli.to_config();

    for var in config.notify.apply_env(|key| std::env::var(key).ok()) {
        debug!("{} overrides the command-line value", var);
    }

    if config.notify.enabled && !config.notify.is_complete() {
        warn!(
            "Webhook URL or secret missing (set --webhook-url/--webhook-secret or {}/{}); notifications disabled",
            wifiwatch_core::config::WEBHOOK_URL_ENV,
            wifiwatch_core::config::WEBHOOK_SECRET_ENV
        );
        config.notify.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Resolve the connector and wire up notifications
async fn build_reconciler(config: WatchdogConfig) -> Result<Reconciler> {
    let registry = ConnectorRegistry::new();
    wifiwatch_connector::register(&registry);

    info!("Detecting wireless adapter on {}", std::env::consts::OS);
    let connector = registry
        .create_for_current_platform()
        .await
        .context("no usable wireless adapter")?;
    info!(
        "Using {} adapter {}",
        connector.platform(),
        connector.interface()
    );

    let mut reconciler = Reconciler::new(Arc::from(connector), config.target, config.reconciler)?;

    if let Some(dispatcher) = build_dispatcher(&config.notify)? {
        reconciler = reconciler.with_dispatcher(dispatcher);
    }

    Ok(reconciler)
}

#[cfg(feature = "webhook")]
fn build_dispatcher(notify: &wifiwatch_core::NotifyConfig) -> Result<Option<Dispatcher>> {
    if !notify.enabled {
        info!("Notifications disabled");
        return Ok(None);
    }

    let notifier = wifiwatch_webhook::WebhookNotifier::new(notify)?;
    info!("Webhook notifications enabled");
    Ok(Some(Dispatcher::new(Arc::new(notifier), notify)))
}

#[cfg(not(feature = "webhook"))]
fn build_dispatcher(notify: &wifiwatch_core::NotifyConfig) -> Result<Option<Dispatcher>> {
    if notify.enabled {
        warn!("Built without the webhook feature; notifications disabled");
    }
    Ok(None)
}

/// Run the reconciler until it finishes (`--once`) or a signal arrives
async fn run_daemon(reconciler: Reconciler) -> Result<()> {
    info!("Starting wifiwatchd");

    tokio::select! {
        result = reconciler.run() => {
            result?;
            info!("Check complete");
        }
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
            info!("Shutting down");
        }
    }

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("CTRL-C")
}
