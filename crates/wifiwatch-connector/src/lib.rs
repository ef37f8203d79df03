//! Platform wireless connectors for wifiwatch
//!
//! One [`WifiConnector`](wifiwatch_core::WifiConnector) variant per host
//! operating system, each driving the native command-line tools:
//!
//! | Platform  | Tools                                 | Join checks |
//! |-----------|---------------------------------------|-------------|
//! | `linux`   | `nmcli`, `ip`, `iwgetid`              | 15          |
//! | `macos`   | `networksetup`, `ifconfig`            | 10          |
//! | `windows` | `netsh`, `wmic`                       | 10          |
//!
//! All variants share the same join rule: after the join command returns,
//! poll the current network once per second until it equals the target
//! exactly, or give up with `ConnectTimeout`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = ConnectorRegistry::new();
//! wifiwatch_connector::register(&registry);
//! let connector = registry.create_for_current_platform().await?;
//! ```

use std::sync::Arc;

use wifiwatch_core::ConnectorRegistry;

mod join;
pub mod linux;
pub mod macos;
pub mod runner;
pub mod windows;

pub use join::POLL_INTERVAL;
pub use linux::{LinuxConnector, LinuxFactory};
pub use macos::{MacosConnector, MacosFactory};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use windows::{WindowsConnector, WindowsFactory};

/// Register every platform variant, backed by real subprocesses
pub fn register(registry: &ConnectorRegistry) {
    register_with_runner(registry, Arc::new(SystemRunner));
}

/// Register every platform variant against `runner`
pub fn register_with_runner(registry: &ConnectorRegistry, runner: Arc<dyn CommandRunner>) {
    registry.register(linux::PLATFORM, Box::new(LinuxFactory::new(runner.clone())));
    registry.register(macos::PLATFORM, Box::new(MacosFactory::new(runner.clone())));
    registry.register(windows::PLATFORM, Box::new(WindowsFactory::new(runner)));
}
