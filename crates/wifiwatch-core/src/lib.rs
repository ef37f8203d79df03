// # wifiwatch-core
//
// Core library for the wifiwatch reachability watchdog.
//
// ## Architecture Overview
//
// The watchdog keeps a host attached to one wireless network and reports
// address changes over a webhook:
// - **WifiConnector**: Capability set over the local wireless adapter
// - **AddressDetector**: Remembers the previous/current address pair
// - **Notifier**: Single-shot delivery of a notice to an external endpoint
// - **Dispatcher**: Detached delivery tasks with bounded retry
// - **Reconciler**: Periodic state machine driving observed state to the target
// - **ConnectorRegistry**: Platform-keyed factories, selected once at startup
//
// ## Data Flow
//
// Reconciler → WifiConnector → AddressDetector → Dispatcher → Notifier.
// Nothing above the connector touches the operating system.

pub mod config;
pub mod detector;
pub mod error;
pub mod notify;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{NotifyConfig, ReconcilerConfig, TargetConfig, WatchdogConfig};
pub use detector::AddressDetector;
pub use error::{Error, Result};
pub use notify::{Dispatcher, NotificationKind, Notice};
pub use reconciler::{Reconciler, TickReport, TickState};
pub use registry::ConnectorRegistry;
pub use traits::{ConnectorFactory, Notifier, WifiConnector};
