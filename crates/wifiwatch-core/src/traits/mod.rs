//! Core traits for the wifiwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`WifiConnector`]: Capability set over the managed wireless adapter
//! - [`ConnectorFactory`]: Resolves the adapter and builds a connector
//! - [`Notifier`]: Single-shot delivery of a notice to an external endpoint

pub mod connector;
pub mod notifier;

pub use connector::{ConnectorFactory, WifiConnector};
pub use notifier::Notifier;
