//! Platform-keyed connector registry
//!
//! Connector variants register a factory under the platform name they
//! drive, matching `std::env::consts::OS` ("linux", "macos", "windows").
//! The daemon selects once at startup; nothing downstream branches on the
//! platform again.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wifiwatch_core::ConnectorRegistry;
//!
//! let registry = ConnectorRegistry::new();
//! wifiwatch_connector::register(&registry);
//!
//! let connector = registry.create_for_current_platform().await?;
//! ```

use crate::error::{Error, Result};
use crate::traits::{ConnectorFactory, WifiConnector};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Connector registry keyed by platform name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ConnectorRegistry {
    factories: RwLock<HashMap<String, Arc<dyn ConnectorFactory>>>,
}

impl ConnectorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector factory for `platform`
    ///
    /// A later registration for the same platform replaces the earlier one.
    pub fn register(&self, platform: impl Into<String>, factory: Box<dyn ConnectorFactory>) {
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        factories.insert(platform.into(), Arc::from(factory));
    }

    /// Build the connector registered for `platform`
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn WifiConnector>)`: Connector with its adapter resolved
    /// - `Err(Error::UnsupportedPlatform)`: Nothing registered for `platform`
    /// - `Err(Error::InterfaceNotFound)`: The factory found no adapter
    pub async fn create(&self, platform: &str) -> Result<Box<dyn WifiConnector>> {
        let factory = {
            let factories = self
                .factories
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            factories
                .get(platform)
                .cloned()
                .ok_or_else(|| Error::UnsupportedPlatform(platform.to_string()))?
        };

        // Lock released before the async resolution
        factory.create().await
    }

    /// Build the connector for the platform this binary runs on
    pub async fn create_for_current_platform(&self) -> Result<Box<dyn WifiConnector>> {
        self.create(std::env::consts::OS).await
    }

    /// List all registered platform names
    pub fn list_platforms(&self) -> Vec<String> {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a platform has a registered factory
    pub fn has_platform(&self, platform: &str) -> bool {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        factories.contains_key(platform)
    }
}
