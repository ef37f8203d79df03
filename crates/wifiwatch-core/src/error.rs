//! Error types for the wifiwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for wifiwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the wifiwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// No wireless adapter answered any of the platform probes
    #[error("Wireless interface not found: {0}")]
    InterfaceNotFound(String),

    /// An OS command could not be spawned or exited unsuccessfully
    #[error("Command `{command}` failed: {message}")]
    CommandFailed {
        /// Program and arguments, secrets elided
        command: String,
        /// Exit status or stderr summary
        message: String,
    },

    /// Command output did not have the expected shape
    #[error("Unable to parse command output: {0}")]
    ParseFailure(String),

    /// The join command itself was rejected
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// The join command ran but the adapter never reported the target network
    #[error("Timed out joining '{network}' after {attempts} checks")]
    ConnectTimeout {
        /// Requested network name
        network: String,
        /// Number of polls performed
        attempts: u32,
    },

    /// The adapter could not be powered on
    #[error("Enable failed: {0}")]
    EnableFailed(String),

    /// No usable IPv4 address is bound to the adapter
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// The running platform has no registered connector
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an interface-not-found error
    pub fn interface_not_found(msg: impl Into<String>) -> Self {
        Self::InterfaceNotFound(msg.into())
    }

    /// Create a command failure error
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a parse failure error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseFailure(msg.into())
    }

    /// Create a connect failure error
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::ConnectFailed(msg.into())
    }

    /// Create a connect timeout error
    pub fn connect_timeout(network: impl Into<String>, attempts: u32) -> Self {
        Self::ConnectTimeout {
            network: network.into(),
            attempts,
        }
    }

    /// Create an enable failure error
    pub fn enable(msg: impl Into<String>) -> Self {
        Self::EnableFailed(msg.into())
    }

    /// Create an address-not-found error
    pub fn address_not_found(msg: impl Into<String>) -> Self {
        Self::AddressNotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::Config(_) | Self::InterfaceNotFound(_) | Self::UnsupportedPlatform(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
