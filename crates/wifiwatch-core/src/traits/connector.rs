// # Wifi Connector Trait
//
// Defines the uniform control surface over one wireless adapter.
//
// ## Implementations
//
// - Linux (`ip`, `iwgetid`, `nmcli`), macOS (`networksetup`, `ifconfig`) and
//   Windows (`netsh`, `wmic`): `wifiwatch-connector` crate
//
// ## Usage
//
// ```rust,ignore
// use wifiwatch_core::WifiConnector;
//
// async fn ensure(connector: &dyn WifiConnector) -> wifiwatch_core::Result<()> {
//     if !connector.is_enabled().await {
//         connector.enable().await?;
//     }
//     if connector.current_network().await? != "Home" {
//         connector.connect("Home", None).await?;
//     }
//     println!("address: {}", connector.current_address().await?);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Capability set over the managed wireless adapter
///
/// A connector owns exactly one adapter identifier, resolved once by its
/// [`ConnectorFactory`] and never changed afterwards. All OS interaction and
/// text parsing stays behind this trait; callers only see typed results.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait WifiConnector: Send + Sync {
    /// The resolved adapter identifier
    fn interface(&self) -> &str;

    /// Platform family this connector drives (e.g. "linux")
    fn platform(&self) -> &'static str;

    /// Name of the network the adapter is associated with
    ///
    /// # Returns
    ///
    /// - `Ok(String::new())`: Not associated with any network
    /// - `Ok(name)`: Associated with `name`
    /// - `Err(Error)`: The query itself failed (`CommandFailed`, `ParseFailure`)
    async fn current_network(&self) -> Result<String, crate::Error>;

    /// Join `network` and wait until the adapter reports it
    ///
    /// Issues the platform join command, then polls [`current_network`]
    /// once per second up to the variant's ceiling. Only an exact match
    /// counts as success.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The adapter reports `network`
    /// - `Err(Error::ConnectFailed)`: The join command was rejected
    /// - `Err(Error::ConnectTimeout)`: The ceiling was reached without a match
    ///
    /// [`current_network`]: WifiConnector::current_network
    async fn connect(&self, network: &str, secret: Option<&str>) -> Result<(), crate::Error>;

    /// Whether the adapter is powered on
    ///
    /// Never fails: a query error reads as `false`, which at worst costs one
    /// redundant [`enable`](WifiConnector::enable) call.
    async fn is_enabled(&self) -> bool;

    /// Power the adapter on; succeeds when it is already on
    async fn enable(&self) -> Result<(), crate::Error>;

    /// First non-loopback IPv4 address bound to the adapter
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address
    /// - `Err(Error::AddressNotFound)`: Nothing usable is bound
    async fn current_address(&self) -> Result<Ipv4Addr, crate::Error>;
}

/// Helper trait for constructing connectors
///
/// Construction resolves the adapter identifier by probing the platform's
/// sources in a fixed fallback order, so it is asynchronous and may fail
/// with `InterfaceNotFound`.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Resolve the adapter and build a connector for it
    async fn create(&self) -> Result<Box<dyn WifiConnector>, crate::Error>;
}
