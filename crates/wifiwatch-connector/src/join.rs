//! Helpers shared by every platform variant: the post-connect poll and
//! IPv4 candidate filtering.

use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::debug;
use wifiwatch_core::{Error, Result, WifiConnector};

/// Cadence of the post-connect association poll
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll until `connector` reports exactly `network`, at most `attempts` times
///
/// Each check waits [`POLL_INTERVAL`] first, giving the join time to land.
/// A query error during polling counts as "not there yet".
pub(crate) async fn await_association<C>(connector: &C, network: &str, attempts: u32) -> Result<()>
where
    C: WifiConnector + ?Sized,
{
    for attempt in 1..=attempts {
        tokio::time::sleep(POLL_INTERVAL).await;

        match connector.current_network().await {
            Ok(current) if current.trim() == network => {
                debug!("Joined {} after {} check(s)", network, attempt);
                return Ok(());
            }
            Ok(current) => debug!(
                "Check {}/{}: associated with '{}', waiting for '{}'",
                attempt, attempts, current, network
            ),
            Err(e) => debug!("Check {}/{}: network query failed: {}", attempt, attempts, e),
        }
    }

    Err(Error::connect_timeout(network, attempts))
}

/// First candidate that parses as a routable IPv4 address
///
/// Loopback and unspecified addresses are skipped.
pub(crate) fn first_usable_ipv4<'a, I>(candidates: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(|c| c.trim().parse::<Ipv4Addr>().ok())
        .find(|ip| !ip.is_loopback() && !ip.is_unspecified())
}

/// Split a `key : value` report line at its first colon
pub(crate) fn key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(k, v)| (k.trim(), v.trim()))
}
