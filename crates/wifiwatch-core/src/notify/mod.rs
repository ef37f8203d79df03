//! Notification model and dispatch
//!
//! A [`Notice`] is produced by the reconciler for every notify-worthy tick.
//! The [`Dispatcher`] hands it to a [`Notifier`](crate::traits::Notifier)
//! on a detached task; the tick never learns the outcome.

pub mod dispatcher;

pub use dispatcher::Dispatcher;

use chrono::{DateTime, Local};
use std::net::Ipv4Addr;

/// Which message template a notice renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Connected with an address and no earlier address to compare against
    FirstSeen,
    /// The address moved from `previous` to `current`
    AddressChanged,
    /// The adapter had to rejoin the target network; address unchanged.
    /// Only sent under always-notify.
    Reconnect,
}

impl NotificationKind {
    /// Pick the template for one tick's observations
    ///
    /// A change always wins over a reconnect, so a rejoin that also moved the
    /// address reports the move.
    pub fn select(changed: bool, previous: Option<Ipv4Addr>, reconnected: bool) -> Self {
        match (changed, previous, reconnected) {
            (true, None, _) => Self::FirstSeen,
            (true, Some(_), _) => Self::AddressChanged,
            (false, _, true) => Self::Reconnect,
            (false, _, false) => Self::FirstSeen,
        }
    }

    /// Stable lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSeen => "first_seen",
            Self::AddressChanged => "address_changed",
            Self::Reconnect => "reconnect",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notify-worthy observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Template selector
    pub kind: NotificationKind,
    /// Network the adapter is on
    pub network: String,
    /// Address before the change (only meaningful for `AddressChanged`)
    pub previous: Option<Ipv4Addr>,
    /// Address observed this tick
    pub current: Ipv4Addr,
    /// When the observation was made
    pub observed_at: DateTime<Local>,
}

impl Notice {
    /// Create a notice stamped with the current local time
    pub fn new(
        kind: NotificationKind,
        network: impl Into<String>,
        previous: Option<Ipv4Addr>,
        current: Ipv4Addr,
    ) -> Self {
        Self {
            kind,
            network: network.into(),
            previous,
            current,
            observed_at: Local::now(),
        }
    }
}
