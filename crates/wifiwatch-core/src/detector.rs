// # Address-Change Detector
//
// In-memory previous/current address pair.
//
// ## Semantics
//
// - First observation: records the address, reports a change
// - Same address again: no change, no mutation
// - Different address: previous := current, current := new, reports a change
//
// ## Crash Behavior
//
// Nothing is persisted. After a restart the first observed address is
// reported as first-seen again.

use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The previous/current address pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressHistory {
    /// Address before the most recent change, if any change happened
    pub previous: Option<Ipv4Addr>,
    /// Most recent observation
    pub current: Option<Ipv4Addr>,
}

/// Stateful comparator over successive address observations
///
/// All reads and writes go through one `RwLock`, so a reader never sees a
/// half-updated pair. Cloning shares the same history.
///
/// # Example
///
/// ```rust,no_run
/// use wifiwatch_core::AddressDetector;
///
/// #[tokio::main]
/// async fn main() {
///     let detector = AddressDetector::new();
///
///     assert!(detector.check("192.168.1.5".parse().unwrap()).await);
///     assert!(!detector.check("192.168.1.5".parse().unwrap()).await);
///     assert!(detector.check("192.168.1.9".parse().unwrap()).await);
///
///     assert_eq!(detector.previous_address().await, Some("192.168.1.5".parse().unwrap()));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddressDetector {
    inner: Arc<RwLock<AddressHistory>>,
}

impl AddressDetector {
    /// Create a detector with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed an observation; `true` when it differs from the last one
    pub async fn check(&self, address: Ipv4Addr) -> bool {
        let mut history = self.inner.write().await;

        match history.current {
            None => {
                history.current = Some(address);
                true
            }
            Some(current) if current == address => false,
            Some(current) => {
                history.previous = Some(current);
                history.current = Some(address);
                true
            }
        }
    }

    /// Address before the most recent change
    pub async fn previous_address(&self) -> Option<Ipv4Addr> {
        self.inner.read().await.previous
    }

    /// Most recent observation
    pub async fn current_address(&self) -> Option<Ipv4Addr> {
        self.inner.read().await.current
    }

    /// Both fields under one read guard
    pub async fn snapshot(&self) -> AddressHistory {
        *self.inner.read().await
    }
}
