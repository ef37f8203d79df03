// # Notifier Trait
//
// Defines single-shot delivery of a [`Notice`] to an external endpoint.
//
// ## Implementations
//
// - Signed Feishu-style webhook: `wifiwatch-webhook` crate

use async_trait::async_trait;

use crate::notify::Notice;

/// Trait for notification sinks
///
/// Delivery is one attempt per call. Retry, backoff and task spawning are
/// owned by [`Dispatcher`](crate::notify::Dispatcher); a notifier only
/// renders, sends and reports success or failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `notice` once
    async fn deliver(&self, notice: &Notice) -> Result<(), crate::Error>;

    /// Short name used in log lines
    fn notifier_name(&self) -> &'static str;
}
