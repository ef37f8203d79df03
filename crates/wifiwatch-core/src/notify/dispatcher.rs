// # Notification Dispatcher
//
// Fire-and-forget delivery with bounded, linearly backed-off retry.
//
// ## Ownership
//
// - ✅ DISPATCHER: spawns the delivery task, owns retry count and backoff
// - ❌ NOTIFIER: one attempt per call, no sleeping, no spawning
//
// The only observable effects of a dispatch are log lines and the
// notifier's outbound call. Tasks are never joined; if the process exits
// they are abandoned.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::NotifyConfig;
use crate::error::{Error, Result};
use crate::notify::Notice;
use crate::traits::Notifier;

/// Detached, retrying notification sender
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
    base_delay: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("notifier", &self.notifier.notifier_name())
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher using the retry policy from `config`
    pub fn new(notifier: Arc<dyn Notifier>, config: &NotifyConfig) -> Self {
        Self::with_policy(
            notifier,
            config.max_attempts,
            Duration::from_secs(config.retry_base_delay_secs),
        )
    }

    /// Create a dispatcher with an explicit retry policy
    ///
    /// `max_attempts` counts the first try; it is clamped to at least one.
    pub fn with_policy(notifier: Arc<dyn Notifier>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            notifier,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Deliver `notice` on a detached task
    ///
    /// Returns immediately. Must be called from within a tokio runtime.
    pub fn dispatch(&self, notice: Notice) {
        let this = self.clone();
        debug!(kind = %notice.kind, network = %notice.network, "Dispatching notification");

        tokio::spawn(async move {
            // Final failure is already logged inside
            let _ = this.deliver_with_retry(&notice).await;
        });
    }

    /// Deliver `notice`, retrying failed attempts
    ///
    /// Attempt `n` failing waits `n * base_delay` before the next one.
    /// A non-transient error (e.g. missing credentials) ends the loop at once.
    ///
    /// # Returns
    ///
    /// - `Ok(attempts)`: Delivered on attempt number `attempts`
    /// - `Err(Error)`: The last attempt's error after all attempts failed
    pub async fn deliver_with_retry(&self, notice: &Notice) -> Result<u32> {
        let name = self.notifier.notifier_name();
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.notifier.deliver(notice).await {
                Ok(()) => {
                    info!(
                        "{} notification delivered via {} (attempt {})",
                        notice.kind, name, attempt
                    );
                    return Ok(attempt);
                }
                Err(e) => {
                    warn!(
                        "{} notification attempt {}/{} failed: {}",
                        name, attempt, self.max_attempts, e
                    );
                    if !e.is_transient() {
                        error!(
                            "{} notification for '{}' dropped: {}",
                            name, notice.network, e
                        );
                        return Err(e);
                    }
                    last_error = Some(e);

                    // Wait before retry (unless this was the last attempt)
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.base_delay * attempt).await;
                    }
                }
            }
        }

        error!(
            "{} notification for '{}' dropped after {} attempts",
            name, notice.network, self.max_attempts
        );
        Err(last_error.unwrap_or_else(|| Error::notification("No delivery attempt made")))
    }
}
