//! Reconciliation state machine
//!
//! The Reconciler drives the observed adapter state toward the target:
//! - Power the adapter on if it is off
//! - Join the target network if the adapter is elsewhere (or nowhere)
//! - Read the adapter's address and feed the detector
//! - Hand notify-worthy observations to the dispatcher
//!
//! ## Tick States
//!
//! ```text
//! Idle ─► CheckEnabled ─┬─────────────► CheckCurrentNetwork ─┬─► Connected ──┐
//!                       └─► Enabling ──►                     └─► Connecting ─┤
//!                                                                            ▼
//!                           Idle ◄── NotifyDecision ◄── PostConnectAddressCheck
//! ```
//!
//! Any failure before the address check aborts the tick back to `Idle`;
//! the next scheduled tick retries from the top. An address failure only
//! skips change detection for that tick.
//!
//! ## Scheduling
//!
//! One tick runs immediately, then one per interval. The loop awaits each
//! tick before taking the next timer firing, so ticks never overlap; a tick
//! that overruns its interval delays the following one.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::{ReconcilerConfig, TargetConfig};
use crate::detector::AddressDetector;
use crate::error::Result;
use crate::notify::{Dispatcher, NotificationKind, Notice};
use crate::traits::WifiConnector;

/// Phases of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickState {
    /// Between ticks
    Idle,
    /// Asking whether the adapter is powered
    CheckEnabled,
    /// Powering the adapter on and letting it settle
    Enabling,
    /// Asking which network the adapter is on
    CheckCurrentNetwork,
    /// Already on the target network
    Connected,
    /// Joining the target network
    Connecting,
    /// Reading the adapter address
    PostConnectAddressCheck,
    /// Deciding whether to notify
    NotifyDecision,
}

/// What one tick observed and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// State in which the tick gave up; `None` when it ran to completion
    pub aborted_at: Option<TickState>,
    /// The adapter was off and this tick powered it on
    pub enabled_adapter: bool,
    /// Network observed before any connect attempt (empty = not associated)
    pub observed_network: String,
    /// This tick joined the target network
    pub reconnected: bool,
    /// Address read after reaching the target network
    pub address: Option<Ipv4Addr>,
    /// The detector classified the address as a change
    pub changed: bool,
    /// Kind of notice handed to the dispatcher, if any
    pub notified: Option<NotificationKind>,
}

impl TickReport {
    /// The tick reached the notify decision
    pub fn completed(&self) -> bool {
        self.aborted_at.is_none()
    }
}

/// Periodic reconciliation of adapter state against the target network
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Optionally attach a [`Dispatcher`] with [`Reconciler::with_dispatcher()`]
/// 3. Start with [`Reconciler::run()`]; it returns only in run-once mode
pub struct Reconciler {
    /// Capability surface over the adapter
    connector: Arc<dyn WifiConnector>,

    /// Previous/current address pair
    detector: AddressDetector,

    /// Notification sink; `None` disables notifications
    dispatcher: Option<Dispatcher>,

    /// Desired network
    target: TargetConfig,

    /// Scheduling settings
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: The target name is empty or the interval is zero
    pub fn new(
        connector: Arc<dyn WifiConnector>,
        target: TargetConfig,
        config: ReconcilerConfig,
    ) -> Result<Self> {
        target.validate()?;
        config.validate()?;

        Ok(Self {
            connector,
            detector: AddressDetector::new(),
            dispatcher: None,
            target,
            config,
        })
    }

    /// Send notices through `dispatcher`
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// The detector fed by this reconciler
    pub fn detector(&self) -> &AddressDetector {
        &self.detector
    }

    /// Run the first tick now, then one per interval
    ///
    /// In run-once mode this returns after the first tick. Otherwise it
    /// never returns; the process is stopped externally. Tick failures are
    /// logged and never end the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Watching {} on {} (every {}s)",
            self.target.network,
            self.connector.interface(),
            self.config.interval_secs
        );

        self.tick().await;

        if self.config.run_once {
            info!("Run-once mode, stopping after first check");
            return Ok(());
        }

        let period = self.config.interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = IntervalStream::new(interval);
        while ticks.next().await.is_some() {
            self.tick().await;
        }

        Ok(())
    }

    /// Execute one reconciliation tick
    ///
    /// Never fails: errors are logged and recorded in the report.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let target = self.target.network.as_str();

        // CheckEnabled
        let mut state = self.advance(TickState::Idle, TickState::CheckEnabled);
        if !self.connector.is_enabled().await {
            state = self.advance(state, TickState::Enabling);
            info!("Adapter {} is disabled, enabling", self.connector.interface());

            if let Err(e) = self.connector.enable().await {
                error!("Failed to enable adapter: {}", e);
                return self.abort(report, state);
            }

            report.enabled_adapter = true;
            info!("Adapter enabled");
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        // CheckCurrentNetwork
        state = self.advance(state, TickState::CheckCurrentNetwork);
        let current = match self.connector.current_network().await {
            Ok(name) => name,
            Err(e) => {
                error!("Failed to read current network: {}", e);
                return self.abort(report, state);
            }
        };

        if current.is_empty() {
            info!("Not associated with any network");
        } else {
            debug!("Associated with {}", current);
        }
        report.observed_network = current.clone();

        if current == target {
            state = self.advance(state, TickState::Connected);
            info!("Already on target network {}", target);
        } else {
            state = self.advance(state, TickState::Connecting);
            info!("Connecting to {}", target);

            if let Err(e) = self
                .connector
                .connect(target, self.target.secret.as_deref())
                .await
            {
                error!("Failed to connect to {}: {}", target, e);
                return self.abort(report, state);
            }

            report.reconnected = true;
            info!("Connected to {}", target);
        }

        // PostConnectAddressCheck
        state = self.advance(state, TickState::PostConnectAddressCheck);
        let address = match self.connector.current_address().await {
            Ok(address) => address,
            Err(e) => {
                warn!("Skipping address check this tick: {}", e);
                self.advance(state, TickState::Idle);
                return report;
            }
        };
        report.address = Some(address);

        // NotifyDecision
        state = self.advance(state, TickState::NotifyDecision);
        report.changed = self.detector.check(address).await;

        let history = self.detector.snapshot().await;
        if report.changed {
            info!(
                "Address changed: {} -> {}",
                history
                    .previous
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                address
            );
        } else {
            debug!("Address unchanged: {}", address);
        }

        let notify_worthy = report.changed || self.config.always_notify;
        if notify_worthy && let Some(dispatcher) = &self.dispatcher {
            let kind = NotificationKind::select(report.changed, history.previous, report.reconnected);
            let previous = match kind {
                NotificationKind::AddressChanged => history.previous,
                _ => None,
            };

            dispatcher.dispatch(Notice::new(kind, target, previous, address));
            report.notified = Some(kind);
        }

        self.advance(state, TickState::Idle);
        report
    }

    fn advance(&self, from: TickState, to: TickState) -> TickState {
        debug!("tick: {:?} -> {:?}", from, to);
        to
    }

    fn abort(&self, mut report: TickReport, at: TickState) -> TickReport {
        report.aborted_at = Some(at);
        self.advance(at, TickState::Idle);
        report
    }
}
