//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides minimal test doubles that script adapter behaviour
//! and record notification attempts without touching the OS or network.

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use wifiwatch_core::error::{Error, Result};
use wifiwatch_core::notify::{NotificationKind, Notice};
use wifiwatch_core::traits::{Notifier, WifiConnector};

/// Mutable adapter state behind the fake connector
#[derive(Debug, Clone)]
pub struct AdapterState {
    pub enabled: bool,
    pub network: String,
    pub address: Option<Ipv4Addr>,
    pub fail_enable: bool,
    pub fail_network_query: bool,
    pub fail_connect: bool,
    /// Time the join takes before the adapter reports the network
    pub connect_duration: Duration,
}

impl Default for AdapterState {
    fn default() -> Self {
        Self {
            enabled: true,
            network: String::new(),
            address: None,
            fail_enable: false,
            fail_network_query: false,
            fail_connect: false,
            connect_duration: Duration::ZERO,
        }
    }
}

/// Call counters shared between a fake connector and the test
#[derive(Debug, Default)]
pub struct CallCounts {
    pub is_enabled: AtomicUsize,
    pub enable: AtomicUsize,
    pub current_network: AtomicUsize,
    pub connect: AtomicUsize,
    pub current_address: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// A scripted WifiConnector
#[derive(Clone)]
pub struct FakeConnector {
    pub state: Arc<Mutex<AdapterState>>,
    pub calls: Arc<CallCounts>,
}

impl FakeConnector {
    pub fn new(state: AdapterState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            calls: Arc::new(CallCounts::default()),
        }
    }

    /// Adapter already on `network` with `address`
    pub fn associated(network: &str, address: &str) -> Self {
        Self::new(AdapterState {
            network: network.to_string(),
            address: Some(address.parse().unwrap()),
            ..AdapterState::default()
        })
    }

    /// Mutate the scripted state
    pub fn update(&self, f: impl FnOnce(&mut AdapterState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn network(&self) -> String {
        self.state.lock().unwrap().network.clone()
    }
}

#[async_trait::async_trait]
impl WifiConnector for FakeConnector {
    fn interface(&self) -> &str {
        "wlan-test"
    }

    fn platform(&self) -> &'static str {
        "fake"
    }

    async fn current_network(&self) -> Result<String> {
        self.calls.current_network.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_network_query {
            return Err(Error::command("fake-query", "exit status 1"));
        }
        Ok(state.network.clone())
    }

    async fn connect(&self, network: &str, _secret: Option<&str>) -> Result<()> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);

        let now = self.calls.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (fail, duration) = {
            let state = self.state.lock().unwrap();
            (state.fail_connect, state.connect_duration)
        };
        tokio::time::sleep(duration).await;

        self.calls.in_flight.fetch_sub(1, Ordering::SeqCst);

        if fail {
            return Err(Error::connect_timeout(network, 10));
        }
        self.state.lock().unwrap().network = network.to_string();
        Ok(())
    }

    async fn is_enabled(&self) -> bool {
        self.calls.is_enabled.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().enabled
    }

    async fn enable(&self) -> Result<()> {
        self.calls.enable.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_enable {
            return Err(Error::enable("fake adapter refused"));
        }
        state.enabled = true;
        Ok(())
    }

    async fn current_address(&self) -> Result<Ipv4Addr> {
        self.calls.current_address.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .address
            .ok_or_else(|| Error::address_not_found("no address on wlan-test"))
    }
}

/// One recorded delivery attempt
#[derive(Debug, Clone)]
pub struct Attempt {
    pub at: Instant,
    pub kind: NotificationKind,
    pub network: String,
    pub previous: Option<Ipv4Addr>,
    pub current: Ipv4Addr,
    pub succeeded: bool,
}

/// A Notifier that records attempts and fails the first `failures` of them
#[derive(Clone)]
pub struct RecordingNotifier {
    attempts: Arc<Mutex<Vec<Attempt>>>,
    failures: usize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    /// Fails every attempt
    pub fn unreachable() -> Self {
        Self::failing_first(usize::MAX)
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            failures,
        }
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn deliveries(&self) -> Vec<Attempt> {
        self.attempts().into_iter().filter(|a| a.succeeded).collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<()> {
        let mut attempts = self.attempts.lock().unwrap();
        let succeeded = attempts.len() >= self.failures;

        attempts.push(Attempt {
            at: Instant::now(),
            kind: notice.kind,
            network: notice.network.clone(),
            previous: notice.previous,
            current: notice.current,
            succeeded,
        });

        if succeeded {
            Ok(())
        } else {
            Err(Error::http("connection refused"))
        }
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// Parse a dotted IPv4 literal
pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// Let detached tasks run; under a paused clock this also advances time
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Assert a measured backoff is `expected`, allowing timer rounding
pub fn assert_gap(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(50),
        "expected a gap of ~{:?}, got {:?}",
        expected,
        actual
    );
}
