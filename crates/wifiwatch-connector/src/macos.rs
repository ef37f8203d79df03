// # macOS Connector
//
// Drives the AirPort/Wi-Fi hardware port through `networksetup` and reads
// addresses from `ifconfig`.
//
// `networksetup` exits 0 on several failures (unknown network, bad
// password), so its output is inspected as well as its status.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use wifiwatch_core::{ConnectorFactory, Error, Result, WifiConnector};

use crate::join::{await_association, first_usable_ipv4};
use crate::runner::{CommandRunner, run_checked};

pub const PLATFORM: &str = "macos";

/// Association checks after `networksetup` returns
pub const CONNECT_ATTEMPTS: u32 = 10;

const COMMON_INTERFACES: &[&str] = &["en0", "en1", "en2"];

const NOT_ASSOCIATED: &str = "You are not associated with an AirPort network";

/// Wireless connector for macOS hosts
pub struct MacosConnector {
    runner: Arc<dyn CommandRunner>,
    interface: String,
}

impl MacosConnector {
    pub fn new(runner: Arc<dyn CommandRunner>, interface: impl Into<String>) -> Self {
        Self {
            runner,
            interface: interface.into(),
        }
    }

    /// Find the Wi-Fi hardware port and bind to its device
    pub async fn resolve(runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let interface = resolve_interface(runner.as_ref()).await?;
        info!("Using wireless interface {}", interface);
        Ok(Self::new(runner, interface))
    }

    async fn networksetup(&self, args: &[&str], secret: Option<&str>) -> Result<String> {
        run_checked(self.runner.as_ref(), "networksetup", args, secret).await
    }
}

async fn resolve_interface(runner: &dyn CommandRunner) -> Result<String> {
    match run_checked(runner, "networksetup", &["-listallhardwareports"], None).await {
        Ok(stdout) => {
            if let Some(device) = parse_hardware_ports(&stdout) {
                return Ok(device);
            }
            debug!("No Wi-Fi hardware port listed, probing common names");
        }
        Err(e) => debug!("networksetup unavailable ({}), probing common names", e),
    }

    for name in COMMON_INTERFACES {
        if let Ok(stdout) = run_checked(runner, "networksetup", &["-getairportpower", name], None).await
            && parse_power(&stdout).is_some()
        {
            return Ok((*name).to_string());
        }
    }

    Err(Error::interface_not_found(
        "no Wi-Fi hardware port and none of en0, en1, en2 report airport power",
    ))
}

#[async_trait]
impl WifiConnector for MacosConnector {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn current_network(&self) -> Result<String> {
        let stdout = self
            .networksetup(&["-getairportnetwork", &self.interface], None)
            .await?;
        parse_airport_network(&stdout)
    }

    async fn connect(&self, network: &str, secret: Option<&str>) -> Result<()> {
        let mut args = vec!["-setairportnetwork", self.interface.as_str(), network];
        args.extend(secret);

        let stdout = self
            .networksetup(&args, secret)
            .await
            .map_err(|e| Error::connect(e.to_string()))?;

        if let Some(line) = join_failure(&stdout) {
            return Err(Error::connect(line));
        }

        await_association(self, network, CONNECT_ATTEMPTS).await
    }

    async fn is_enabled(&self) -> bool {
        match self
            .networksetup(&["-getairportpower", &self.interface], None)
            .await
        {
            Ok(stdout) => parse_power(&stdout).unwrap_or(false),
            Err(e) => {
                debug!("Treating {} as disabled: {}", self.interface, e);
                false
            }
        }
    }

    async fn enable(&self) -> Result<()> {
        self.networksetup(&["-setairportpower", &self.interface, "on"], None)
            .await
            .map(|_| ())
            .map_err(|e| Error::enable(e.to_string()))
    }

    async fn current_address(&self) -> Result<Ipv4Addr> {
        let stdout = run_checked(self.runner.as_ref(), "ifconfig", &[&self.interface], None)
            .await
            .map_err(|e| Error::address_not_found(e.to_string()))?;

        parse_ifconfig(&stdout).ok_or_else(|| {
            Error::address_not_found(format!("no IPv4 address on {}", self.interface))
        })
    }
}

/// Factory registered under [`PLATFORM`]
pub struct MacosFactory {
    runner: Arc<dyn CommandRunner>,
}

impl MacosFactory {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ConnectorFactory for MacosFactory {
    async fn create(&self) -> Result<Box<dyn WifiConnector>> {
        Ok(Box::new(MacosConnector::resolve(self.runner.clone()).await?))
    }
}

/// Device of the Wi-Fi (or AirPort) port in `-listallhardwareports` output
fn parse_hardware_ports(output: &str) -> Option<String> {
    let mut lines = output.lines().map(str::trim);
    while let Some(line) = lines.next() {
        let is_wifi = line
            .strip_prefix("Hardware Port:")
            .is_some_and(|port| port.contains("Wi-Fi") || port.contains("AirPort"));
        if !is_wifi {
            continue;
        }

        if let Some(device) = lines.next().and_then(|l| l.strip_prefix("Device:")) {
            let device = device.trim();
            if !device.is_empty() {
                return Some(device.to_string());
            }
        }
    }
    None
}

/// Network name from `-getairportnetwork`; empty when not associated
fn parse_airport_network(output: &str) -> Result<String> {
    let line = output.trim();

    for prefix in ["Current Wi-Fi Network:", "Current AirPort Network:"] {
        if let Some(name) = line.strip_prefix(prefix) {
            return Ok(name.trim().to_string());
        }
    }

    if line.starts_with(NOT_ASSOCIATED) {
        return Ok(String::new());
    }

    Err(Error::parse(format!("unexpected -getairportnetwork output: {line}")))
}

/// `Some(true)` for `... Power (en0): On`, `None` when not a power report
fn parse_power(output: &str) -> Option<bool> {
    let line = output.lines().map(str::trim).find(|l| l.contains("Power"))?;
    let (_, state) = line.rsplit_once(':')?;
    Some(state.trim().eq_ignore_ascii_case("on"))
}

/// Failure line `-setairportnetwork` prints while still exiting 0
fn join_failure(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|l| {
        l.starts_with("Failed to join") || l.starts_with("Could not find") || l.starts_with("Error")
    })
}

/// First non-loopback `inet` address in `ifconfig` output
fn parse_ifconfig(output: &str) -> Option<Ipv4Addr> {
    let candidates = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("inet "))
        .filter_map(|rest| rest.split_whitespace().next());
    first_usable_ipv4(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::runner::scripted::ScriptedRunner;

    const HARDWARE_PORTS: &str = "\nHardware Port: Ethernet\nDevice: en1\nEthernet Address: aa:bb:cc:dd:ee:01\n\nHardware Port: Wi-Fi\nDevice: en0\nEthernet Address: aa:bb:cc:dd:ee:02\n\nVLAN Configurations\n===================\n";

    const IFCONFIG: &str = "en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500\n\tether aa:bb:cc:dd:ee:02\n\tinet6 fe80::1c2b:3a4d%en0 prefixlen 64 secured scopeid 0x6\n\tinet 10.0.1.42 netmask 0xffffff00 broadcast 10.0.1.255\n\tstatus: active\n";

    #[test]
    fn test_parse_hardware_ports() {
        assert_eq!(parse_hardware_ports(HARDWARE_PORTS), Some("en0".to_string()));
        assert_eq!(parse_hardware_ports("Hardware Port: Ethernet\nDevice: en1\n"), None);
    }

    #[test]
    fn test_parse_airport_network() {
        assert_eq!(
            parse_airport_network("Current Wi-Fi Network: Home Net\n").unwrap(),
            "Home Net"
        );
        assert_eq!(
            parse_airport_network("You are not associated with an AirPort network.\n").unwrap(),
            ""
        );
        assert!(matches!(
            parse_airport_network("en5 is not a Wi-Fi interface."),
            Err(Error::ParseFailure(_))
        ));
    }

    #[test]
    fn test_parse_power() {
        assert_eq!(parse_power("Wi-Fi Power (en0): On\n"), Some(true));
        assert_eq!(parse_power("Wi-Fi Power (en0): Off\n"), Some(false));
        assert_eq!(parse_power("en1 is not a Wi-Fi interface.\n"), None);
    }

    #[test]
    fn test_parse_ifconfig() {
        assert_eq!(parse_ifconfig(IFCONFIG), Some("10.0.1.42".parse().unwrap()));
        assert_eq!(parse_ifconfig("lo0: flags=8049\n\tinet 127.0.0.1 netmask 0xff000000\n"), None);
    }

    #[tokio::test]
    async fn test_resolve_prefers_hardware_port_listing() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("networksetup -listallhardwareports", CommandOutput::ok(HARDWARE_PORTS)),
        );
        let connector = MacosConnector::resolve(runner).await.unwrap();
        assert_eq!(connector.interface(), "en0");
    }

    #[tokio::test]
    async fn test_resolve_probes_airport_power() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("networksetup -listallhardwareports", CommandOutput::ok(""))
                .on("networksetup -getairportpower en0", CommandOutput::ok("en0 is not a Wi-Fi interface.\n"))
                .on("networksetup -getairportpower en1", CommandOutput::ok("Wi-Fi Power (en1): Off\n")),
        );
        let connector = MacosConnector::resolve(runner).await.unwrap();
        assert_eq!(connector.interface(), "en1");
    }

    #[tokio::test]
    async fn test_connect_reports_join_failure_printed_on_success() {
        let runner = Arc::new(ScriptedRunner::new().on(
            "networksetup -setairportnetwork en0 Home hunter2",
            CommandOutput::ok("Failed to join network Home.\nError: -3900  The operation couldn't be completed.\n"),
        ));
        let connector = MacosConnector::new(runner.clone(), "en0");

        let err = connector.connect("Home", Some("hunter2")).await.unwrap_err();

        assert!(matches!(err, Error::ConnectFailed(ref m) if m == "Failed to join network Home."));
        assert_eq!(runner.count("networksetup -getairportnetwork en0"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_requires_exact_name() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("networksetup -setairportnetwork en0 Home", CommandOutput::ok(""))
                .on(
                    "networksetup -getairportnetwork en0",
                    CommandOutput::ok("Current Wi-Fi Network: Home Guest\n"),
                ),
        );
        let connector = MacosConnector::new(runner.clone(), "en0");

        let err = connector.connect("Home", None).await.unwrap_err();

        assert!(matches!(err, Error::ConnectTimeout { attempts: CONNECT_ATTEMPTS, .. }));
        assert_eq!(
            runner.count("networksetup -getairportnetwork en0"),
            CONNECT_ATTEMPTS as usize
        );
    }

    #[tokio::test]
    async fn test_enable_turns_power_on() {
        let runner = Arc::new(
            ScriptedRunner::new().on("networksetup -setairportpower en0 on", CommandOutput::ok("")),
        );
        let connector = MacosConnector::new(runner.clone(), "en0");

        connector.enable().await.unwrap();
        assert_eq!(runner.calls(), vec!["networksetup -setairportpower en0 on".to_string()]);
    }
}
