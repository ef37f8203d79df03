// # Linux Connector
//
// Drives the adapter through NetworkManager (`nmcli`), `iproute2` (`ip`)
// and, when present, wireless-tools (`iwgetid`).
//
// ## Adapter Resolution
//
// 1. First device `nmcli` reports with type `wifi`
// 2. Otherwise the first of the common names that `ip link show` accepts

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use wifiwatch_core::{ConnectorFactory, Error, Result, WifiConnector};

use crate::join::{await_association, first_usable_ipv4};
use crate::runner::{CommandRunner, run_checked};

/// Platform name this variant registers under
pub const PLATFORM: &str = "linux";

/// Association checks after `nmcli` returns
pub const CONNECT_ATTEMPTS: u32 = 15;

/// Names probed when NetworkManager reports no wifi device
const COMMON_INTERFACES: &[&str] = &["wlan0", "wlp2s0", "wlp3s0", "wlo1"];

/// Wireless connector for Linux hosts
pub struct LinuxConnector {
    runner: Arc<dyn CommandRunner>,
    interface: String,
}

impl LinuxConnector {
    /// Connector bound to a known interface
    pub fn new(runner: Arc<dyn CommandRunner>, interface: impl Into<String>) -> Self {
        Self {
            runner,
            interface: interface.into(),
        }
    }

    /// Find the wireless interface and bind to it
    pub async fn resolve(runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let interface = resolve_interface(runner.as_ref()).await?;
        info!("Using wireless interface {}", interface);
        Ok(Self::new(runner, interface))
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        run_checked(self.runner.as_ref(), program, args, None).await
    }
}

async fn resolve_interface(runner: &dyn CommandRunner) -> Result<String> {
    match run_checked(runner, "nmcli", &["-t", "-f", "DEVICE,TYPE", "device"], None).await {
        Ok(stdout) => {
            if let Some(device) = parse_wifi_device(&stdout) {
                return Ok(device);
            }
            debug!("nmcli lists no wifi device, probing common names");
        }
        Err(e) => debug!("nmcli unavailable ({}), probing common names", e),
    }

    for name in COMMON_INTERFACES {
        if run_checked(runner, "ip", &["link", "show", name], None).await.is_ok() {
            return Ok((*name).to_string());
        }
    }

    Err(Error::interface_not_found(
        "no wifi device from nmcli and none of wlan0, wlp2s0, wlp3s0, wlo1 exist",
    ))
}

#[async_trait]
impl WifiConnector for LinuxConnector {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn current_network(&self) -> Result<String> {
        // iwgetid exits non-zero when not associated, so only trust a name
        if let Ok(stdout) = self.run("iwgetid", &["-r", &self.interface]).await {
            let name = stdout.trim();
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }

        let stdout = self
            .run("nmcli", &["-t", "-f", "active,ssid", "dev", "wifi"])
            .await?;
        Ok(parse_active_ssid(&stdout))
    }

    async fn connect(&self, network: &str, secret: Option<&str>) -> Result<()> {
        let mut args = vec!["dev", "wifi", "connect", network];
        if let Some(secret) = secret {
            args.extend(["password", secret]);
        }
        args.extend(["ifname", self.interface.as_str()]);

        run_checked(self.runner.as_ref(), "nmcli", &args, secret)
            .await
            .map_err(|e| Error::connect(e.to_string()))?;

        await_association(self, network, CONNECT_ATTEMPTS).await
    }

    async fn is_enabled(&self) -> bool {
        match self.run("ip", &["link", "show", &self.interface]).await {
            Ok(stdout) => link_is_up(&stdout),
            Err(e) => {
                debug!("Treating {} as disabled: {}", self.interface, e);
                false
            }
        }
    }

    async fn enable(&self) -> Result<()> {
        self.run("ip", &["link", "set", &self.interface, "up"])
            .await
            .map(|_| ())
            .map_err(|e| Error::enable(e.to_string()))
    }

    async fn current_address(&self) -> Result<Ipv4Addr> {
        let stdout = self
            .run("ip", &["-4", "-o", "addr", "show", "dev", &self.interface])
            .await
            .map_err(|e| Error::address_not_found(e.to_string()))?;

        parse_inet_address(&stdout).ok_or_else(|| {
            Error::address_not_found(format!("no IPv4 address on {}", self.interface))
        })
    }
}

/// Factory registered under [`PLATFORM`]
pub struct LinuxFactory {
    runner: Arc<dyn CommandRunner>,
}

impl LinuxFactory {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ConnectorFactory for LinuxFactory {
    async fn create(&self) -> Result<Box<dyn WifiConnector>> {
        Ok(Box::new(LinuxConnector::resolve(self.runner.clone()).await?))
    }
}

/// First device of type `wifi` in `nmcli -t -f DEVICE,TYPE device` output
fn parse_wifi_device(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (device, kind) = line.trim().rsplit_once(':')?;
        (kind == "wifi" && !device.is_empty()).then(|| device.to_string())
    })
}

/// SSID of the `yes:` row in `nmcli -t -f active,ssid dev wifi` output
///
/// Terse mode escapes `:` and `\` inside values.
fn parse_active_ssid(output: &str) -> String {
    output
        .lines()
        .find_map(|line| line.trim_end().strip_prefix("yes:"))
        .map(unescape_terse)
        .unwrap_or_default()
}

fn unescape_terse(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// `UP` appears in the `<...>` flag set of `ip link show`
fn link_is_up(output: &str) -> bool {
    output
        .split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .is_some_and(|(flags, _)| flags.split(',').any(|f| f == "UP"))
}

/// Address following the `inet` token of `ip -4 -o addr show`
fn parse_inet_address(output: &str) -> Option<Ipv4Addr> {
    let candidates = output.lines().filter_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "inet")?;
        tokens.next()?.split('/').next()
    });
    first_usable_ipv4(candidates)
}
