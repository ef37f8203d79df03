// # Windows Connector
//
// Drives the WLAN AutoConfig service through `netsh`. Report labels are
// matched in both English and Simplified Chinese locales.
//
// ## Secrets
//
// `netsh wlan connect` only joins networks that have a profile. When a
// secret is supplied, a WPA2-PSK profile is written to a temporary file,
// added with `netsh wlan add profile`, and the file removed again.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use wifiwatch_core::{ConnectorFactory, Error, Result, WifiConnector};

use crate::join::{await_association, first_usable_ipv4, key_value};
use crate::runner::{CommandRunner, run_checked};

pub const PLATFORM: &str = "windows";

/// Association checks after `netsh wlan connect` returns
pub const CONNECT_ATTEMPTS: u32 = 10;

const NAME_KEYS: &[&str] = &["Name", "名称"];
const SSID_KEYS: &[&str] = &["SSID", "网络名称"];
const ADDRESS_KEYS: &[&str] = &["IP Address", "IPv4 Address", "IP 地址", "IPv4 地址"];
const ENABLED_MARKERS: &[&str] = &["Enabled", "已启用", "Connected", "已连接"];

const WMIC_FILTER: &str = "NetConnectionID like '%Wi-Fi%' or NetConnectionID like '%无线%' or NetConnectionID like '%WLAN%'";

/// Wireless connector for Windows hosts
pub struct WindowsConnector {
    runner: Arc<dyn CommandRunner>,
    interface: String,
    /// Where temporary WLAN profiles are written
    profile_dir: PathBuf,
}

impl WindowsConnector {
    pub fn new(runner: Arc<dyn CommandRunner>, interface: impl Into<String>) -> Self {
        Self {
            runner,
            interface: interface.into(),
            profile_dir: std::env::temp_dir(),
        }
    }

    #[cfg(test)]
    fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = dir.into();
        self
    }

    /// Find the WLAN interface and bind to it
    pub async fn resolve(runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let interface = resolve_interface(runner.as_ref()).await?;
        info!("Using wireless interface {}", interface);
        Ok(Self::new(runner, interface))
    }

    async fn netsh(&self, args: &[&str]) -> Result<String> {
        run_checked(self.runner.as_ref(), "netsh", args, None).await
    }

    async fn add_profile(&self, network: &str, secret: &str) -> Result<()> {
        let path = self.profile_dir.join(profile_file_name(network));
        tokio::fs::write(&path, profile_xml(network, secret))
            .await
            .map_err(|e| Error::connect(format!("failed to write profile file: {e}")))?;

        let filename = format!("filename={}", path.display());
        let interface = format!("interface={}", self.interface);
        let result = self
            .netsh(&["wlan", "add", "profile", &filename, &interface])
            .await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove profile file {}: {}", path.display(), e);
        }

        result.map(|_| ()).map_err(|e| Error::connect(e.to_string()))
    }
}

async fn resolve_interface(runner: &dyn CommandRunner) -> Result<String> {
    match run_checked(runner, "netsh", &["wlan", "show", "interfaces"], None).await {
        Ok(stdout) => {
            if let Some(name) = parse_interface_name(&stdout) {
                return Ok(name);
            }
            debug!("netsh lists no WLAN interface, asking wmic");
        }
        Err(e) => debug!("netsh wlan unavailable ({}), asking wmic", e),
    }

    let wmic_args = [
        "path",
        "win32_networkadapter",
        "where",
        WMIC_FILTER,
        "get",
        "NetConnectionID",
        "/format:list",
    ];
    if let Ok(stdout) = run_checked(runner, "wmic", &wmic_args, None).await
        && let Some(name) = parse_wmic_connection_id(&stdout)
    {
        return Ok(name);
    }

    Err(Error::interface_not_found(
        "netsh reports no WLAN interface and wmic found no wireless adapter",
    ))
}

#[async_trait]
impl WifiConnector for WindowsConnector {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn current_network(&self) -> Result<String> {
        let stdout = self.netsh(&["wlan", "show", "interfaces"]).await?;
        Ok(parse_ssid(&stdout, &self.interface))
    }

    async fn connect(&self, network: &str, secret: Option<&str>) -> Result<()> {
        if let Some(secret) = secret {
            self.add_profile(network, secret).await?;
        }

        let name = format!("name={network}");
        let interface = format!("interface={}", self.interface);
        self.netsh(&["wlan", "connect", &name, &interface])
            .await
            .map_err(|e| Error::connect(e.to_string()))?;

        await_association(self, network, CONNECT_ATTEMPTS).await
    }

    async fn is_enabled(&self) -> bool {
        let name = format!("name={}", self.interface);
        match self.netsh(&["interface", "show", "interface", &name]).await {
            Ok(stdout) => ENABLED_MARKERS.iter().any(|m| stdout.contains(m)),
            Err(e) => {
                debug!("Treating {} as disabled: {}", self.interface, e);
                false
            }
        }
    }

    async fn enable(&self) -> Result<()> {
        let name = format!("name={}", self.interface);
        self.netsh(&["interface", "set", "interface", &name, "admin=enabled"])
            .await
            .map(|_| ())
            .map_err(|e| Error::enable(e.to_string()))
    }

    async fn current_address(&self) -> Result<Ipv4Addr> {
        let name = format!("name={}", self.interface);
        let stdout = self
            .netsh(&["interface", "ip", "show", "address", &name])
            .await
            .map_err(|e| Error::address_not_found(e.to_string()))?;

        parse_ip_addresses(&stdout).ok_or_else(|| {
            Error::address_not_found(format!("no IPv4 address on {}", self.interface))
        })
    }
}

/// Factory registered under [`PLATFORM`]
pub struct WindowsFactory {
    runner: Arc<dyn CommandRunner>,
}

impl WindowsFactory {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ConnectorFactory for WindowsFactory {
    async fn create(&self) -> Result<Box<dyn WifiConnector>> {
        Ok(Box::new(WindowsConnector::resolve(self.runner.clone()).await?))
    }
}

fn parse_interface_name(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = key_value(line)?;
        (NAME_KEYS.contains(&key) && !value.is_empty()).then(|| value.to_string())
    })
}

fn parse_wmic_connection_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("NetConnectionID=")?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// SSID reported for `interface` by `netsh wlan show interfaces`
///
/// The report holds one block per adapter, each opened by a Name line.
/// An adapter with no SSID line is not associated.
fn parse_ssid(output: &str, interface: &str) -> String {
    let mut in_block = true;
    for line in output.lines() {
        let Some((key, value)) = key_value(line) else {
            continue;
        };

        if NAME_KEYS.contains(&key) {
            in_block = value == interface;
        } else if in_block && SSID_KEYS.contains(&key) {
            return value.to_string();
        }
    }
    String::new()
}

/// First routable address in `netsh interface ip show address`
fn parse_ip_addresses(output: &str) -> Option<Ipv4Addr> {
    let candidates = output.lines().filter_map(|line| {
        let (key, value) = key_value(line)?;
        if !ADDRESS_KEYS.contains(&key) {
            return None;
        }
        Some(value.split('(').next().unwrap_or(value))
    });
    first_usable_ipv4(candidates)
}

fn profile_file_name(network: &str) -> String {
    let stem: String = network
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("wifiwatch-{}-{stem}.xml", std::process::id())
}

fn profile_xml(network: &str, secret: &str) -> String {
    let network = xml_escape(network);
    let secret = xml_escape(secret);
    format!(
        r#"<?xml version="1.0"?>
<WLANProfile xmlns="http://www.microsoft.com/networking/WLAN/profile/v1">
    <name>{network}</name>
    <SSIDConfig>
        <SSID>
            <name>{network}</name>
        </SSID>
    </SSIDConfig>
    <connectionType>ESS</connectionType>
    <connectionMode>auto</connectionMode>
    <MSM>
        <security>
            <authEncryption>
                <authentication>WPA2PSK</authentication>
                <encryption>AES</encryption>
                <useOneX>false</useOneX>
            </authEncryption>
            <sharedKey>
                <keyType>passPhrase</keyType>
                <protected>false</protected>
                <keyMaterial>{secret}</keyMaterial>
            </sharedKey>
        </security>
    </MSM>
</WLANProfile>
"#
    )
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
