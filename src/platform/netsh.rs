//! Windows backend on top of `netsh wlan`

use super::{list_with, run, AuthSuite, Cipher, Link, LinkStatus, Profile, ProfileHandle, WirelessInterface, PROFILE_PREFIX};
use crate::error::WifiError;
use crate::wifi::{Akm, ScanEntry};

const NETSH: &str = "netsh";

pub struct Netsh {
    interface: String,
}

impl Netsh {
    pub fn new(interface: String) -> Self {
        Self { interface }
    }

    pub fn interfaces() -> Result<Vec<String>, WifiError> {
        let stdout = list_with(NETSH, &["wlan", "show", "interfaces"])?;
        Ok(parse_interfaces(&stdout))
    }

    fn interface_arg(&self) -> String {
        format!("interface={}", self.interface)
    }
}

impl WirelessInterface for Netsh {
    fn name(&self) -> &str {
        &self.interface
    }

    fn trigger_scan(&self) -> Result<(), WifiError> {
        // netsh has no scan verb; the WLAN service rescans on its own
        log::debug!("Relying on background scan for {}", self.interface);
        Ok(())
    }

    fn scan_results(&self) -> Result<Vec<ScanEntry>, WifiError> {
        let stdout = run(
            NETSH,
            &["wlan", "show", "networks", "mode=bssid", &self.interface_arg()],
        )
        .map_err(|e| WifiError::Scan(e.to_string()))?;

        Ok(parse_networks(&stdout))
    }

    fn remove_all_profiles(&self) -> Result<(), WifiError> {
        let stdout = run(NETSH, &["wlan", "show", "profiles", &self.interface_arg()])?;
        for name in parse_profiles(&stdout) {
            if name.starts_with(PROFILE_PREFIX) {
                run(
                    NETSH,
                    &["wlan", "delete", "profile", &format!("name={}", name), &self.interface_arg()],
                )?;
            }
        }
        Ok(())
    }

    fn add_profile(&self, profile: &Profile) -> Result<ProfileHandle, WifiError> {
        let name = profile.name();
        let path = std::env::temp_dir().join(format!("{}.xml", sanitize_file_name(&name)));

        std::fs::write(&path, profile_xml(&name, profile))
            .map_err(|e| WifiError::command(NETSH, format!("cannot write profile: {}", e)))?;

        let result = run(
            NETSH,
            &[
                "wlan", "add", "profile",
                &format!("filename={}", path.display()),
                &self.interface_arg(),
            ],
        );

        // The XML holds the key in clear text
        let _ = std::fs::remove_file(&path);
        result?;

        Ok(ProfileHandle {
            name,
            ssid: profile.ssid.clone(),
        })
    }

    fn remove_profile(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        run(
            NETSH,
            &["wlan", "delete", "profile", &format!("name={}", handle.name), &self.interface_arg()],
        )
        .map(|_| ())
    }

    fn connect(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        run(
            NETSH,
            &[
                "wlan", "connect",
                &format!("name={}", handle.name),
                &format!("ssid={}", handle.ssid),
                &self.interface_arg(),
            ],
        )
        .map(|_| ())
    }

    fn disconnect(&self) -> Result<(), WifiError> {
        run(NETSH, &["wlan", "disconnect", &self.interface_arg()]).map(|_| ())
    }

    fn status(&self) -> Result<Link, WifiError> {
        let stdout = run(NETSH, &["wlan", "show", "interfaces"])?;
        Ok(parse_link(&stdout, &self.interface))
    }
}

/// Split `Key   : value` at the first colon; values may contain colons
fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn parse_interfaces(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(key_value)
        .filter(|(k, _)| *k == "Name")
        .map(|(_, v)| v.to_string())
        .collect()
}

fn parse_profiles(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(key_value)
        .filter(|(k, v)| k.ends_with("Profile") && !v.is_empty())
        .map(|(_, v)| v.to_string())
        .collect()
}

fn parse_authentication(auth: &str) -> Vec<Akm> {
    match auth {
        "Open" => Vec::new(),
        "WPA2-Personal" => vec![Akm::Wpa2Psk],
        "WPA-Personal" => vec![Akm::WpaPsk],
        "WPA2-Enterprise" => vec![Akm::Wpa2Enterprise],
        "WPA-Enterprise" => vec![Akm::WpaEnterprise],
        _ => vec![Akm::Other],
    }
}

/// Parse `netsh wlan show networks mode=bssid`, one entry per BSSID
fn parse_networks(output: &str) -> Vec<ScanEntry> {
    let mut entries: Vec<ScanEntry> = Vec::new();
    let mut ssid = String::new();
    let mut akms = Vec::new();

    for (key, value) in output.lines().filter_map(key_value) {
        if key.starts_with("SSID") {
            ssid = value.to_string();
            akms.clear();
        } else if key == "Authentication" {
            akms = parse_authentication(value);
        } else if key.starts_with("BSSID") {
            entries.push(ScanEntry {
                ssid: ssid.clone(),
                bssid: value.to_lowercase(),
                signal: -100,
                akms: akms.clone(),
            });
        } else if key == "Signal" {
            if let Some(entry) = entries.last_mut() {
                let percent: i32 = value.trim_end_matches('%').trim().parse().unwrap_or(0);
                entry.signal = percent.clamp(0, 100) / 2 - 100;
            }
        }
    }

    entries
}

/// Link of one interface from `netsh wlan show interfaces`
fn parse_link(output: &str, interface: &str) -> Link {
    let mut link = Link {
        status: LinkStatus::Unknown,
        profile: None,
        ssid: None,
    };
    let mut in_block = false;

    for (key, value) in output.lines().filter_map(key_value) {
        if key == "Name" {
            if in_block {
                break;
            }
            in_block = value == interface;
            continue;
        }
        if !in_block || value.is_empty() {
            continue;
        }

        match key {
            "State" => {
                link.status = match value {
                    "connected" => LinkStatus::Connected,
                    "disconnected" => LinkStatus::Disconnected,
                    "associating" | "authenticating" | "discovering" => LinkStatus::Connecting,
                    _ => LinkStatus::Unknown,
                };
            }
            "SSID" => link.ssid = Some(value.to_string()),
            "Profile" => link.profile = Some(value.to_string()),
            _ => {}
        }
    }

    link
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// WLAN profile document for a manual-connect PSK network
fn profile_xml(name: &str, profile: &Profile) -> String {
    let authentication = match profile.suite.auth {
        AuthSuite::WpaPsk => "WPAPSK",
        AuthSuite::Wpa2Psk => "WPA2PSK",
    };
    let encryption = match profile.suite.cipher {
        Cipher::Tkip => "TKIP",
        Cipher::Ccmp => "AES",
    };

    format!(
        r#"<?xml version="1.0"?>
<WLANProfile xmlns="http://www.microsoft.com/networking/WLAN/profile/v1">
    <name>{name}</name>
    <SSIDConfig>
        <SSID>
            <name>{ssid}</name>
        </SSID>
    </SSIDConfig>
    <connectionType>ESS</connectionType>
    <connectionMode>manual</connectionMode>
    <MSM>
        <security>
            <authEncryption>
                <authentication>{authentication}</authentication>
                <encryption>{encryption}</encryption>
                <useOneX>false</useOneX>
            </authEncryption>
            <sharedKey>
                <keyType>passPhrase</keyType>
                <protected>false</protected>
                <keyMaterial>{key}</keyMaterial>
            </sharedKey>
        </security>
    </MSM>
</WLANProfile>
"#,
        name = xml_escape(name),
        ssid = xml_escape(&profile.ssid),
        authentication = authentication,
        encryption = encryption,
        key = xml_escape(&profile.key),
    )
}
