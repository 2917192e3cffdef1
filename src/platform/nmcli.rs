//! Linux backend on top of NetworkManager's `nmcli`

use super::{list_with, run, AuthSuite, Cipher, Link, LinkStatus, Profile, ProfileHandle, WirelessInterface, PROFILE_PREFIX};
use crate::error::WifiError;
use crate::wifi::{Akm, ScanEntry};

const NMCLI: &str = "nmcli";

pub struct Nmcli {
    interface: String,
}

impl Nmcli {
    pub fn new(interface: String) -> Self {
        Self { interface }
    }

    /// Wireless devices known to NetworkManager
    pub fn interfaces() -> Result<Vec<String>, WifiError> {
        let stdout = list_with(NMCLI, &["-t", "-f", "DEVICE,TYPE", "device", "status"])?;
        Ok(parse_interfaces(&stdout))
    }
}

impl WirelessInterface for Nmcli {
    fn name(&self) -> &str {
        &self.interface
    }

    fn trigger_scan(&self) -> Result<(), WifiError> {
        // NetworkManager refuses back-to-back rescans; cached results are still usable
        if let Err(e) = run(NMCLI, &["device", "wifi", "rescan", "ifname", &self.interface]) {
            log::warn!("Rescan request rejected: {}", e);
        }
        Ok(())
    }

    fn scan_results(&self) -> Result<Vec<ScanEntry>, WifiError> {
        let stdout = run(
            NMCLI,
            &[
                "-t", "-f", "SSID,BSSID,SIGNAL,SECURITY", "device", "wifi", "list",
                "ifname", &self.interface, "--rescan", "no",
            ],
        )
        .map_err(|e| WifiError::Scan(e.to_string()))?;

        Ok(parse_wifi_list(&stdout))
    }

    fn remove_all_profiles(&self) -> Result<(), WifiError> {
        let stdout = run(NMCLI, &["-t", "-f", "NAME", "connection", "show"])?;
        for name in split_lines(&stdout) {
            let name = split_terse(name).remove(0);
            if name.starts_with(PROFILE_PREFIX) {
                run(NMCLI, &["connection", "delete", &name])?;
            }
        }
        Ok(())
    }

    fn add_profile(&self, profile: &Profile) -> Result<ProfileHandle, WifiError> {
        let name = profile.name();
        let (proto, pairwise) = match (profile.suite.auth, profile.suite.cipher) {
            (AuthSuite::Wpa2Psk, Cipher::Ccmp) => ("rsn", "ccmp"),
            (AuthSuite::Wpa2Psk, Cipher::Tkip) => ("rsn", "tkip"),
            (AuthSuite::WpaPsk, Cipher::Ccmp) => ("wpa", "ccmp"),
            (AuthSuite::WpaPsk, Cipher::Tkip) => ("wpa", "tkip"),
        };

        run(
            NMCLI,
            &[
                "connection", "add",
                "type", "wifi",
                "con-name", &name,
                "ifname", &self.interface,
                "ssid", &profile.ssid,
                "autoconnect", "no",
                "wifi-sec.key-mgmt", "wpa-psk",
                "wifi-sec.proto", proto,
                "wifi-sec.pairwise", pairwise,
                "wifi-sec.psk", &profile.key,
            ],
        )?;

        Ok(ProfileHandle {
            name,
            ssid: profile.ssid.clone(),
        })
    }

    fn remove_profile(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        run(NMCLI, &["connection", "delete", &handle.name]).map(|_| ())
    }

    fn connect(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        // --wait 0: return at once, the prober owns the settle window
        run(
            NMCLI,
            &["--wait", "0", "connection", "up", &handle.name, "ifname", &self.interface],
        )
        .map(|_| ())
    }

    fn disconnect(&self) -> Result<(), WifiError> {
        run(NMCLI, &["device", "disconnect", &self.interface]).map(|_| ())
    }

    fn status(&self) -> Result<Link, WifiError> {
        let stdout = run(
            NMCLI,
            &[
                "-t", "-f", "GENERAL.STATE,GENERAL.CONNECTION",
                "device", "show", &self.interface,
            ],
        )?;
        Ok(parse_device_link(&stdout))
    }
}

fn split_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().map(str::trim_end).filter(|l| !l.is_empty())
}

/// Split one line of `nmcli -t` output, honouring `\:` and `\\` escapes
pub(crate) fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_interfaces(output: &str) -> Vec<String> {
    split_lines(output)
        .map(split_terse)
        .filter(|fields| fields.len() >= 2 && fields[1] == "wifi")
        .map(|mut fields| fields.swap_remove(0))
        .collect()
}

/// Parse `nmcli -t -f SSID,BSSID,SIGNAL,SECURITY device wifi list`
fn parse_wifi_list(output: &str) -> Vec<ScanEntry> {
    let mut entries = Vec::new();

    for line in split_lines(output) {
        let fields = split_terse(line);
        if fields.len() < 4 {
            log::debug!("Skipping malformed nmcli row: {}", line);
            continue;
        }

        // SIGNAL is a 0-100 quality percentage
        let percent: i32 = fields[2].trim().parse().unwrap_or(0);

        entries.push(ScanEntry {
            ssid: fields[0].clone(),
            bssid: fields[1].to_lowercase(),
            signal: percent.clamp(0, 100) / 2 - 100,
            akms: parse_security(&fields[3]),
        });
    }

    entries
}

fn parse_security(security: &str) -> Vec<Akm> {
    let tokens: Vec<&str> = security.split_whitespace().filter(|t| *t != "--").collect();
    let enterprise = tokens.contains(&"802.1X");

    tokens
        .iter()
        .filter(|t| **t != "802.1X")
        .map(|t| match (*t, enterprise) {
            ("WPA1", false) => Akm::WpaPsk,
            ("WPA2", false) => Akm::Wpa2Psk,
            ("WPA1", true) => Akm::WpaEnterprise,
            ("WPA2", true) => Akm::Wpa2Enterprise,
            _ => Akm::Other,
        })
        .chain(
            // "802.1X" alone (dynamic WEP) still needs enterprise credentials
            (enterprise && tokens.len() == 1).then_some(Akm::Wpa2Enterprise),
        )
        .collect()
}

/// Parse `nmcli -t -f GENERAL.STATE,GENERAL.CONNECTION device show`
fn parse_device_link(output: &str) -> Link {
    let mut link = Link {
        status: LinkStatus::Unknown,
        profile: None,
        ssid: None,
    };

    for fields in split_lines(output).map(split_terse) {
        if fields.len() < 2 {
            continue;
        }
        match fields[0].as_str() {
            "GENERAL.STATE" => {
                let code = fields[1].split_whitespace().next().and_then(|c| c.parse::<u32>().ok());
                link.status = match code {
                    Some(100) => LinkStatus::Connected,
                    Some(40..=90) => LinkStatus::Connecting,
                    Some(20 | 30 | 110 | 120) => LinkStatus::Disconnected,
                    _ => LinkStatus::Unknown,
                };
            }
            "GENERAL.CONNECTION" => {
                let name = fields[1].trim();
                if !name.is_empty() && name != "--" {
                    link.profile = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    link
}
