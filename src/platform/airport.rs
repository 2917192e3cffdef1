//! macOS backend: `airport` for scanning, `networksetup` for joining

use std::collections::HashMap;
use std::process::Command;
use std::sync::Mutex;

use super::{list_with, run, Link, LinkStatus, Profile, ProfileHandle, WirelessInterface};
use crate::error::WifiError;
use crate::wifi::{Akm, ScanEntry};

const AIRPORT: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";
const NETWORKSETUP: &str = "networksetup";

/// A profile waiting for `connect`, since networksetup joins in one step
struct Registration {
    profile: Profile,
    /// The SSID was already a preferred network before this tool touched it
    preexisting: bool,
}

pub struct Airport {
    interface: String,
    registered: Mutex<Option<Registration>>,
    /// Per SSID: was it in the preferred list before the first trial
    preferred_before: Mutex<HashMap<String, bool>>,
}

impl Airport {
    pub fn new(interface: String) -> Self {
        Self {
            interface,
            registered: Mutex::new(None),
            preferred_before: Mutex::new(HashMap::new()),
        }
    }

    pub fn interfaces() -> Result<Vec<String>, WifiError> {
        let stdout = list_with(NETWORKSETUP, &["-listallhardwareports"])?;
        Ok(parse_hardware_ports(&stdout))
    }

    /// Checked once per SSID, before any trial could have added it
    fn was_preferred(&self, ssid: &str) -> Result<bool, WifiError> {
        let mut known = self.preferred_before.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(&preexisting) = known.get(ssid) {
            return Ok(preexisting);
        }

        let stdout = run(NETWORKSETUP, &["-listpreferredwirelessnetworks", &self.interface])?;
        let preexisting = parse_preferred_networks(&stdout).iter().any(|n| n == ssid);
        if preexisting {
            log::info!("{} is a saved network; it will be left in place", ssid);
        }
        known.insert(ssid.to_string(), preexisting);
        Ok(preexisting)
    }

    fn registered_key(&self, handle: &ProfileHandle) -> Option<(String, String)> {
        let registered = self.registered.lock().unwrap_or_else(|p| p.into_inner());
        registered
            .as_ref()
            .filter(|r| r.profile.name() == handle.name)
            .map(|r| (r.profile.ssid.clone(), r.profile.key.clone()))
    }

    /// Drop the registration; returns the SSID to forget if this tool added it
    fn release(&self, handle: &ProfileHandle) -> Option<String> {
        let mut registered = self.registered.lock().unwrap_or_else(|p| p.into_inner());
        if !registered.as_ref().map_or(false, |r| r.profile.name() == handle.name) {
            return None;
        }
        let released = registered.take()?;
        (!released.preexisting).then_some(released.profile.ssid)
    }

    fn set_power(&self, on: bool) -> Result<(), WifiError> {
        let state = if on { "on" } else { "off" };
        run(NETWORKSETUP, &["-setairportpower", &self.interface, state]).map(|_| ())
    }
}

impl WirelessInterface for Airport {
    fn name(&self) -> &str {
        &self.interface
    }

    fn trigger_scan(&self) -> Result<(), WifiError> {
        // `airport -s` scans synchronously when results are read
        Ok(())
    }

    fn scan_results(&self) -> Result<Vec<ScanEntry>, WifiError> {
        let stdout = run(AIRPORT, &["-s"]).map_err(|e| WifiError::Scan(e.to_string()))?;
        Ok(parse_airport_output(&stdout))
    }

    fn remove_all_profiles(&self) -> Result<(), WifiError> {
        self.registered.lock().unwrap_or_else(|p| p.into_inner()).take();
        Ok(())
    }

    fn add_profile(&self, profile: &Profile) -> Result<ProfileHandle, WifiError> {
        let preexisting = self.was_preferred(&profile.ssid)?;
        let handle = ProfileHandle {
            name: profile.name(),
            ssid: profile.ssid.clone(),
        };
        *self.registered.lock().unwrap_or_else(|p| p.into_inner()) = Some(Registration {
            profile: profile.clone(),
            preexisting,
        });
        Ok(handle)
    }

    fn remove_profile(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        match self.release(handle) {
            Some(ssid) => run(
                NETWORKSETUP,
                &["-removepreferredwirelessnetwork", &self.interface, &ssid],
            )
            .map(|_| ()),
            None => Ok(()),
        }
    }

    fn connect(&self, handle: &ProfileHandle) -> Result<(), WifiError> {
        let (ssid, key) = self
            .registered_key(handle)
            .ok_or_else(|| WifiError::command(NETWORKSETUP, "profile not registered"))?;

        let output = Command::new(NETWORKSETUP)
            .args(["-setairportnetwork", &self.interface, &ssid, &key])
            .output()
            .map_err(|e| WifiError::command(NETWORKSETUP, e.to_string()))?;

        // networksetup exits 0 even when the join fails
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if join_failed(&stdout) || join_failed(&stderr) {
            return Err(WifiError::command(NETWORKSETUP, stdout.trim().to_string()));
        }

        Ok(())
    }

    fn disconnect(&self) -> Result<(), WifiError> {
        self.set_power(false)?;
        self.set_power(true)
    }

    fn status(&self) -> Result<Link, WifiError> {
        let stdout = run(NETWORKSETUP, &["-getairportnetwork", &self.interface])?;
        Ok(parse_current_network(&stdout))
    }
}

fn join_failed(output: &str) -> bool {
    output.contains("Failed to join network")
        || output.contains("Error:")
        || output.contains("could not be completed")
}

fn parse_hardware_ports(output: &str) -> Vec<String> {
    let mut interfaces = Vec::new();
    let mut wifi_port = false;

    for line in output.lines() {
        if let Some(port) = line.strip_prefix("Hardware Port:") {
            let port = port.trim();
            wifi_port = port == "Wi-Fi" || port == "AirPort";
        } else if let Some(device) = line.strip_prefix("Device:") {
            if wifi_port {
                interfaces.push(device.trim().to_string());
            }
            wifi_port = false;
        }
    }

    interfaces
}

fn is_mac_address(token: &str) -> bool {
    token.len() == 17 && token.matches(':').count() == 5
}

/// Map one security token such as `WPA2(PSK/AES/AES)` or `NONE`
fn parse_security_token(token: &str) -> Akm {
    if token == "NONE" {
        return Akm::None;
    }

    let (family, rest) = match token.split_once('(') {
        Some(parts) => parts,
        None => return Akm::Other,
    };
    let auth = rest.split('/').next().unwrap_or("");

    match (family, auth) {
        ("WPA2" | "RSN", "PSK") => Akm::Wpa2Psk,
        ("WPA", "PSK") => Akm::WpaPsk,
        ("WPA2" | "RSN", "802.1x") => Akm::Wpa2Enterprise,
        ("WPA", "802.1x") => Akm::WpaEnterprise,
        _ => Akm::Other,
    }
}

/// Parse `airport -s` (SSID BSSID RSSI CHANNEL HT CC SECURITY)
fn parse_airport_output(output: &str) -> Vec<ScanEntry> {
    let mut entries = Vec::new();

    for line in output.lines().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let idx = match tokens.iter().position(|t| is_mac_address(t)) {
            Some(idx) => idx,
            None => continue,
        };
        if tokens.len() < idx + 5 {
            continue;
        }

        // SSIDs may contain spaces, so take everything left of the BSSID
        let ssid = line
            .find(tokens[idx])
            .map(|pos| line[..pos].trim().to_string())
            .unwrap_or_default();

        let akms = tokens[idx + 5..]
            .iter()
            .map(|t| parse_security_token(t))
            .filter(|a| *a != Akm::None)
            .collect();

        entries.push(ScanEntry {
            ssid,
            bssid: tokens[idx].to_lowercase(),
            signal: tokens[idx + 1].parse().unwrap_or(-100),
            akms,
        });
    }

    entries
}

/// Parse `networksetup -listpreferredwirelessnetworks`
fn parse_preferred_networks(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `networksetup -getairportnetwork`; only the SSID is reported
fn parse_current_network(output: &str) -> Link {
    let current = output.lines().find_map(|line| {
        line.strip_prefix("Current Wi-Fi Network:")
            .or_else(|| line.strip_prefix("Current AirPort Network:"))
    });

    match current {
        Some(ssid) => Link {
            status: LinkStatus::Connected,
            profile: None,
            ssid: Some(ssid.trim().to_string()),
        },
        None if output.contains("not associated") => Link::down(),
        None => Link {
            status: LinkStatus::Unknown,
            profile: None,
            ssid: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_airport_output() {
        let output = "\
                            SSID BSSID             RSSI CHANNEL HT CC SECURITY (auth/unicast/group)
                         HomeNet aa:bb:cc:dd:ee:01 -55  6       Y  US WPA2(PSK/AES/AES)
                    My Cafe Wifi AA:BB:CC:DD:EE:02 -70  11      Y  -- WPA(PSK/TKIP/TKIP) WPA2(PSK/AES,TKIP/TKIP)
                            Open aa:bb:cc:dd:ee:03 -80  1       N  -- NONE
                            Corp aa:bb:cc:dd:ee:04 -60  36      Y  US WPA2(802.1x/AES/AES)
";
        let entries = parse_airport_output(output);
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].ssid, "HomeNet");
        assert_eq!(entries[0].signal, -55);
        assert_eq!(entries[0].akms, vec![Akm::Wpa2Psk]);

        assert_eq!(entries[1].ssid, "My Cafe Wifi");
        assert_eq!(entries[1].bssid, "aa:bb:cc:dd:ee:02");
        assert_eq!(entries[1].akms, vec![Akm::WpaPsk, Akm::Wpa2Psk]);

        assert!(entries[2].akms.is_empty());
        assert_eq!(entries[3].akms, vec![Akm::Wpa2Enterprise]);
    }

    #[test]
    fn test_parse_hardware_ports() {
        let output = "\
Hardware Port: Ethernet
Device: en1
Ethernet Address: 00:00:00:00:00:01

Hardware Port: Wi-Fi
Device: en0
Ethernet Address: 00:00:00:00:00:02
";
        assert_eq!(parse_hardware_ports(output), vec!["en0"]);
    }

    fn handle(ssid: &str) -> ProfileHandle {
        ProfileHandle {
            name: format!("wifiprobe-{}", ssid),
            ssid: ssid.to_string(),
        }
    }

    fn profile(ssid: &str) -> Profile {
        Profile {
            ssid: ssid.to_string(),
            suite: crate::platform::CipherSuite::WPA2_CCMP,
            key: "password123".to_string(),
        }
    }

    #[test]
    fn test_parse_current_network() {
        let link = parse_current_network("Current Wi-Fi Network: HomeNet\n");
        assert_eq!(link.status, LinkStatus::Connected);
        assert_eq!(link.ssid.as_deref(), Some("HomeNet"));
        assert!(link.is_joined(&handle("HomeNet")));

        assert_eq!(
            parse_current_network("You are not associated with an AirPort network.\n"),
            Link::down()
        );
    }

    #[test]
    fn test_other_network_is_not_joined() {
        // The radio power cycle auto-joined a different preferred network
        let link = parse_current_network("Current Wi-Fi Network: NeighbourHome\n");
        assert_eq!(link.status, LinkStatus::Connected);
        assert!(!link.is_joined(&handle("HomeNet")));
    }

    #[test]
    fn test_parse_preferred_networks() {
        let output = "Preferred networks on en0:\n\tHomeNet\n\tMy Cafe Wifi\n";
        assert_eq!(parse_preferred_networks(output), vec!["HomeNet", "My Cafe Wifi"]);
    }

    fn airport_with_baseline(ssid: &str, preexisting: bool) -> Airport {
        let airport = Airport::new("en0".to_string());
        airport
            .preferred_before
            .lock()
            .unwrap()
            .insert(ssid.to_string(), preexisting);
        airport
    }

    #[test]
    fn test_saved_network_is_never_forgotten() {
        let airport = airport_with_baseline("HomeNet", true);
        let handle = airport.add_profile(&profile("HomeNet")).unwrap();

        assert!(airport.registered_key(&handle).is_some());
        assert_eq!(airport.release(&handle), None);
        assert!(airport.registered_key(&handle).is_none());
    }

    #[test]
    fn test_network_added_by_trial_is_forgotten() {
        let airport = airport_with_baseline("HomeNet", false);
        let handle = airport.add_profile(&profile("HomeNet")).unwrap();

        assert_eq!(airport.release(&handle), Some("HomeNet".to_string()));
        // Second release of the same trial is a no-op
        assert_eq!(airport.release(&handle), None);
    }

    #[test]
    fn test_key_stays_registered_until_release() {
        let airport = airport_with_baseline("HomeNet", false);
        let registered = airport.add_profile(&profile("HomeNet")).unwrap();

        assert_eq!(
            airport.registered_key(&registered),
            Some(("HomeNet".to_string(), "password123".to_string()))
        );
        assert!(airport.registered_key(&registered).is_some());
        assert!(airport.registered_key(&handle("Other")).is_none());
    }
}
