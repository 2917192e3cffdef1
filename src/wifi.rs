/*!
 * WiFi network discovery
 *
 * Triggers an adapter scan, waits a fixed window (completion is not
 * reliably signalled by the hardware), then classifies, deduplicates and
 * ranks the visible networks.
 */

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::WifiError;
use crate::platform::WirelessInterface;

/// Label used for networks that do not broadcast an SSID
pub const HIDDEN_NETWORK: &str = "Hidden Network";

/// Security scheme of a discovered network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Security {
    Open,
    WpaPersonal,
    Wpa2Personal,
    Enterprise,
    Unknown,
}

impl Security {
    /// Classify a network from the AKM suites it advertises
    ///
    /// WPA2-PSK wins over WPA-PSK when both are offered (mixed mode), and any
    /// PSK suite wins over enterprise.
    pub fn from_akms(akms: &[Akm]) -> Self {
        if akms.is_empty() || akms.iter().all(|a| *a == Akm::None) {
            Security::Open
        } else if akms.contains(&Akm::Wpa2Psk) {
            Security::Wpa2Personal
        } else if akms.contains(&Akm::WpaPsk) {
            Security::WpaPersonal
        } else if akms.contains(&Akm::Wpa2Enterprise) || akms.contains(&Akm::WpaEnterprise) {
            Security::Enterprise
        } else {
            Security::Unknown
        }
    }

    pub fn is_enterprise(self) -> bool {
        self == Security::Enterprise
    }

    pub fn label(self) -> &'static str {
        match self {
            Security::Open => "Open",
            Security::WpaPersonal => "WPA-PSK",
            Security::Wpa2Personal => "WPA2-PSK",
            Security::Enterprise => "Enterprise",
            Security::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Authentication and key management suite as reported by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Akm {
    None,
    WpaPsk,
    Wpa2Psk,
    WpaEnterprise,
    Wpa2Enterprise,
    Other,
}

/// One raw row of adapter scan output, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub ssid: String,
    pub bssid: String,
    /// Signal strength in dBm
    pub signal: i32,
    pub akms: Vec<Akm>,
}

/// A discovered network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    /// SSID, or [`HIDDEN_NETWORK`] when none is broadcast
    pub ssid: String,
    /// Access point hardware address
    pub bssid: String,
    /// Signal strength in dBm (negative, closer to zero is stronger)
    pub signal: i32,
    pub security: Security,
}

impl Network {
    /// Signal indicator from 1 to 5 bars
    pub fn signal_bars(&self) -> usize {
        ((self.signal + 100) / 20).clamp(1, 5) as usize
    }
}

impl From<ScanEntry> for Network {
    fn from(entry: ScanEntry) -> Self {
        let ssid = if entry.ssid.trim().is_empty() {
            HIDDEN_NETWORK.to_string()
        } else {
            entry.ssid
        };

        Network {
            ssid,
            bssid: entry.bssid,
            signal: entry.signal,
            security: Security::from_akms(&entry.akms),
        }
    }
}

/// Classify raw entries, keep the strongest entry per SSID and rank by signal
pub fn normalize(entries: Vec<ScanEntry>) -> Vec<Network> {
    let mut networks: Vec<Network> = entries.into_iter().map(Network::from).collect();

    // Stable sort, so equal signals keep scan order and the first one survives
    networks.sort_by(|a, b| b.signal.cmp(&a.signal));

    let mut seen = HashSet::new();
    networks.retain(|n| seen.insert(n.ssid.clone()));
    networks
}

/// Discovery timing
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Wait between triggering a scan and reading its results
    pub scan_wait: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_wait: Duration::from_secs(5),
        }
    }
}

/// Network discoverer bound to one wireless interface
pub struct WifiScanner {
    iface: Arc<dyn WirelessInterface>,
    config: ScanConfig,
}

impl WifiScanner {
    pub fn new(iface: Arc<dyn WirelessInterface>, config: ScanConfig) -> Self {
        Self { iface, config }
    }

    /// Scan for networks, ordered by descending signal strength
    pub fn scan(&self) -> Result<Vec<Network>, WifiError> {
        log::info!("Scanning on {}", self.iface.name());

        self.iface.trigger_scan().map_err(as_scan_error)?;
        std::thread::sleep(self.config.scan_wait);
        let entries = self.iface.scan_results().map_err(as_scan_error)?;

        let raw = entries.len();
        let networks = normalize(entries);
        log::debug!("{} scan entries, {} unique networks", raw, networks.len());

        Ok(networks)
    }
}

fn as_scan_error(e: WifiError) -> WifiError {
    match e {
        WifiError::NoInterface | WifiError::Scan(_) => e,
        other => WifiError::Scan(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ssid: &str, signal: i32, akms: &[Akm]) -> ScanEntry {
        ScanEntry {
            ssid: ssid.to_string(),
            bssid: format!("00:11:22:33:44:{:02x}", signal.unsigned_abs() % 256),
            signal,
            akms: akms.to_vec(),
        }
    }

    #[test]
    fn test_security_classification() {
        assert_eq!(Security::from_akms(&[]), Security::Open);
        assert_eq!(Security::from_akms(&[Akm::None]), Security::Open);
        assert_eq!(
            Security::from_akms(&[Akm::WpaPsk, Akm::Wpa2Psk]),
            Security::Wpa2Personal
        );
        assert_eq!(Security::from_akms(&[Akm::WpaPsk]), Security::WpaPersonal);
        assert_eq!(
            Security::from_akms(&[Akm::Wpa2Enterprise]),
            Security::Enterprise
        );
        assert_eq!(
            Security::from_akms(&[Akm::Wpa2Enterprise, Akm::Wpa2Psk]),
            Security::Wpa2Personal
        );
        assert_eq!(Security::from_akms(&[Akm::Other]), Security::Unknown);
    }

    #[test]
    fn test_hidden_ssid_gets_placeholder() {
        let network = Network::from(entry("", -40, &[Akm::Wpa2Psk]));
        assert_eq!(network.ssid, HIDDEN_NETWORK);

        let network = Network::from(entry("   ", -40, &[]));
        assert_eq!(network.ssid, HIDDEN_NETWORK);
    }

    #[test]
    fn test_normalize_dedups_and_sorts() {
        let networks = normalize(vec![
            entry("Cafe", -80, &[Akm::Wpa2Psk]),
            entry("Home", -70, &[Akm::Wpa2Psk]),
            entry("Cafe", -45, &[Akm::Wpa2Psk]),
            entry("Office", -55, &[Akm::Wpa2Enterprise]),
            entry("Home", -90, &[]),
        ]);

        let ssids: Vec<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids, vec!["Cafe", "Office", "Home"]);
        assert_eq!(networks[0].signal, -45);
        assert_eq!(networks[2].security, Security::Wpa2Personal);

        for pair in networks.windows(2) {
            assert!(pair[0].signal >= pair[1].signal);
        }
    }

    #[test]
    fn test_normalize_tie_keeps_first_seen() {
        let mut first = entry("Twin", -50, &[Akm::Wpa2Psk]);
        first.bssid = "aa:aa:aa:aa:aa:aa".to_string();
        let mut second = entry("Twin", -50, &[Akm::WpaPsk]);
        second.bssid = "bb:bb:bb:bb:bb:bb".to_string();

        let networks = normalize(vec![first, second]);
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].bssid, "aa:aa:aa:aa:aa:aa");
    }

    #[test]
    fn test_signal_bars() {
        let mut network = Network::from(entry("X", -30, &[]));
        assert_eq!(network.signal_bars(), 3);
        network.signal = -95;
        assert_eq!(network.signal_bars(), 1);
        network.signal = 20;
        assert_eq!(network.signal_bars(), 5);
    }
}
