/*!
 * Platform wireless subsystem
 *
 * The attack engine only needs a handful of logical operations from the
 * OS: enumerate interfaces, scan, manage connection profiles,
 * connect/disconnect and query link status. Each platform drives its
 * native tooling to provide them:
 * - Linux: NetworkManager (`nmcli`)
 * - Windows: `netsh wlan`
 * - macOS: `airport` and `networksetup`
 */

mod airport;
mod netsh;
mod nmcli;

pub use airport::Airport;
pub use netsh::Netsh;
pub use nmcli::Nmcli;

use std::fmt;
use std::process::Command;
use std::sync::Arc;

use crate::error::WifiError;
use crate::wifi::ScanEntry;

/// Name prefix of every profile this tool registers
pub const PROFILE_PREFIX: &str = "wifiprobe-";

/// Key management used by a transient profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSuite {
    WpaPsk,
    Wpa2Psk,
}

/// Pairwise cipher used by a transient profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cipher {
    Tkip,
    Ccmp,
}

/// Authentication/cipher pair negotiated by a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub auth: AuthSuite,
    pub cipher: Cipher,
}

impl CipherSuite {
    pub const WPA2_CCMP: CipherSuite = CipherSuite {
        auth: AuthSuite::Wpa2Psk,
        cipher: Cipher::Ccmp,
    };

    pub const WPA_TKIP: CipherSuite = CipherSuite {
        auth: AuthSuite::WpaPsk,
        cipher: Cipher::Tkip,
    };
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match self.auth {
            AuthSuite::WpaPsk => "WPA-PSK",
            AuthSuite::Wpa2Psk => "WPA2-PSK",
        };
        let cipher = match self.cipher {
            Cipher::Tkip => "TKIP",
            Cipher::Ccmp => "CCMP",
        };
        write!(f, "{}/{}", auth, cipher)
    }
}

/// A connection profile to register on the interface
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    pub ssid: String,
    pub suite: CipherSuite,
    pub key: String,
}

impl Profile {
    /// Name under which the profile is registered
    pub fn name(&self) -> String {
        format!("{}{}", PROFILE_PREFIX, self.ssid)
    }
}

// Keep keys out of debug logs
impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("ssid", &self.ssid)
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

/// A profile registered on an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHandle {
    pub name: String,
    pub ssid: String,
}

/// Link state reported by the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
    Unknown,
}

/// Link state plus what the adapter is associated with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub status: LinkStatus,
    /// Active connection profile, on backends that report one
    pub profile: Option<String>,
    /// SSID of the associated network, when reported
    pub ssid: Option<String>,
}

impl Link {
    pub fn down() -> Self {
        Self {
            status: LinkStatus::Disconnected,
            profile: None,
            ssid: None,
        }
    }

    /// Connected through the registered profile
    ///
    /// A reported profile name is authoritative: the OS may autoconnect a
    /// saved profile for the same SSID, which proves nothing about the key.
    /// Without one, the SSID has to match.
    pub fn is_joined(&self, handle: &ProfileHandle) -> bool {
        if self.status != LinkStatus::Connected {
            return false;
        }
        match (&self.profile, &self.ssid) {
            (Some(profile), _) => *profile == handle.name,
            (None, Some(ssid)) => *ssid == handle.ssid,
            (None, None) => false,
        }
    }
}

/// Logical operations the engine needs from a wireless adapter
///
/// Implementations shell out to OS tooling and hold no connection state of
/// their own, so every method takes `&self`.
pub trait WirelessInterface: Send + Sync {
    /// Adapter name (e.g. wlan0, en0, Wi-Fi)
    fn name(&self) -> &str;

    /// Ask the adapter to start a scan. Completion is not awaited.
    fn trigger_scan(&self) -> Result<(), WifiError>;

    /// Read the latest scan results
    fn scan_results(&self) -> Result<Vec<ScanEntry>, WifiError>;

    /// Remove every profile this tool registered on the interface
    fn remove_all_profiles(&self) -> Result<(), WifiError>;

    fn add_profile(&self, profile: &Profile) -> Result<ProfileHandle, WifiError>;

    fn remove_profile(&self, handle: &ProfileHandle) -> Result<(), WifiError>;

    /// Issue a connect request. Does not wait for the link to settle.
    fn connect(&self, handle: &ProfileHandle) -> Result<(), WifiError>;

    fn disconnect(&self) -> Result<(), WifiError>;

    /// Current link, including which profile or SSID it is on
    fn status(&self) -> Result<Link, WifiError>;
}

/// Open the platform backend on the named interface, or the first one found
pub fn open_system_interface(name: Option<&str>) -> Result<Arc<dyn WirelessInterface>, WifiError> {
    #[cfg(target_os = "linux")]
    let available = Nmcli::interfaces()?;

    #[cfg(target_os = "windows")]
    let available = Netsh::interfaces()?;

    #[cfg(target_os = "macos")]
    let available = Airport::interfaces()?;

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    let available: Vec<String> = Vec::new();

    let chosen = pick_interface(&available, name)?;
    log::info!("Using wireless interface {}", chosen);

    #[cfg(target_os = "linux")]
    return Ok(Arc::new(Nmcli::new(chosen)));

    #[cfg(target_os = "windows")]
    return Ok(Arc::new(Netsh::new(chosen)));

    #[cfg(target_os = "macos")]
    return Ok(Arc::new(Airport::new(chosen)));

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    Err(WifiError::NoInterface)
}

fn pick_interface(available: &[String], wanted: Option<&str>) -> Result<String, WifiError> {
    match wanted {
        Some(name) => available
            .iter()
            .find(|i| i.as_str() == name)
            .cloned()
            .ok_or(WifiError::NoInterface),
        None => available.first().cloned().ok_or(WifiError::NoInterface),
    }
}

/// Run an OS tool and return its stdout, failing on a non-zero exit status
pub(crate) fn run(program: &str, args: &[&str]) -> Result<String, WifiError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| WifiError::command(program, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(WifiError::command(program, message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Enumerate interfaces, mapping a missing tool to "no interface"
pub(crate) fn list_with(program: &str, args: &[&str]) -> Result<String, WifiError> {
    run(program, args).map_err(|e| {
        log::warn!("Interface enumeration failed: {}", e);
        WifiError::NoInterface
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_interface() {
        let available = vec!["wlan0".to_string(), "wlan1".to_string()];
        assert_eq!(pick_interface(&available, None).unwrap(), "wlan0");
        assert_eq!(pick_interface(&available, Some("wlan1")).unwrap(), "wlan1");
        assert!(matches!(
            pick_interface(&available, Some("wlan9")),
            Err(WifiError::NoInterface)
        ));
        assert!(matches!(
            pick_interface(&[], None),
            Err(WifiError::NoInterface)
        ));
    }

    #[test]
    fn test_profile_name_and_debug() {
        let profile = Profile {
            ssid: "Home".to_string(),
            suite: CipherSuite::WPA2_CCMP,
            key: "supersecret".to_string(),
        };
        assert_eq!(profile.name(), "wifiprobe-Home");
        assert!(!format!("{:?}", profile).contains("supersecret"));
    }

    fn handle() -> ProfileHandle {
        ProfileHandle {
            name: "wifiprobe-Home".to_string(),
            ssid: "Home".to_string(),
        }
    }

    fn link(status: LinkStatus, profile: Option<&str>, ssid: Option<&str>) -> Link {
        Link {
            status,
            profile: profile.map(str::to_string),
            ssid: ssid.map(str::to_string),
        }
    }

    #[test]
    fn test_link_joined_only_through_own_profile() {
        let handle = handle();

        assert!(link(LinkStatus::Connected, Some("wifiprobe-Home"), None).is_joined(&handle));
        assert!(link(LinkStatus::Connected, None, Some("Home")).is_joined(&handle));

        // Another network entirely
        assert!(!link(LinkStatus::Connected, Some("Neighbour"), Some("Neighbour")).is_joined(&handle));
        assert!(!link(LinkStatus::Connected, None, Some("Neighbour")).is_joined(&handle));

        // The user's own saved profile for the same SSID autoconnected
        assert!(!link(LinkStatus::Connected, Some("Home"), Some("Home")).is_joined(&handle));

        assert!(!link(LinkStatus::Connected, None, None).is_joined(&handle));
        assert!(!link(LinkStatus::Connecting, Some("wifiprobe-Home"), None).is_joined(&handle));
        assert!(!Link::down().is_joined(&handle));
    }

    #[test]
    fn test_suite_display() {
        assert_eq!(CipherSuite::WPA2_CCMP.to_string(), "WPA2-PSK/CCMP");
        assert_eq!(CipherSuite::WPA_TKIP.to_string(), "WPA-PSK/TKIP");
    }
}
