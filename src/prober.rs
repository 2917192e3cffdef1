/*!
 * Online connection prober
 *
 * One trial = register a transient profile for the target, ask the adapter
 * to join, wait the settle window, then check the link is up on that very
 * profile. Being associated elsewhere counts as failure. The adapter is
 * disconnected and the profile removed on every exit path, including
 * faults, because a stale association corrupts the next trial.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::error::WifiError;
use crate::platform::{CipherSuite, LinkStatus, Profile, ProfileHandle, WirelessInterface};
use crate::wifi::{Network, Security};

/// Default wait between the connect request and the status check
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);

/// Anything that can test one secret against one network
///
/// `true` means the connection was established. Implementations never
/// fail: faults count as a failed trial.
pub trait Prober: Send {
    fn attempt(&mut self, target: &Network, secret: &str) -> bool;
}

impl<F> Prober for F
where
    F: FnMut(&Network, &str) -> bool + Send,
{
    fn attempt(&mut self, target: &Network, secret: &str) -> bool {
        self(target, secret)
    }
}

/// How the profile's auth/cipher suite is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuitePolicy {
    /// Follow the target: WPA-PSK/TKIP for WPA networks, WPA2-PSK/CCMP otherwise
    #[default]
    Mirror,
    /// Always WPA2-PSK/CCMP
    Wpa2Only,
}

impl SuitePolicy {
    pub fn suite_for(self, security: Security) -> CipherSuite {
        match (self, security) {
            (SuitePolicy::Mirror, Security::WpaPersonal) => CipherSuite::WPA_TKIP,
            _ => CipherSuite::WPA2_CCMP,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub settle: Duration,
    pub suite_policy: SuitePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            suite_policy: SuitePolicy::default(),
        }
    }
}

/// Prober that performs real association attempts on a wireless interface
pub struct ConnectionProber {
    iface: Arc<dyn WirelessInterface>,
    config: ProbeConfig,
}

impl ConnectionProber {
    pub fn new(iface: Arc<dyn WirelessInterface>, config: ProbeConfig) -> Self {
        Self { iface, config }
    }

    fn try_connect(&self, target: &Network, secret: &str) -> Result<bool, WifiError> {
        let profile = Profile {
            ssid: target.ssid.clone(),
            suite: self.config.suite_policy.suite_for(target.security),
            key: secret.to_string(),
        };

        let mut trial = Trial::new(self.iface.as_ref());
        self.iface.remove_all_profiles()?;
        trial.register(&profile)?;
        trial.connect()?;

        std::thread::sleep(self.config.settle);

        trial.joined()
    }
}

impl Prober for ConnectionProber {
    fn attempt(&mut self, target: &Network, secret: &str) -> bool {
        match self.try_connect(target, secret) {
            Ok(connected) => connected,
            Err(e) => {
                log::debug!("Trial against {} failed: {}", target.ssid, e);
                false
            }
        }
    }
}

/// Scoped trial: disconnects and drops the transient profile when it goes out of scope
struct Trial<'a> {
    iface: &'a dyn WirelessInterface,
    handle: Option<ProfileHandle>,
}

impl<'a> Trial<'a> {
    fn new(iface: &'a dyn WirelessInterface) -> Self {
        Self {
            iface,
            handle: None,
        }
    }

    fn register(&mut self, profile: &Profile) -> Result<(), WifiError> {
        self.handle = Some(self.iface.add_profile(profile)?);
        Ok(())
    }

    fn connect(&self) -> Result<(), WifiError> {
        match &self.handle {
            Some(handle) => self.iface.connect(handle),
            None => Err(WifiError::command(self.iface.name(), "no profile registered")),
        }
    }

    /// Linked through this trial's profile, not merely linked
    fn joined(&self) -> Result<bool, WifiError> {
        let link = self.iface.status()?;
        let joined = self.handle.as_ref().map_or(false, |h| link.is_joined(h));
        if !joined && link.status == LinkStatus::Connected {
            log::debug!(
                "Adapter is on {:?} instead of the trial profile",
                link.profile.as_ref().or(link.ssid.as_ref())
            );
        }
        Ok(joined)
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.iface.disconnect() {
            log::debug!("Disconnect after trial failed: {}", e);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.iface.remove_profile(&handle) {
                log::debug!("Removing profile {} failed: {}", handle.name, e);
            }
        }
    }
}
