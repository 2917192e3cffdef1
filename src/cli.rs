use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use wifiprobe::{AttackConfig, ProbeConfig, ReporterConfig, ScanConfig, SuitePolicy};

#[derive(Parser)]
#[command(name = "wifiprobe")]
#[command(author = "maxgfr")]
#[command(version)]
#[command(about = "WPA/WPA2 online wordlist attack - Educational use only", long_about = None)]
pub struct Args {
    /// WiFi interface to use (e.g., wlan0, en0, Wi-Fi)
    #[arg(short, long, global = true)]
    pub interface: Option<String>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to execute (default: attack)
    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand)]
pub enum Mode {
    /// List available WiFi networks
    ///
    /// Scans and displays all visible networks, strongest signal first.
    ///
    /// Example: wifiprobe list --json
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,

        /// Wait between scan trigger and result read, in milliseconds
        #[arg(long, default_value_t = 5000)]
        scan_wait_ms: u64,
    },

    /// Interactive online wordlist attack
    ///
    /// Scans, lets you pick a network, then tries every wordlist entry by
    /// actually joining the network. Each try takes a few seconds.
    ///
    /// Example: wifiprobe attack --wordlist rockyou.txt
    Attack(AttackArgs),
}

#[derive(ClapArgs, Clone)]
pub struct AttackArgs {
    /// Path to wordlist file (prompted for when omitted)
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// Stop after this many wordlist lines
    #[arg(long, default_value_t = wifiprobe::bruteforce::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u64,

    /// Skip the first N wordlist lines
    #[arg(long, default_value_t = 0)]
    pub resume_from: u64,

    /// Wait after each connect request before checking the link, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub settle_ms: u64,

    /// Wait between scan trigger and result read, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub scan_wait_ms: u64,

    /// Progress refresh interval, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub progress_ms: u64,

    /// Auth/cipher suite used for connection profiles
    #[arg(long, value_enum, default_value_t = SuiteArg::Mirror)]
    pub suite: SuiteArg,
}

impl Default for AttackArgs {
    fn default() -> Self {
        Self {
            wordlist: None,
            max_attempts: wifiprobe::bruteforce::DEFAULT_MAX_ATTEMPTS,
            resume_from: 0,
            settle_ms: 3000,
            scan_wait_ms: 5000,
            progress_ms: 1000,
            suite: SuiteArg::Mirror,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteArg {
    /// Match the network: WPA-PSK/TKIP for WPA, WPA2-PSK/CCMP otherwise
    Mirror,
    /// Always WPA2-PSK/CCMP
    Wpa2,
}

impl From<SuiteArg> for SuitePolicy {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Mirror => SuitePolicy::Mirror,
            SuiteArg::Wpa2 => SuitePolicy::Wpa2Only,
        }
    }
}

impl AttackArgs {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            scan_wait: Duration::from_millis(self.scan_wait_ms),
        }
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            settle: Duration::from_millis(self.settle_ms),
            suite_policy: self.suite.into(),
        }
    }

    pub fn attack_config(&self) -> AttackConfig {
        AttackConfig {
            max_attempts: self.max_attempts,
            resume_from: self.resume_from,
            ..AttackConfig::default()
        }
    }

    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            interval: Duration::from_millis(self.progress_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_is_default() {
        let args = Args::try_parse_from(["wifiprobe"]).unwrap();
        assert!(args.mode.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_attack_flags() {
        let args = Args::try_parse_from([
            "wifiprobe",
            "-vv",
            "attack",
            "--wordlist",
            "rockyou.txt",
            "--resume-from",
            "200",
            "--max-attempts",
            "5000",
            "--settle-ms",
            "1500",
            "--suite",
            "wpa2",
            "--interface",
            "wlan1",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.interface.as_deref(), Some("wlan1"));
        let attack = match args.mode {
            Some(Mode::Attack(attack)) => attack,
            _ => panic!("expected attack mode"),
        };
        assert_eq!(attack.wordlist, Some(PathBuf::from("rockyou.txt")));

        let config = attack.attack_config();
        assert_eq!(config.resume_from, 200);
        assert_eq!(config.max_attempts, 5000);
        assert_eq!(config.min_len, 8);

        let trial = attack.probe_config();
        assert_eq!(trial.settle, Duration::from_millis(1500));
        assert_eq!(trial.suite_policy, SuitePolicy::Wpa2Only);
    }

    #[test]
    fn test_defaults_match_library() {
        let args = AttackArgs::default();
        assert_eq!(args.scan_config().scan_wait, ScanConfig::default().scan_wait);
        assert_eq!(args.probe_config().settle, ProbeConfig::default().settle);
        assert_eq!(args.attack_config().max_attempts, AttackConfig::default().max_attempts);
        assert_eq!(args.reporter_config().interval, ReporterConfig::default().interval);
    }

    #[test]
    fn test_list_json() {
        let args = Args::try_parse_from(["wifiprobe", "list", "--json"]).unwrap();
        assert!(matches!(args.mode, Some(Mode::List { json: true, .. })));
    }
}
