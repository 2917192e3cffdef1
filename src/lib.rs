// Public exports for the binary and integration tests
pub mod bruteforce;
pub mod error;
pub mod platform;
pub mod prober;
pub mod progress;
pub mod wifi;
pub mod wordlist;

pub use bruteforce::{
    select_target, AttackConfig, BruteforceResult, CancelFlag, ExhaustReason, OnlineBruteForcer,
    Outcome,
};
pub use error::{AttackError, WifiError, WordlistError};
pub use platform::{open_system_interface, WirelessInterface};
pub use prober::{ConnectionProber, ProbeConfig, Prober, SuitePolicy};
pub use progress::{spawn_reporter, Phase, ProgressSink, ProgressSnapshot, ProgressView, ReporterConfig};
pub use wifi::{Network, ScanConfig, Security, WifiScanner};
pub use wordlist::{Candidate, Candidates, Wordlist};
