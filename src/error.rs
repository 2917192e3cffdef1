/*!
 * Error taxonomy
 *
 * Only failures that cross a component boundary are typed here. Faults
 * inside a single connection trial never leave the prober.
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::wifi::Security;

/// Failures of the wireless subsystem and the network discoverer
#[derive(Debug, Error)]
pub enum WifiError {
    /// No usable wireless adapter. Fatal.
    #[error("no wireless interface available")]
    NoInterface,

    /// The scan query failed. The caller may rescan.
    #[error("scan failed: {0}")]
    Scan(String),

    /// An OS tool invocation failed
    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },
}

impl WifiError {
    pub(crate) fn command(program: &str, message: impl Into<String>) -> Self {
        WifiError::Command {
            program: program.to_string(),
            message: message.into(),
        }
    }

    /// Whether the interactive loop can retry after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WifiError::NoInterface)
    }
}

/// Failures of the candidate stream
#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("wordlist not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("error reading wordlist {} near line {line}: {source}", .path.display())]
    Read {
        path: PathBuf,
        line: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Rejections raised before a session enters `Running`
#[derive(Debug, Error)]
pub enum AttackError {
    #[error("{0} networks are not supported")]
    UnsupportedSecurity(Security),

    #[error("invalid network selection {rank} (expected 1..={available})")]
    InvalidTarget { rank: usize, available: usize },
}
