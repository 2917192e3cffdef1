/*!
 * Online WPA/WPA2-Personal bruteforce engine
 *
 * Sequential by construction: an adapter holds one association at a time,
 * so candidates are tried strictly one after another.
 *
 * Session lifecycle: `Idle -> Running -> {Succeeded, Exhausted, Aborted}`.
 * Enterprise targets are refused before `Running`.
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{AttackError, WordlistError};
use crate::progress::{Phase, ProgressHandle, ProgressView};
use crate::prober::Prober;
use crate::wifi::Network;
use crate::wordlist::{Candidate, Wordlist};

/// Shortest valid WPA passphrase
pub const MIN_KEY_LEN: usize = 8;
/// Longest valid WPA passphrase
pub const MAX_KEY_LEN: usize = 63;
/// Default safety ceiling on the attempt counter
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000;

/// Bruteforce configuration
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Stop once the attempt counter reaches this line number
    pub max_attempts: u64,
    pub min_len: usize,
    pub max_len: usize,
    /// Wordlist lines to skip before the first candidate
    pub resume_from: u64,
    /// Log an attempt line every N line numbers (0 disables)
    pub announce_every: u64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_len: MIN_KEY_LEN,
            max_len: MAX_KEY_LEN,
            resume_from: 0,
            announce_every: 100,
        }
    }
}

/// Why a session ran out of candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustReason {
    EndOfWordlist,
    /// The attempt ceiling was reached
    Ceiling(u64),
    /// The wordlist could not be opened or read
    Source(String),
}

/// Terminal state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(String),
    Exhausted(ExhaustReason),
    Aborted,
}

impl Outcome {
    fn phase(&self) -> Phase {
        match self {
            Outcome::Succeeded(_) => Phase::Succeeded,
            Outcome::Exhausted(_) => Phase::Exhausted,
            Outcome::Aborted => Phase::Aborted,
        }
    }
}

/// Bruteforce result
#[derive(Debug, Clone)]
pub struct BruteforceResult {
    pub ssid: String,
    pub outcome: Outcome,
    /// Line number of the last candidate counted
    pub attempts: u64,
    /// Prober invocations
    pub trials: u64,
    /// Wordlist line estimate, 0 when unknown
    pub total: u64,
    pub duration: Duration,
}

impl BruteforceResult {
    pub fn password(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Succeeded(secret) => Some(secret),
            _ => None,
        }
    }

    /// Throughput in attempts per second, reported for successful sessions only
    pub fn passwords_per_second(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        match self.outcome {
            Outcome::Succeeded(_) if secs > 0.0 => Some(self.attempts as f64 / secs),
            _ => None,
        }
    }
}

/// Cancellation signal checked between candidates
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm for a new session
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Resolve a 1-based rank from the discovery listing
pub fn select_target(networks: &[Network], rank: usize) -> Result<&Network, AttackError> {
    rank.checked_sub(1)
        .and_then(|idx| networks.get(idx))
        .ok_or(AttackError::InvalidTarget {
            rank,
            available: networks.len(),
        })
}

/// One attack session against one target
///
/// Consumed by the crack call, so a session runs at most once.
pub struct OnlineBruteForcer {
    target: Network,
    config: AttackConfig,
    progress: ProgressHandle,
    seen: HashSet<String>,
    attempts: u64,
    trials: u64,
}

impl OnlineBruteForcer {
    pub fn new(target: Network, config: AttackConfig) -> Self {
        Self {
            target,
            config,
            progress: ProgressHandle::new(),
            seen: HashSet::new(),
            attempts: 0,
            trials: 0,
        }
    }

    /// Read-only progress for a reporter; valid before and after the run
    pub fn progress(&self) -> ProgressView {
        self.progress.view()
    }

    /// Run against a wordlist on disk
    pub fn crack_wordlist<P>(
        self,
        wordlist: &Wordlist,
        prober: &mut P,
        cancel: &CancelFlag,
    ) -> Result<BruteforceResult, AttackError>
    where
        P: Prober + ?Sized,
    {
        self.ensure_supported()?;

        // Best effort: an unknown total only hides the percentage
        let total = wordlist.count_lines().unwrap_or_else(|e| {
            log::warn!("Could not count wordlist lines: {}", e);
            0
        });

        match wordlist.stream(self.config.resume_from) {
            Ok(candidates) => self.run(total, candidates, prober, cancel),
            Err(e) => self.run(total, std::iter::once(Err(e)), prober, cancel),
        }
    }

    /// Run against any candidate source
    pub fn crack_candidates<I, P>(
        self,
        total: u64,
        candidates: I,
        prober: &mut P,
        cancel: &CancelFlag,
    ) -> Result<BruteforceResult, AttackError>
    where
        I: IntoIterator<Item = Result<Candidate, WordlistError>>,
        P: Prober + ?Sized,
    {
        self.ensure_supported()?;
        self.run(total, candidates, prober, cancel)
    }

    fn ensure_supported(&self) -> Result<(), AttackError> {
        if self.target.security.is_enterprise() {
            self.progress.finish(Phase::Rejected);
            return Err(AttackError::UnsupportedSecurity(self.target.security));
        }
        Ok(())
    }

    fn run<I, P>(
        mut self,
        total: u64,
        candidates: I,
        prober: &mut P,
        cancel: &CancelFlag,
    ) -> Result<BruteforceResult, AttackError>
    where
        I: IntoIterator<Item = Result<Candidate, WordlistError>>,
        P: Prober + ?Sized,
    {
        log::info!(
            "Starting attack on {} ({}), {} wordlist lines",
            self.target.ssid,
            self.target.security,
            total
        );

        let start_time = Instant::now();
        self.progress.begin(total);

        let outcome = self.drive(candidates.into_iter(), prober, cancel);

        let duration = start_time.elapsed();
        self.progress.finish(outcome.phase());
        log::info!(
            "Attack on {} ended: {:?} after {} attempts ({} trials) in {:.2}s",
            self.target.ssid,
            outcome.phase(),
            self.attempts,
            self.trials,
            duration.as_secs_f64()
        );

        Ok(BruteforceResult {
            ssid: self.target.ssid,
            outcome,
            attempts: self.attempts,
            trials: self.trials,
            total,
            duration,
        })
    }

    fn drive<I, P>(&mut self, mut candidates: I, prober: &mut P, cancel: &CancelFlag) -> Outcome
    where
        I: Iterator<Item = Result<Candidate, WordlistError>>,
        P: Prober + ?Sized,
    {
        loop {
            if cancel.is_cancelled() {
                return Outcome::Aborted;
            }
            if self.attempts >= self.config.max_attempts {
                log::warn!("Reached maximum attempt limit ({})", self.config.max_attempts);
                return Outcome::Exhausted(ExhaustReason::Ceiling(self.config.max_attempts));
            }

            let candidate = match candidates.next() {
                None => return Outcome::Exhausted(ExhaustReason::EndOfWordlist),
                Some(Err(e)) => {
                    log::warn!("{}", e);
                    return Outcome::Exhausted(ExhaustReason::Source(e.to_string()));
                }
                Some(Ok(candidate)) => candidate,
            };

            let len = candidate.secret.chars().count();
            if len < self.config.min_len || len > self.config.max_len {
                log::trace!("Line {}: length {} out of range", candidate.sequence, len);
                self.advance(candidate.sequence);
                continue;
            }

            if self.seen.contains(&candidate.secret) {
                log::trace!("Line {}: duplicate", candidate.sequence);
                continue;
            }
            self.seen.insert(candidate.secret.clone());
            self.advance(candidate.sequence);

            if self.config.announce_every > 0 && candidate.sequence % self.config.announce_every == 0 {
                log::info!("Attempt {}", candidate.sequence);
            }
            log::debug!("Attempt {}: trying '{}'", candidate.sequence, candidate.secret);

            self.trials += 1;
            if prober.attempt(&self.target, &candidate.secret) {
                return Outcome::Succeeded(candidate.secret);
            }
        }
    }

    fn advance(&mut self, sequence: u64) {
        self.attempts = self.attempts.max(sequence);
        self.progress.advance(self.attempts);
    }
}
