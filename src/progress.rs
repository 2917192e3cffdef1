/*!
 * Session progress shared between the attack loop and the reporter
 *
 * The attack loop is the only writer. The reporter gets a read-only
 * [`ProgressView`] and polls snapshots on a fixed interval until the
 * session leaves `Running`.
 */

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Lifecycle of an attack session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Running = 1,
    Succeeded = 2,
    Exhausted = 3,
    Aborted = 4,
    /// Refused before start (unsupported target); never ran
    Rejected = 5,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Running,
            2 => Phase::Succeeded,
            3 => Phase::Exhausted,
            4 => Phase::Aborted,
            5 => Phase::Rejected,
            _ => Phase::Idle,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Running)
    }
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    total: AtomicU64,
    phase: AtomicU8,
}

/// Point-in-time copy of the shared counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub attempts: u64,
    /// Estimated line count, 0 when unknown
    pub total: u64,
    pub phase: Phase,
}

impl ProgressSnapshot {
    /// Completion percentage, `None` while the total is unknown
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| self.attempts as f64 / self.total as f64 * 100.0)
    }
}

/// Writer side, owned by the attack loop
#[derive(Debug, Default)]
pub struct ProgressHandle {
    inner: Arc<Counters>,
}

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ProgressView {
        ProgressView {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Enter `Running` with a fresh attempt counter
    pub(crate) fn begin(&self, total: u64) {
        self.inner.attempts.store(0, Ordering::Release);
        self.inner.total.store(total, Ordering::Release);
        self.inner.phase.store(Phase::Running as u8, Ordering::Release);
    }

    /// Raise the attempt counter; it never moves backwards
    pub(crate) fn advance(&self, attempts: u64) {
        self.inner.attempts.fetch_max(attempts, Ordering::AcqRel);
    }

    pub(crate) fn finish(&self, phase: Phase) {
        self.inner.phase.store(phase as u8, Ordering::Release);
    }
}

/// Read-only view for observers
#[derive(Debug, Clone)]
pub struct ProgressView {
    inner: Arc<Counters>,
}

impl ProgressView {
    pub fn snapshot(&self) -> ProgressSnapshot {
        // Phase first: a terminal phase is never paired with stale counters
        let phase = Phase::from_u8(self.inner.phase.load(Ordering::Acquire));
        ProgressSnapshot {
            attempts: self.inner.attempts.load(Ordering::Acquire),
            total: self.inner.total.load(Ordering::Acquire),
            phase,
        }
    }
}

/// Destination of periodic progress reports
pub trait ProgressSink: Send + 'static {
    /// Called once per interval while the session is running
    fn update(&mut self, snapshot: &ProgressSnapshot);

    /// Called once when the session has left `Running`
    fn finish(&mut self, _snapshot: &ProgressSnapshot) {}
}

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub interval: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Spawn the reporter task; it hands the sink back when the session ends
pub fn spawn_reporter<S: ProgressSink>(
    view: ProgressView,
    config: ReporterConfig,
    mut sink: S,
) -> JoinHandle<S> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);

        loop {
            ticker.tick().await;
            let snapshot = view.snapshot();

            match snapshot.phase {
                Phase::Idle => continue,
                Phase::Running => sink.update(&snapshot),
                _ => {
                    sink.finish(&snapshot);
                    break;
                }
            }
        }

        sink
    })
}
