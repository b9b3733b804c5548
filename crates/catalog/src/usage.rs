//! Background usage classification.
//!
//! Deciding whether a package is used by the current project is slow, so it
//! runs on its own thread through a caller-supplied `UsageClassifier`. Until a
//! run completes every record's usage is unknown and passes the usage filter.
//! Each published result bumps `generation`, which search sessions fold into
//! their rebuild cache key.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use fnv::FnvHashMap;
use parking_lot::{Mutex, RwLock};

use crate::cancel::{CancellationToken, VersionTracker};
use crate::error::Result;
use crate::types::{Record, RecordId};

/// Usage per record id; `true` when the record is in use.
pub type UsageMap = FnvHashMap<RecordId, bool>;

/// Decides which records are in use.
pub trait UsageClassifier: Send + Sync {
    /// Classifies `records`, reporting progress as it goes.
    ///
    /// Returns `Ok(None)` when `cancel` fired before the run finished.
    fn classify(
        &self,
        records: &[Arc<Record>],
        progress: &UsageProgress,
        cancel: &CancellationToken,
    ) -> Result<Option<UsageMap>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UsageState {
    Idle = 0,
    Running = 1,
    Ready = 2,
    Error = 3,
}

impl UsageState {
    pub fn load(atomic: &AtomicU8) -> Self {
        match atomic.load(Ordering::Relaxed) {
            1 => Self::Running,
            2 => Self::Ready,
            3 => Self::Error,
            _ => Self::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

/// Progress counters updated by the classifier.
#[derive(Debug, Default)]
pub struct UsageProgress {
    pub processed: AtomicUsize,
    pub total: AtomicUsize,
}

impl UsageProgress {
    fn reset(&self, total: usize) {
        self.processed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Records `count` more processed records.
    pub fn advance(&self, count: usize) {
        self.processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UsageProgressSnapshot {
        UsageProgressSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageProgressSnapshot {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
struct UsageShared {
    state: AtomicU8,
    progress: UsageProgress,
    results: RwLock<Option<Arc<UsageMap>>>,
    generation: AtomicU64,
    versions: VersionTracker,
    last_error: Mutex<Option<String>>,
}

impl UsageShared {
    /// Applies a finished run's outcome unless a newer run started since.
    ///
    /// The version check and the update happen under the results lock, which
    /// `UsageTracker::start` also holds while it takes a new version.
    fn finish(
        &self,
        version: u64,
        results: Option<Arc<UsageMap>>,
        state: UsageState,
        error: Option<String>,
    ) -> bool {
        let mut slot = self.results.write();
        if self.versions.current_version() != version {
            return false;
        }
        if let Some(results) = results {
            *slot = Some(results);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        if error.is_some() {
            *self.last_error.lock() = error;
        }
        self.state.store(state as u8, Ordering::Relaxed);
        true
    }
}

/// Owns the background classification and its published results.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    shared: Arc<UsageShared>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts classifying `records`, cancelling any run in flight.
    ///
    /// Previous results are dropped immediately, so usage is unknown until the
    /// new run completes.
    pub fn start(
        &self,
        classifier: Arc<dyn UsageClassifier>,
        records: Vec<Arc<Record>>,
    ) -> JoinHandle<()> {
        let token = {
            let mut slot = self.shared.results.write();
            let token = self.shared.versions.next_token();
            self.shared.progress.reset(records.len());
            *self.shared.last_error.lock() = None;
            *slot = None;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.shared
                .state
                .store(UsageState::Running as u8, Ordering::Relaxed);
            token
        };
        let version = token.version();

        let shared = self.shared.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                classifier.classify(&records, &shared.progress, &token)
            }));

            match outcome {
                Ok(Ok(Some(results))) => {
                    let used = results.values().filter(|used| **used).count();
                    if shared.finish(version, Some(Arc::new(results)), UsageState::Ready, None) {
                        log::info!(
                            "usage classification done records={} used={} elapsed_ms={}",
                            records.len(),
                            used,
                            started.elapsed().as_millis()
                        );
                    }
                }
                Ok(Ok(None)) => {
                    if shared.finish(version, None, UsageState::Idle, None) {
                        log::debug!("usage classification cancelled version={version}");
                    }
                }
                Ok(Err(error)) => {
                    log::warn!("usage classification failed: {error}");
                    shared.finish(version, None, UsageState::Error, Some(error.to_string()));
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "usage classifier panicked".to_string()
                    };
                    log::warn!("usage classification panicked: {panic_msg}");
                    shared.finish(
                        version,
                        None,
                        UsageState::Error,
                        Some(format!("panic during classification: {panic_msg}")),
                    );
                }
            }
        })
    }

    /// Cancels the run in flight, if any. Published results are kept.
    pub fn cancel(&self) {
        let _slot = self.shared.results.write();
        self.shared.versions.cancel_all();
        if self.state() == UsageState::Running {
            self.shared
                .state
                .store(UsageState::Idle as u8, Ordering::Relaxed);
        }
    }

    pub fn state(&self) -> UsageState {
        UsageState::load(&self.shared.state)
    }

    pub fn progress(&self) -> UsageProgressSnapshot {
        self.shared.progress.snapshot()
    }

    /// Bumped whenever results are published or cleared.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Completed results, or `None` while usage is unknown.
    pub fn results(&self) -> Option<Arc<UsageMap>> {
        self.shared.results.read().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().clone()
    }
}
