//! Cancellation tokens for preview loads and usage classification.
//!
//! A `VersionTracker` hands out tokens bound to a version number. Starting a
//! new unit of work bumps the version, which cancels every token issued for an
//! older one.
//!
//! ## Sparse Checking
//!
//! For tight loops over large record sets, `is_cancelled_sparse()` only checks
//! every 4,096 iterations to keep atomic reads out of the hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How often long-running loops should check whether execution was cancelled.
/// Using a power of 2 allows efficient modulo via bitwise AND.
pub const CANCEL_CHECK_INTERVAL: usize = 0x1000; // 4,096

/// Tracks the active version of a cancellable operation.
#[derive(Debug, Default)]
pub struct VersionTracker {
    active_version: Arc<AtomicU64>,
}

impl VersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the active version and returns the new version number.
    ///
    /// Every token issued for an older version reports as cancelled afterwards.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current active version without incrementing.
    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    /// Cancels all outstanding tokens without issuing a new one.
    pub fn cancel_all(&self) {
        self.next_version();
    }

    /// Creates a cancellation token for the given version.
    pub fn token_for_version(&self, version: u64) -> CancellationToken {
        CancellationToken {
            active_version: Some(self.active_version.clone()),
            version,
        }
    }

    /// Bumps the version and returns a token for it.
    pub fn next_token(&self) -> CancellationToken {
        let version = self.next_version();
        self.token_for_version(version)
    }
}

/// A cancellation token handed to collaborators doing asynchronous work.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    /// `None` for tokens that can never be cancelled.
    active_version: Option<Arc<AtomicU64>>,
    version: u64,
}

impl CancellationToken {
    /// Creates a cancellation token that is never cancelled.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Returns the version this token was issued for.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled, so callers can
    /// bail out early with `?`.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        match &self.active_version {
            Some(active) if active.load(Ordering::Relaxed) != self.version => None,
            _ => Some(()),
        }
    }

    /// Sparse cancellation check - only checks every `CANCEL_CHECK_INTERVAL` iterations.
    #[inline]
    pub fn is_cancelled_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.is_cancelled()
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_token_is_never_cancelled() {
        let token = CancellationToken::noop();
        assert!(token.is_cancelled().is_some());
    }

    #[test]
    fn newer_version_cancels_older_token() {
        let tracker = VersionTracker::new();
        let first = tracker.next_token();
        assert!(first.is_cancelled().is_some());

        let second = tracker.next_token();
        assert!(first.is_cancelled().is_none());
        assert!(second.is_cancelled().is_some());

        tracker.cancel_all();
        assert!(second.is_cancelled().is_none());
    }

    #[test]
    fn sparse_check_skips_between_intervals() {
        let tracker = VersionTracker::new();
        let token = tracker.next_token();
        tracker.cancel_all();
        assert!(token.is_cancelled_sparse(1).is_some());
        assert!(token.is_cancelled_sparse(CANCEL_CHECK_INTERVAL).is_none());
    }
}
