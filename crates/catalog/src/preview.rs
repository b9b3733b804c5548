//! Preview load requests for the visible page.

use std::sync::Arc;

use crate::cancel::{CancellationToken, VersionTracker};
use crate::types::RecordId;

/// Loads preview images. Implementations should stop early once `cancel`
/// reports cancellation.
pub trait PreviewLoader: Send + Sync {
    fn load(&self, ids: &[RecordId], cancel: CancellationToken);
}

/// Issues a load whenever the visible id set changes, cancelling the previous one.
#[derive(Default)]
pub struct PreviewDispatcher {
    loader: Option<Arc<dyn PreviewLoader>>,
    versions: VersionTracker,
    last: Option<Vec<RecordId>>,
}

impl PreviewDispatcher {
    pub fn new(loader: Arc<dyn PreviewLoader>) -> Self {
        Self {
            loader: Some(loader),
            versions: VersionTracker::new(),
            last: None,
        }
    }

    pub fn set_loader(&mut self, loader: Option<Arc<dyn PreviewLoader>>) {
        self.cancel();
        self.loader = loader;
    }

    /// Requests previews for `ids`. Returns `false` when the set is unchanged
    /// or no loader is attached.
    pub fn dispatch(&mut self, ids: &[RecordId]) -> bool {
        if self.last.as_deref() == Some(ids) {
            return false;
        }
        self.last = Some(ids.to_vec());
        let Some(loader) = &self.loader else {
            return false;
        };
        let token = self.versions.next_token();
        log::debug!(
            "preview load ids={} version={}",
            ids.len(),
            token.version()
        );
        loader.load(ids, token);
        true
    }

    /// Cancels the outstanding load and forgets the last set.
    pub fn cancel(&mut self) {
        self.versions.cancel_all();
        self.last = None;
    }
}

impl std::fmt::Debug for PreviewDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewDispatcher")
            .field("has_loader", &self.loader.is_some())
            .field("version", &self.versions.current_version())
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<(Vec<RecordId>, CancellationToken)>>,
    }

    impl PreviewLoader for Recorder {
        fn load(&self, ids: &[RecordId], cancel: CancellationToken) {
            self.requests.lock().push((ids.to_vec(), cancel));
        }
    }

    #[test]
    fn changed_set_cancels_previous_request() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = PreviewDispatcher::new(recorder.clone());

        assert!(dispatcher.dispatch(&[1, 2]));
        assert!(!dispatcher.dispatch(&[1, 2]));
        assert!(dispatcher.dispatch(&[3]));

        let requests = recorder.requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].1.is_cancelled().is_none());
        assert!(requests[1].1.is_cancelled().is_some());
    }

    #[test]
    fn without_loader_nothing_is_issued() {
        let mut dispatcher = PreviewDispatcher::default();
        assert!(!dispatcher.dispatch(&[1]));
    }
}
