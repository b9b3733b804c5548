//! In-memory fast-search mode.
//!
//! Entering the mode arms a capture (`Init`). The next full pipeline run hands
//! its ordered result to `capture`, which freezes it as a snapshot and moves
//! to `Active`. While active, queries only re-run the cheap text filter over
//! the snapshot. Store mutations never reach the snapshot because it holds
//! the record `Arc`s that were current at capture time.

use std::sync::Arc;

use crate::filter::group_value;
use crate::query::{SearchFields, TextQuery};
use crate::tree::GroupingMode;
use crate::types::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InMemoryMode {
    #[default]
    None,
    Init,
    Active,
}

impl InMemoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Init => "init",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySearch {
    mode: InMemoryMode,
    snapshot: Vec<Arc<Record>>,
}

impl InMemorySearch {
    pub fn mode(&self) -> InMemoryMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == InMemoryMode::Active
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    /// Arms a capture on the next full run. No-op while already armed or active.
    pub fn enter(&mut self) {
        if self.mode == InMemoryMode::None {
            self.mode = InMemoryMode::Init;
            log::debug!("in-memory search armed");
        }
    }

    /// Leaves the mode and drops the snapshot.
    pub fn exit(&mut self) {
        if self.mode != InMemoryMode::None {
            log::debug!(
                "in-memory search left mode={} snapshot={}",
                self.mode.as_str(),
                self.snapshot.len()
            );
        }
        self.mode = InMemoryMode::None;
        self.snapshot = Vec::new();
    }

    /// Captures the first `cap` records of a full run when armed.
    ///
    /// Returns `true` when the mode became active. An empty result leaves the
    /// mode entirely.
    pub fn capture(&mut self, records: &[Arc<Record>], cap: usize) -> bool {
        if self.mode != InMemoryMode::Init {
            return false;
        }
        let kept = records.len().min(cap);
        if kept == 0 {
            log::info!("in-memory search snapshot empty, leaving mode");
            self.exit();
            return false;
        }
        self.snapshot = records[..kept].to_vec();
        self.mode = InMemoryMode::Active;
        log::info!(
            "in-memory search active snapshot={} truncated={}",
            kept,
            records.len() > kept
        );
        true
    }

    pub fn snapshot(&self) -> &[Arc<Record>] {
        &self.snapshot
    }

    /// Applies the refinement phrase to the snapshot, keeping snapshot order.
    pub fn refine(
        &self,
        phrase: &str,
        fields: SearchFields,
        grouping: GroupingMode,
    ) -> Vec<Arc<Record>> {
        let query = TextQuery::parse_refinement(phrase);
        if query.is_all() {
            return self.snapshot.clone();
        }
        self.snapshot
            .iter()
            .filter(|record| {
                let group = if fields.contains(SearchFields::GROUP) {
                    group_value(record, grouping)
                } else {
                    None
                };
                query.matches(record, fields, group.as_deref())
            })
            .cloned()
            .collect()
    }
}
