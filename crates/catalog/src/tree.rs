//! Tree-as-list view of a result set.
//!
//! The list interleaves synthetic group headers with record leaves. Depth is a
//! property of the node, never of the shared record.

mod builder;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Record;

pub use builder::TreeBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    #[default]
    None,
    /// Nested by `/`-separated category segments.
    Category,
    Publisher,
    State,
    Location,
    /// One group per catalog tag plus a trailing untagged group.
    Tag,
}

impl GroupingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Category => "category",
            Self::Publisher => "publisher",
            Self::State => "state",
            Self::Location => "location",
            Self::Tag => "tag",
        }
    }
}

/// Why a leaf is in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// Passed the filter.
    Match,
    /// Ancestor of a match, pulled in from the store.
    Anchor,
    /// Sub-package re-inserted beneath a visible parent.
    Child,
    /// Dependency of a feature bundle.
    Feature,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Group {
        label: String,
        depth: usize,
    },
    Leaf {
        record: Arc<Record>,
        depth: usize,
        kind: LeafKind,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            Self::Group { depth, .. } | Self::Leaf { depth, .. } => *depth,
        }
    }

    pub fn record(&self) -> Option<&Arc<Record>> {
        match self {
            Self::Leaf { record, .. } => Some(record),
            Self::Group { .. } => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// Header label or record display name.
    pub fn label(&self) -> &str {
        match self {
            Self::Group { label, .. } => label,
            Self::Leaf { record, .. } => &record.display_name,
        }
    }

    fn shifted(&self, offset: usize) -> Self {
        let mut node = self.clone();
        match &mut node {
            Self::Group { depth, .. } | Self::Leaf { depth, .. } => *depth += offset,
        }
        node
    }
}
