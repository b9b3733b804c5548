//! Package catalog query engine.
//!
//! This crate provides the search core of a package catalog browser:
//! - An id-keyed record store with tag catalog and selector lookups
//! - Filter predicates, the search-box phrase language and expert queries
//! - Sorting, grouping into a tree-as-list view, and pagination
//! - A search session with in-memory fast search, search variables and
//!   saved queries
//! - Background usage classification and preview dispatch hooks

pub mod cancel;
pub mod config;
pub mod error;
pub mod filter;
pub mod paging;
pub mod preview;
pub mod query;
pub mod saved;
pub mod search;
pub mod sort;
pub mod store;
pub mod tree;
pub mod types;
pub mod usage;
pub mod variables;

// Re-export main types
pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use error::{CatalogError, Result};
pub use filter::{FilterOptions, RecordFilter};
pub use paging::{paginate, Page, Pagination};
pub use preview::{PreviewDispatcher, PreviewLoader};
pub use query::{QueryExpression, QueryParser, RecordQueryMatcher, TextQuery};
pub use saved::{SavedQuery, SavedQueryStore};
pub use search::{CatalogView, InMemoryMode, SearchOptions, SearchOutcome, SearchSession, ViewOptions};
pub use sort::{SortKey, SortRegistry};
pub use store::{Lookups, RecordStore, TagCatalog, TagInfo};
pub use tree::{GroupingMode, LeafKind, TreeBuilder, TreeNode};
pub use types::{Record, RecordId, RenderPipelines, SourceKind, TagRef};
pub use usage::{UsageClassifier, UsageState, UsageTracker};
pub use variables::{SearchVariable, VariableSet};
