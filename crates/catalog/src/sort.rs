//! Sorting: the comparator table and version ordering.

mod registry;
mod version;

pub use registry::{compare_ignore_case, Comparator, SortKey, SortRegistry};
pub use version::Version;
