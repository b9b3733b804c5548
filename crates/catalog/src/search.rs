//! Search over the catalog.
//!
//! This module provides:
//! - The `SearchSession` API used by catalog browsers
//! - The filter/sort pipeline and tree rebuild
//! - The in-memory fast-search mode

mod engine;
mod memory;
mod options;
mod session;


pub use engine::{build_tree, run_pipeline, CatalogView};
pub use memory::{InMemoryMode, InMemorySearch};
pub use options::{SearchOptions, ViewOptions};
pub use session::{SearchOutcome, SearchSession};
