//! The full query pipeline: filter, then sort, then (on demand) the tree view.

use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::filter::{FilterOutcome, RecordFilter};
use crate::sort::SortRegistry;
use crate::store::{Lookups, RecordStore, TagCatalog};
use crate::tree::{TreeBuilder, TreeNode};
use crate::types::Record;
use crate::usage::UsageMap;

use super::options::{SearchOptions, ViewOptions};

/// Borrowed catalog data a search runs against.
#[derive(Debug, Clone, Copy)]
pub struct CatalogView<'a> {
    pub store: &'a RecordStore,
    pub tags: &'a TagCatalog,
    pub lookups: &'a Lookups,
}

impl<'a> CatalogView<'a> {
    pub fn new(store: &'a RecordStore, tags: &'a TagCatalog, lookups: &'a Lookups) -> Self {
        Self {
            store,
            tags,
            lookups,
        }
    }
}

/// Filters and sorts the whole store.
///
/// `phrase` is the search phrase after variable substitution. `usage` is
/// `None` while classification is incomplete.
pub fn run_pipeline(
    catalog: CatalogView<'_>,
    options: &SearchOptions,
    phrase: &str,
    usage: Option<Arc<UsageMap>>,
    registry: &SortRegistry,
    config: &EngineConfig,
) -> FilterOutcome {
    let started = Instant::now();
    let filter = RecordFilter::compile(
        &options.filter,
        phrase,
        options.view.grouping,
        catalog.lookups,
        usage,
    );
    let mut outcome = filter.apply(catalog.store.all(), config.parallel_filter_threshold);
    let filter_ms = started.elapsed().as_millis();

    registry.sort(
        &mut outcome.records,
        &options.view.sort_key,
        options.view.descending,
    );

    log::info!(
        "catalog search records={} matched={} sort={} descending={} filter_ms={} total_ms={}",
        catalog.store.len(),
        outcome.records.len(),
        options.view.sort_key.as_str(),
        options.view.descending,
        filter_ms,
        started.elapsed().as_millis()
    );
    outcome
}

/// Builds the tree-as-list for an ordered result.
pub fn build_tree(
    catalog: CatalogView<'_>,
    records: &[Arc<Record>],
    view: &ViewOptions,
    config: &EngineConfig,
) -> Vec<TreeNode> {
    let started = Instant::now();
    let nodes = TreeBuilder::new(catalog.store, catalog.tags)
        .grouping(view.grouping)
        .show_sub_packages(view.show_sub_packages)
        .labels(&config.ungrouped_label, &config.untagged_label)
        .build(records);
    log::debug!(
        "tree rebuilt records={} nodes={} grouping={} elapsed_ms={}",
        records.len(),
        nodes.len(),
        view.grouping.as_str(),
        started.elapsed().as_millis()
    );
    nodes
}
