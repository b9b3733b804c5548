//! Search session: the state a catalog browser keeps between queries.
//!
//! A session holds no catalog data of its own. Each call borrows a
//! `CatalogView`, and the session remembers only what must outlive a call:
//! the last full result (reused while nothing it depends on changed), the
//! in-memory snapshot, the page selection, search variables, and the
//! usage and preview collaborators.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::paging::{paginate, Page, Pagination};
use crate::preview::{PreviewDispatcher, PreviewLoader};
use crate::sort::SortRegistry;
use crate::tree::TreeNode;
use crate::types::{Record, RecordId};
use crate::usage::{UsageClassifier, UsageTracker};
use crate::variables::VariableSet;

use super::engine::{build_tree, run_pipeline, CatalogView};
use super::memory::{InMemoryMode, InMemorySearch};
use super::options::{SearchOptions, ViewOptions};

/// Result of one `SearchSession::search` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Records on the selected page, in result order.
    pub page_items: Vec<Arc<Record>>,
    pub page: usize,
    pub page_count: usize,
    pub result_count: usize,
    /// Parse error of an invalid expert query.
    pub query_error: Option<String>,
    /// Whether the result came from the in-memory snapshot.
    pub in_memory: bool,
}

/// Everything a full pipeline run depends on.
#[derive(Debug, Clone, PartialEq)]
struct RebuildKey {
    store_generation: u64,
    usage_generation: u64,
    options: SearchOptions,
    phrase: String,
}

#[derive(Debug)]
struct CachedRun {
    key: RebuildKey,
    records: Arc<Vec<Arc<Record>>>,
    query_error: Option<String>,
}

#[derive(Debug, Default)]
struct CurrentResult {
    records: Arc<Vec<Arc<Record>>>,
    view: ViewOptions,
    query_error: Option<String>,
    /// Built tree with the store generation and tag fingerprint it reflects.
    tree: Option<((u64, u64), Vec<TreeNode>)>,
}

#[derive(Debug)]
pub struct SearchSession {
    config: EngineConfig,
    registry: SortRegistry,
    memory: InMemorySearch,
    pagination: Pagination,
    variables: VariableSet,
    usage: UsageTracker,
    previews: PreviewDispatcher,
    cached: Option<CachedRun>,
    current: CurrentResult,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SearchSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            pagination: Pagination::new(config.page_size),
            config,
            registry: SortRegistry::new(),
            memory: InMemorySearch::default(),
            variables: VariableSet::new(),
            usage: UsageTracker::new(),
            previews: PreviewDispatcher::default(),
            cached: None,
            current: CurrentResult::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs a query and selects the requested page.
    pub fn search(&mut self, catalog: CatalogView<'_>, options: &SearchOptions) -> SearchOutcome {
        self.variables.reconcile(&options.filter.phrase);
        let phrase = self.variables.substitute(&options.filter.phrase);

        let (records, query_error) = if self.memory.is_active() {
            let refined = self.memory.refine(
                &phrase,
                options.filter.search_fields,
                options.view.grouping,
            );
            (Arc::new(refined), None)
        } else {
            let (records, query_error) = self.full_results(catalog, options, &phrase);
            if self
                .memory
                .capture(&records, self.config.max_in_memory_results)
            {
                (Arc::new(self.memory.snapshot().to_vec()), query_error)
            } else {
                (records, query_error)
            }
        };

        let in_memory = self.memory.is_active();
        let page_size = if in_memory {
            self.config.in_memory_page_size
        } else {
            options.view.page_size.unwrap_or(self.config.page_size)
        };
        let requested = self
            .pagination
            .request(options.view.page, records.len(), page_size);
        let Page {
            items,
            page,
            page_count,
        } = paginate(&records, page_size, requested);

        let visible: Vec<RecordId> = items.iter().map(|record| record.id).collect();
        self.previews.dispatch(&visible);

        let tree = self.current.tree.take().filter(|_| {
            Arc::ptr_eq(&self.current.records, &records)
                && self.current.view.grouping == options.view.grouping
                && self.current.view.show_sub_packages == options.view.show_sub_packages
        });
        let result_count = records.len();
        self.current = CurrentResult {
            records,
            view: options.view.clone(),
            query_error: query_error.clone(),
            tree,
        };

        SearchOutcome {
            page_items: items,
            page,
            page_count,
            result_count,
            query_error,
            in_memory,
        }
    }

    fn full_results(
        &mut self,
        catalog: CatalogView<'_>,
        options: &SearchOptions,
        phrase: &str,
    ) -> (Arc<Vec<Arc<Record>>>, Option<String>) {
        let key = RebuildKey {
            store_generation: catalog.store.generation(),
            usage_generation: self.usage.generation(),
            options: options.without_page(),
            phrase: phrase.to_string(),
        };
        if let Some(cached) = self.cached.as_ref().filter(|cached| cached.key == key) {
            log::debug!("catalog search reused records={}", cached.records.len());
            return (cached.records.clone(), cached.query_error.clone());
        }

        let outcome = run_pipeline(
            catalog,
            options,
            phrase,
            self.usage.results(),
            &self.registry,
            &self.config,
        );
        let records = Arc::new(outcome.records);
        self.cached = Some(CachedRun {
            key,
            records: records.clone(),
            query_error: outcome.query_error.clone(),
        });
        (records, outcome.query_error)
    }

    /// Tree-as-list of the last result, rebuilt only when the result, the
    /// store or the tag catalog changed since the previous call.
    pub fn rebuild_flat_list(&mut self, catalog: CatalogView<'_>) -> Vec<TreeNode> {
        let built_for = (catalog.store.generation(), catalog.tags.fingerprint());
        if let Some((built_at, nodes)) = &self.current.tree {
            if *built_at == built_for {
                return nodes.clone();
            }
        }
        let nodes = build_tree(
            catalog,
            &self.current.records,
            &self.current.view,
            &self.config,
        );
        self.current.tree = Some((built_for, nodes.clone()));
        nodes
    }

    /// Ordered records of the last search.
    pub fn results(&self) -> &[Arc<Record>] {
        &self.current.records
    }

    pub fn query_error(&self) -> Option<&str> {
        self.current.query_error.as_deref()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.page()
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count()
    }

    pub fn result_count(&self) -> usize {
        self.current.records.len()
    }

    pub fn is_in_memory_active(&self) -> bool {
        self.memory.is_active()
    }

    pub fn in_memory_mode(&self) -> InMemoryMode {
        self.memory.mode()
    }

    /// Captures the next full result as an in-memory snapshot.
    pub fn enter_in_memory(&mut self) {
        self.memory.enter();
    }

    pub fn exit_in_memory(&mut self) {
        self.memory.exit();
    }

    /// Drops the cached full result so the next search re-runs the pipeline.
    pub fn invalidate(&mut self) {
        self.cached = None;
        self.current.tree = None;
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.variables.set_value(name, value)
    }

    /// Replaces the variable set, e.g. from a restored saved query.
    pub fn set_variables(&mut self, variables: VariableSet) {
        self.variables = variables;
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Starts classifying the usage of every record in the store. Completion
    /// changes the usage generation, so the next search re-runs the pipeline.
    pub fn start_usage_classification(
        &self,
        catalog: CatalogView<'_>,
        classifier: Arc<dyn UsageClassifier>,
    ) -> JoinHandle<()> {
        self.usage.start(classifier, catalog.store.all().to_vec())
    }

    pub fn set_preview_loader(&mut self, loader: Option<Arc<dyn PreviewLoader>>) {
        self.previews.set_loader(loader);
    }
}
