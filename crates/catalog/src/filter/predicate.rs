//! Compiled predicate chain.
//!
//! `RecordFilter::compile` resolves selector indices and parses the phrase
//! once; `apply` then runs the chain over a record slice. Cheap flag checks
//! come first and the text query last. The pass never reorders records.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::query::{RangeFilter, SearchFields, TextQuery, TypeCategory};
use crate::store::Lookups;
use crate::tree::GroupingMode;
use crate::types::{Record, RecordId};
use crate::usage::UsageMap;

use super::duplicates::retain_duplicates;
use super::options::{FilterOptions, MaintenanceFilter};

/// Records that passed the chain, plus the parse error of an invalid expert
/// query (in which case `records` is empty).
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub records: Vec<Arc<Record>>,
    pub query_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecordFilter {
    options: FilterOptions,
    text: TextQuery,
    grouping: GroupingMode,
    type_category: Option<TypeCategory>,
    category: Option<String>,
    publisher: Option<String>,
    package: Option<RecordId>,
    tag: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    length: Option<f64>,
    size: Option<f64>,
    usage: Option<Arc<UsageMap>>,
}

impl RecordFilter {
    /// Compiles `options`. `phrase` is the search phrase after variable
    /// substitution; `usage` is `None` while classification is incomplete.
    pub fn compile(
        options: &FilterOptions,
        phrase: &str,
        grouping: GroupingMode,
        lookups: &Lookups,
        usage: Option<Arc<UsageMap>>,
    ) -> Self {
        Self {
            text: TextQuery::parse(phrase),
            grouping,
            type_category: lookups.type_at(options.type_index),
            category: lookups
                .categories
                .name_at(options.category_index)
                .map(str::to_string),
            publisher: lookups
                .publishers
                .name_at(options.publisher_index)
                .map(str::to_string),
            package: lookups.packages.id_at(options.package_index),
            tag: lookups.tags.name_at(options.tag_index).map(str::to_string),
            width: options.width.threshold(),
            height: options.height.threshold(),
            length: options.length.threshold(),
            size: options.size.size_threshold(),
            usage,
            options: options.clone(),
        }
    }

    pub fn text_query(&self) -> &TextQuery {
        &self.text
    }

    pub fn query_error(&self) -> Option<&str> {
        self.text.error()
    }

    /// Runs the chain over `records`, in parallel when there are at least
    /// `parallel_threshold` of them. Output order follows input order.
    pub fn apply(&self, records: &[Arc<Record>], parallel_threshold: usize) -> FilterOutcome {
        let started = Instant::now();
        if let Some(error) = self.query_error() {
            log::debug!("expert query rejected error={error}");
            return FilterOutcome {
                records: Vec::new(),
                query_error: Some(error.to_string()),
            };
        }

        let parallel = records.len() >= parallel_threshold;
        let mut matched: Vec<Arc<Record>> = if parallel {
            records
                .par_iter()
                .filter(|record| self.matches(record))
                .cloned()
                .collect()
        } else {
            records
                .iter()
                .filter(|record| self.matches(record))
                .cloned()
                .collect()
        };

        if self.options.maintenance == MaintenanceFilter::Duplicates {
            retain_duplicates(&mut matched);
        }

        log::debug!(
            "filter pass candidates={} matched={} parallel={} elapsed_ms={}",
            records.len(),
            matched.len(),
            parallel,
            started.elapsed().as_millis()
        );
        FilterOutcome {
            records: matched,
            query_error: None,
        }
    }

    /// Whether a single record passes every per-record predicate. The
    /// duplicates constraint needs the whole candidate set and is not checked.
    pub fn matches(&self, record: &Record) -> bool {
        let options = &self.options;
        if record.excluded && !options.shows_excluded() {
            return false;
        }
        if !self.maintenance_passes(record)
            || !options.origin.passes(record.source)
            || !options.preview.passes(record.has_preview)
        {
            return false;
        }
        if !options.pipelines.is_empty() && !record.pipelines.intersects(options.pipelines) {
            return false;
        }
        if let Some(package) = self.package {
            if record.id != package && record.parent_id != package {
                return false;
            }
        }
        if let Some(category) = &self.type_category {
            if !category.matches_extension(&record.extension) {
                return false;
            }
        }
        if self
            .category
            .as_deref()
            .is_some_and(|name| !record.category.eq_ignore_ascii_case(name))
        {
            return false;
        }
        if self
            .publisher
            .as_deref()
            .is_some_and(|name| !record.publisher.eq_ignore_ascii_case(name))
        {
            return false;
        }
        if self.tag.as_deref().is_some_and(|name| !record.has_tag(name)) {
            return false;
        }
        if !range_passes(&options.width, self.width, record.width.map(f64::from))
            || !range_passes(&options.height, self.height, record.height.map(f64::from))
            || !range_passes(&options.length, self.length, record.length)
            || !range_passes(&options.size, self.size, Some(record.size as f64))
        {
            return false;
        }
        if !options.color.passes(record.hue) {
            return false;
        }
        let usage = self
            .usage
            .as_ref()
            .and_then(|results| results.get(&record.id).copied());
        if !options.usage.passes(usage) {
            return false;
        }

        if self.text.is_all() {
            return true;
        }
        let group_value = if options.search_fields.contains(SearchFields::GROUP) {
            group_value(record, self.grouping)
        } else {
            None
        };
        self.text
            .matches(record, options.search_fields, group_value.as_deref())
    }

    fn maintenance_passes(&self, record: &Record) -> bool {
        match self.options.maintenance {
            MaintenanceFilter::None | MaintenanceFilter::Duplicates => true,
            MaintenanceFilter::Deprecated => record.deprecated,
            MaintenanceFilter::Abandoned => record.abandoned,
            MaintenanceFilter::Downloaded => record.downloaded,
            MaintenanceFilter::NotDownloaded => !record.downloaded,
            MaintenanceFilter::Excluded => record.excluded,
        }
    }
}

/// An inactive filter passes everything; an active one fails records that
/// lack the value.
fn range_passes(filter: &RangeFilter, threshold: Option<f64>, value: Option<f64>) -> bool {
    match (threshold, value) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(threshold), Some(value)) => filter.passes(threshold, value),
    }
}

/// Text of the grouping field, searched when `SearchFields::GROUP` is set.
pub fn group_value(record: &Record, grouping: GroupingMode) -> Option<String> {
    match grouping {
        GroupingMode::None => None,
        GroupingMode::Category => Some(record.category.clone()),
        GroupingMode::Publisher => Some(record.publisher.clone()),
        GroupingMode::State => Some(record.official_state.clone()),
        GroupingMode::Location => Some(record.location.clone()),
        GroupingMode::Tag => Some(
            record
                .tags
                .iter()
                .map(|tag| tag.name.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::options::{OriginFilter, UsageFilter};
    use crate::store::{RecordStore, TagCatalog};
    use crate::types::SourceKind;

    fn store() -> RecordStore {
        let mut big = Record::new(3, "Big Rock Pack")
            .with_category("Environment")
            .with_publisher("Stone Co")
            .with_size(5 * 1024 * 1024)
            .with_foreign_id(9);
        big.width = Some(2048);
        big.source = SourceKind::Directory;

        let mut hidden = Record::new(4, "Hidden Sword").with_category("Weapons");
        hidden.excluded = true;

        RecordStore::from_records([
            Record::new(1, "Fantasy Sword Pack")
                .with_category("Weapons")
                .with_publisher("Acme")
                .with_tag("Medieval")
                .with_size(1024),
            Record::new(2, "Legacy Sword Set")
                .with_category("Weapons")
                .with_publisher("Acme")
                .with_foreign_id(9),
            big,
            hidden,
            Record::new(5, "Sword Textures").with_parent(1).with_category("Weapons"),
        ])
    }

    fn run(store: &RecordStore, options: &FilterOptions) -> Vec<RecordId> {
        RecordFilter::compile(options, &options.phrase, GroupingMode::None, &lookups(store), None)
            .apply(store.all(), usize::MAX)
            .records
            .iter()
            .map(|record| record.id)
            .collect()
    }

    fn lookups(store: &RecordStore) -> Lookups {
        Lookups::from_store(store, &TagCatalog::from_store(store))
    }

    #[test]
    fn excluded_records_are_skipped_by_default() {
        let store = store();
        assert_eq!(run(&store, &FilterOptions::default()), vec![1, 2, 3, 5]);

        let include = FilterOptions {
            include_excluded: true,
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &include), vec![1, 2, 3, 4, 5]);

        let only = FilterOptions {
            maintenance: MaintenanceFilter::Excluded,
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &only), vec![4]);
    }

    #[test]
    fn text_terms_and_selectors_are_anded() {
        let store = store();
        let lookups = lookups(&store);
        let options = FilterOptions {
            phrase: "+sword -legacy".to_string(),
            publisher_index: lookups.publishers.index_of("acme"),
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &options), vec![1]);
    }

    #[test]
    fn package_selector_includes_direct_children() {
        let store = store();
        let lookups = lookups(&store);
        let options = FilterOptions {
            package_index: lookups.packages.index_of("Fantasy Sword Pack"),
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &options), vec![1, 5]);
    }

    #[test]
    fn range_filters_ignore_malformed_input() {
        let store = store();
        let malformed = FilterOptions {
            width: RangeFilter::new("wide", false),
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &malformed), vec![1, 2, 3, 5]);

        let wide = FilterOptions {
            width: RangeFilter::new("1024", false),
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &wide), vec![3]);

        let small = FilterOptions {
            size: RangeFilter::new("1mb", true),
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &small), vec![1, 2, 5]);
    }

    #[test]
    fn duplicates_and_origin_filters() {
        let store = store();
        let duplicates = FilterOptions {
            maintenance: MaintenanceFilter::Duplicates,
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &duplicates), vec![2, 3]);

        let local = FilterOptions {
            origin: OriginFilter::Local,
            ..FilterOptions::default()
        };
        assert_eq!(run(&store, &local), vec![3]);
    }

    #[test]
    fn usage_filter_uses_published_results() {
        let store = store();
        let lookups = lookups(&store);
        let options = FilterOptions {
            usage: UsageFilter::Used,
            ..FilterOptions::default()
        };
        let mut usage = UsageMap::default();
        usage.insert(1, true);
        usage.insert(2, false);
        let filter =
            RecordFilter::compile(&options, "", GroupingMode::None, &lookups, Some(Arc::new(usage)));
        let ids: Vec<RecordId> = filter
            .apply(store.all(), usize::MAX)
            .records
            .iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn group_field_search_follows_grouping_mode() {
        let store = store();
        let lookups = lookups(&store);
        let options = FilterOptions {
            search_fields: SearchFields::GROUP,
            ..FilterOptions::default()
        };
        let by_category =
            RecordFilter::compile(&options, "environment", GroupingMode::Category, &lookups, None);
        assert_eq!(by_category.apply(store.all(), usize::MAX).records.len(), 1);

        let ungrouped =
            RecordFilter::compile(&options, "environment", GroupingMode::None, &lookups, None);
        assert!(ungrouped.apply(store.all(), usize::MAX).records.is_empty());
    }

    #[test]
    fn parallel_pass_matches_sequential_pass() {
        let store = store();
        let lookups = lookups(&store);
        let filter = RecordFilter::compile(
            &FilterOptions::default(),
            "sword",
            GroupingMode::None,
            &lookups,
            None,
        );
        let sequential = filter.apply(store.all(), usize::MAX).records;
        let parallel = filter.apply(store.all(), 0).records;
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn invalid_expert_query_reports_error() {
        let store = store();
        let lookups = lookups(&store);
        let filter = RecordFilter::compile(
            &FilterOptions::default(),
            "=(sword",
            GroupingMode::None,
            &lookups,
            None,
        );
        let outcome = filter.apply(store.all(), usize::MAX);
        assert!(outcome.records.is_empty());
        assert!(outcome.query_error.is_some());
    }
}
