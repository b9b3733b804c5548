//! Saved queries.
//!
//! Selector positions shift whenever the catalog changes, so a saved query
//! stores the selected names and maps them back to indices on restore.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::filter::{
    ColorFilter, FilterOptions, MaintenanceFilter, OriginFilter, PreviewFilter, UsageFilter,
};
use crate::query::{RangeFilter, SearchFields};
use crate::search::{SearchOptions, ViewOptions};
use crate::sort::SortKey;
use crate::store::{Lookup, Lookups};
use crate::tree::GroupingMode;
use crate::types::RenderPipelines;
use crate::variables::VariableSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedQuery {
    pub phrase: String,
    pub search_descriptions: bool,
    pub search_group: bool,
    pub type_name: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub package: Option<String>,
    pub tag: Option<String>,
    pub width: RangeFilter,
    pub height: RangeFilter,
    pub length: RangeFilter,
    pub size: RangeFilter,
    pub color: ColorFilter,
    /// `RenderPipelines` bits.
    pub pipelines: u8,
    pub origin: OriginFilter,
    pub preview: PreviewFilter,
    pub maintenance: MaintenanceFilter,
    pub usage: UsageFilter,
    pub include_excluded: bool,
    pub sort_key: SortKey,
    pub descending: bool,
    pub grouping: GroupingMode,
    pub show_sub_packages: bool,
    pub variables: VariableSet,
}

impl Default for SavedQuery {
    fn default() -> Self {
        Self::capture(&SearchOptions::default(), &Lookups::default(), &VariableSet::default())
    }
}

impl SavedQuery {
    /// Captures the current options, resolving selector indices to names.
    pub fn capture(options: &SearchOptions, lookups: &Lookups, variables: &VariableSet) -> Self {
        let filter = &options.filter;
        let view = &options.view;
        Self {
            phrase: filter.phrase.clone(),
            search_descriptions: filter.search_fields.contains(SearchFields::DESCRIPTION),
            search_group: filter.search_fields.contains(SearchFields::GROUP),
            type_name: lookups.types.name_at(filter.type_index).map(str::to_string),
            category: lookups
                .categories
                .name_at(filter.category_index)
                .map(str::to_string),
            publisher: lookups
                .publishers
                .name_at(filter.publisher_index)
                .map(str::to_string),
            package: lookups
                .packages
                .name_at(filter.package_index)
                .map(str::to_string),
            tag: lookups.tags.name_at(filter.tag_index).map(str::to_string),
            width: filter.width.clone(),
            height: filter.height.clone(),
            length: filter.length.clone(),
            size: filter.size.clone(),
            color: filter.color,
            pipelines: filter.pipelines.bits(),
            origin: filter.origin,
            preview: filter.preview,
            maintenance: filter.maintenance,
            usage: filter.usage,
            include_excluded: filter.include_excluded,
            sort_key: view.sort_key.clone(),
            descending: view.descending,
            grouping: view.grouping,
            show_sub_packages: view.show_sub_packages,
            variables: variables.clone(),
        }
    }

    /// Rebuilds options against the current lookups. Names that no longer
    /// exist fall back to the `-all-` selector.
    pub fn restore(&self, lookups: &Lookups) -> (SearchOptions, VariableSet) {
        let mut search_fields = SearchFields::empty();
        search_fields.set(SearchFields::DESCRIPTION, self.search_descriptions);
        search_fields.set(SearchFields::GROUP, self.search_group);

        let package_index = match self.package.as_deref() {
            Some(name) => {
                let index = lookups.packages.index_of(name);
                if index == 0 {
                    log::warn!("saved query package not found name={name}");
                }
                index
            }
            None => 0,
        };

        let filter = FilterOptions {
            phrase: self.phrase.clone(),
            search_fields,
            type_index: restore_index(&lookups.types, self.type_name.as_deref(), "type"),
            category_index: restore_index(&lookups.categories, self.category.as_deref(), "category"),
            publisher_index: restore_index(
                &lookups.publishers,
                self.publisher.as_deref(),
                "publisher",
            ),
            package_index,
            tag_index: restore_index(&lookups.tags, self.tag.as_deref(), "tag"),
            width: self.width.clone(),
            height: self.height.clone(),
            length: self.length.clone(),
            size: self.size.clone(),
            color: self.color,
            pipelines: RenderPipelines::from_bits_truncate(self.pipelines),
            origin: self.origin,
            preview: self.preview,
            maintenance: self.maintenance,
            usage: self.usage,
            include_excluded: self.include_excluded,
        };
        let view = ViewOptions {
            sort_key: self.sort_key.clone(),
            descending: self.descending,
            grouping: self.grouping,
            show_sub_packages: self.show_sub_packages,
            ..ViewOptions::default()
        };
        (SearchOptions { filter, view }, self.variables.clone())
    }
}

fn restore_index(lookup: &Lookup, name: Option<&str>, selector: &str) -> usize {
    let Some(name) = name else {
        return 0;
    };
    let index = lookup.index_of(name);
    if index == 0 {
        log::warn!("saved query {selector} not found name={name}");
    }
    index
}

/// Named saved queries persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct SavedQueryStore {
    path: PathBuf,
    queries: BTreeMap<String, SavedQuery>,
}

impl SavedQueryStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let queries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self { path, queries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&SavedQuery> {
        self.queries.get(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Adds or replaces a saved query. Call `save` to persist.
    pub fn insert(&mut self, name: impl Into<String>, query: SavedQuery) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "saved query name must not be empty".to_string(),
            ));
        }
        self.queries.insert(name, query);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<SavedQuery> {
        self.queries.remove(name)
    }

    /// Writes all queries to disk through a temp file and rename.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| {
                    CatalogError::Internal(format!(
                        "failed to create saved query directory {}: {error}",
                        parent.display()
                    ))
                })?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let output = File::create(&tmp_path).map_err(|error| {
                CatalogError::Internal(format!(
                    "failed to create saved query file {}: {error}",
                    tmp_path.display()
                ))
            })?;
            let mut output = BufWriter::new(output);
            serde_json::to_writer_pretty(&mut output, &self.queries)?;
            output.flush()?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|error| {
            CatalogError::Internal(format!(
                "failed to finalize saved query file {}: {error}",
                self.path.display()
            ))
        })?;

        log::debug!(
            "wrote saved queries to {} ({} queries)",
            self.path.display(),
            self.queries.len()
        );
        Ok(())
    }
}
