//! Engine configuration.
//!
//! The engine reads no global settings; callers construct an `EngineConfig`
//! (usually from a JSON file next to their other preferences) and hand it to
//! the `SearchSession`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_IN_MEMORY_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_IN_MEMORY_RESULTS: usize = 10_000;
pub const DEFAULT_PARALLEL_FILTER_THRESHOLD: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when a query does not request one.
    pub page_size: usize,
    /// Page size while the in-memory fast-search mode is active.
    pub in_memory_page_size: usize,
    /// Upper bound on the number of records captured into an in-memory snapshot.
    pub max_in_memory_results: usize,
    /// Record count above which the predicate chain runs on the rayon pool.
    pub parallel_filter_threshold: usize,
    /// Whether free-text terms also match record descriptions by default.
    pub search_descriptions: bool,
    /// Whether free-text terms also match the active grouping field by default.
    pub search_group_names: bool,
    /// Header label for records whose grouping key is empty.
    pub ungrouped_label: String,
    /// Header label for the trailing group of untagged records.
    pub untagged_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            in_memory_page_size: DEFAULT_IN_MEMORY_PAGE_SIZE,
            max_in_memory_results: DEFAULT_MAX_IN_MEMORY_RESULTS,
            parallel_filter_threshold: DEFAULT_PARALLEL_FILTER_THRESHOLD,
            search_descriptions: false,
            search_group_names: false,
            ungrouped_label: "-none-".to_string(),
            untagged_label: "-untagged-".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing keys fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, returning defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json_str(&raw),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "catalog config {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CatalogError::InvalidInput(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.in_memory_page_size == 0 {
            return Err(CatalogError::InvalidInput(
                "in_memory_page_size must be at least 1".to_string(),
            ));
        }
        if self.max_in_memory_results == 0 {
            return Err(CatalogError::InvalidInput(
                "max_in_memory_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "page_size": 25 }"#).expect("parse");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.in_memory_page_size, DEFAULT_IN_MEMORY_PAGE_SIZE);
        assert_eq!(config.untagged_label, "-untagged-");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let error = EngineConfig::from_json_str(r#"{ "page_size": 0 }"#).unwrap_err();
        assert!(matches!(error, CatalogError::InvalidInput(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_reads_written_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        let config = EngineConfig {
            max_in_memory_results: 500,
            ..EngineConfig::default()
        };
        fs::write(&path, config.to_json_string().expect("encode")).expect("write");
        assert_eq!(EngineConfig::load(&path).expect("load"), config);
    }
}
