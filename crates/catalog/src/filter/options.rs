//! Per-invocation filter panel state.

use serde::{Deserialize, Serialize};

use crate::query::{RangeFilter, SearchFields};
use crate::types::{RenderPipelines, SourceKind};

/// Dominant-hue filter. Hue and tolerance are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorFilter {
    pub enabled: bool,
    pub hue: f32,
    pub tolerance: f32,
}

impl ColorFilter {
    pub fn new(hue: f32, tolerance: f32) -> Self {
        Self {
            enabled: true,
            hue,
            tolerance,
        }
    }

    /// Whether a record hue lies within the tolerance, measured around the wheel.
    /// Records without a hue fail an enabled filter.
    pub fn passes(&self, hue: Option<f32>) -> bool {
        if !self.enabled {
            return true;
        }
        let Some(hue) = hue else {
            return false;
        };
        let distance = (hue - self.hue).abs().rem_euclid(360.0);
        distance.min(360.0 - distance) <= self.tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginFilter {
    #[default]
    Any,
    Store,
    Custom,
    Registry,
    /// Directories and archives on disk.
    Local,
    Collection,
}

impl OriginFilter {
    pub fn passes(self, source: SourceKind) -> bool {
        match self {
            Self::Any => true,
            Self::Store => source == SourceKind::StorePackage,
            Self::Custom => source == SourceKind::CustomPackage,
            Self::Registry => source == SourceKind::RegistryPackage,
            Self::Local => matches!(source, SourceKind::Directory | SourceKind::Archive),
            Self::Collection => source == SourceKind::ManagedCollection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewFilter {
    #[default]
    Any,
    WithPreview,
    WithoutPreview,
}

impl PreviewFilter {
    pub fn passes(self, has_preview: bool) -> bool {
        match self {
            Self::Any => true,
            Self::WithPreview => has_preview,
            Self::WithoutPreview => !has_preview,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceFilter {
    #[default]
    None,
    /// Records sharing a positive foreign id with another candidate.
    Duplicates,
    Deprecated,
    Abandoned,
    Downloaded,
    NotDownloaded,
    /// Only excluded records.
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageFilter {
    #[default]
    Any,
    Used,
    Unused,
}

impl UsageFilter {
    /// `usage` is `None` while classification has not produced a result for
    /// the record; unknown usage always passes.
    pub fn passes(self, usage: Option<bool>) -> bool {
        match (self, usage) {
            (Self::Any, _) | (_, None) => true,
            (Self::Used, Some(used)) => used,
            (Self::Unused, Some(used)) => !used,
        }
    }
}

/// Everything the filter panel and search box contribute to one query.
///
/// Selector fields index into the matching `Lookups` array; 0 never restricts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOptions {
    /// Search-box phrase before variable substitution.
    pub phrase: String,
    pub search_fields: SearchFields,
    pub type_index: usize,
    pub category_index: usize,
    pub publisher_index: usize,
    pub package_index: usize,
    pub tag_index: usize,
    pub width: RangeFilter,
    pub height: RangeFilter,
    pub length: RangeFilter,
    pub size: RangeFilter,
    pub color: ColorFilter,
    /// Empty means any pipeline.
    pub pipelines: RenderPipelines,
    pub origin: OriginFilter,
    pub preview: PreviewFilter,
    pub maintenance: MaintenanceFilter,
    pub usage: UsageFilter,
    pub include_excluded: bool,
}

impl FilterOptions {
    pub fn with_phrase(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            ..Self::default()
        }
    }

    /// Whether excluded records take part in the query at all.
    pub fn shows_excluded(&self) -> bool {
        self.include_excluded || self.maintenance == MaintenanceFilter::Excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_distance_wraps_around_the_wheel() {
        let red = ColorFilter::new(355.0, 10.0);
        assert!(red.passes(Some(3.0)));
        assert!(red.passes(Some(350.0)));
        assert!(!red.passes(Some(30.0)));
        assert!(!red.passes(None));
        assert!(ColorFilter::default().passes(None));
    }

    #[test]
    fn local_origin_covers_directories_and_archives() {
        assert!(OriginFilter::Local.passes(SourceKind::Directory));
        assert!(OriginFilter::Local.passes(SourceKind::Archive));
        assert!(!OriginFilter::Local.passes(SourceKind::StorePackage));
        assert!(OriginFilter::Any.passes(SourceKind::Other));
    }

    #[test]
    fn unknown_usage_passes() {
        assert!(UsageFilter::Used.passes(None));
        assert!(UsageFilter::Unused.passes(None));
        assert!(!UsageFilter::Used.passes(Some(false)));
        assert!(UsageFilter::Unused.passes(Some(false)));
    }

    #[test]
    fn excluded_maintenance_mode_shows_excluded() {
        let options = FilterOptions {
            maintenance: MaintenanceFilter::Excluded,
            ..FilterOptions::default()
        };
        assert!(options.shows_excluded());
        assert!(!FilterOptions::default().shows_excluded());
    }
}
