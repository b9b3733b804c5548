//! Core record types for the package catalog.
//!
//! A `Record` is one package, sub-package, or asset file entry. Records are
//! shared as `Arc<Record>` between the store, result sets, and in-memory
//! snapshots, so presentation data such as tree depth never lives here.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Integer id of a record. Real records always have a positive id.
pub type RecordId = i64;

/// Where a record originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    StorePackage,
    CustomPackage,
    RegistryPackage,
    Directory,
    Archive,
    ManagedCollection,
    Other,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StorePackage => "store",
            Self::CustomPackage => "custom",
            Self::RegistryPackage => "registry",
            Self::Directory => "directory",
            Self::Archive => "archive",
            Self::ManagedCollection => "collection",
            Self::Other => "other",
        }
    }

    /// Looks up a source kind by its short name or a common alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "store" | "assetstore" | "storepackage" => Some(Self::StorePackage),
            "custom" | "custompackage" => Some(Self::CustomPackage),
            "registry" | "registrypackage" | "upm" => Some(Self::RegistryPackage),
            "directory" | "dir" | "folder" => Some(Self::Directory),
            "archive" | "zip" => Some(Self::Archive),
            "collection" | "managedcollection" => Some(Self::ManagedCollection),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

bitflags! {
    /// Render pipelines a package declares compatibility with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderPipelines: u8 {
        const BUILT_IN = 0b001;
        const URP = 0b010;
        const HDRP = 0b100;
    }
}

/// A tag attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub color: String,
}

impl TagRef {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// A package, sub-package, or asset file entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: RecordId,
    /// 0 for top-level records, otherwise the id of the parent package.
    pub parent_id: RecordId,
    /// External catalog id, used to detect duplicates when positive.
    pub foreign_id: i64,
    pub display_name: String,
    pub description: String,
    pub safe_name: String,
    pub category: String,
    pub publisher: String,
    pub location: String,
    pub official_state: String,
    pub version: String,
    /// Lowercase file extension for asset files, empty for packages.
    pub extension: String,
    pub source: SourceKind,
    pub tags: Vec<TagRef>,
    pub excluded: bool,
    pub deprecated: bool,
    pub abandoned: bool,
    pub downloaded: bool,
    pub has_preview: bool,
    pub file_count: u64,
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Length in seconds for audio and video assets.
    pub length: Option<f64>,
    /// Dominant hue in degrees.
    pub hue: Option<f32>,
    pub pipelines: RenderPipelines,
    pub rating: f32,
    pub rating_count: u32,
    /// Unix timestamp (seconds) of the last catalog update.
    pub updated_at: Option<i64>,
    /// Aggregate bundle whose contents are other packages.
    pub feature: bool,
    /// Safe names of bundled packages; `None` until metadata has been loaded.
    pub dependencies: Option<Vec<String>>,
    /// Dynamic metadata columns.
    pub metadata: BTreeMap<String, String>,
}

impl Record {
    pub fn new(id: RecordId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: RecordId) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_foreign_id(mut self, foreign_id: i64) -> Self {
        self.foreign_id = foreign_id;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        self.tags.push(TagRef::new(name, ""));
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id <= 0
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    /// Returns a metadata column value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
