//! Tag catalog: the ordered list of known tags.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

use serde::{Deserialize, Serialize};

use super::RecordStore;
use crate::types::Record;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub color: String,
}

/// Tags in display order. Grouping by tag walks this order.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<TagInfo>,
}

impl TagCatalog {
    pub fn new(tags: Vec<TagInfo>) -> Self {
        Self { tags }
    }

    /// Collects every tag used in the store, ordered by name.
    pub fn from_store(store: &RecordStore) -> Self {
        let mut seen: BTreeMap<String, TagInfo> = BTreeMap::new();
        for record in store.all() {
            for tag in &record.tags {
                seen.entry(tag.name.to_lowercase())
                    .or_insert_with(|| TagInfo {
                        name: tag.name.clone(),
                        color: tag.color.clone(),
                    });
            }
        }
        Self {
            tags: seen.into_values().collect(),
        }
    }

    pub fn tags(&self) -> &[TagInfo] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TagInfo> {
        self.tags
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    /// Hash of the tags in display order.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.tags.hash(&mut hasher);
        hasher.finish()
    }

    /// Whether `record` carries the tag `name`.
    pub fn is_member(&self, record: &Record, name: &str) -> bool {
        record.has_tag(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_store_deduplicates_case_insensitively() {
        let store = RecordStore::from_records([
            Record::new(1, "A").with_tag("Nature").with_tag("props"),
            Record::new(2, "B").with_tag("nature"),
        ]);
        let catalog = TagCatalog::from_store(&store);
        let names: Vec<_> = catalog.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Nature", "props"]);
        assert!(catalog.get("PROPS").is_some());
    }

    #[test]
    fn fingerprint_follows_tag_order() {
        let tag = |name: &str| TagInfo {
            name: name.to_string(),
            color: String::new(),
        };
        let forward = TagCatalog::new(vec![tag("a"), tag("b")]);
        let same = TagCatalog::new(vec![tag("a"), tag("b")]);
        let reversed = TagCatalog::new(vec![tag("b"), tag("a")]);
        assert_eq!(forward.fingerprint(), same.fingerprint());
        assert_ne!(forward.fingerprint(), reversed.fingerprint());
    }
}
