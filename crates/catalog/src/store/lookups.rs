//! Selector arrays for the filter panel.
//!
//! Each array starts with the `-all-` sentinel at index 0, so a selector value
//! of 0 never restricts anything. Saved queries store names rather than
//! indices and translate them back through `index_of`.

use crate::query::TypeCategory;
use crate::sort::compare_ignore_case;
use crate::types::RecordId;

use super::{RecordStore, TagCatalog};

pub const ANY_LABEL: &str = "-all-";

/// An ordered list of names behind a numeric selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    names: Vec<String>,
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            names: vec![ANY_LABEL.to_string()],
        }
    }
}

impl Lookup {
    /// Builds a lookup from names in the given order, skipping blanks and
    /// case-insensitive duplicates.
    pub fn from_ordered<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lookup = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || lookup.position(name).is_some() {
                continue;
            }
            lookup.names.push(name.to_string());
        }
        lookup
    }

    /// Builds a lookup sorted case-insensitively.
    pub fn from_unsorted<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collected: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        collected.sort_by(|a, b| compare_ignore_case(a, b).then_with(|| a.cmp(b)));
        collected.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        Self::from_ordered(collected)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name at a selector index. `None` for the sentinel and out-of-range indices.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.names.get(index).map(String::as_str)
    }

    /// Selector index of a name (case-insensitive), 0 when absent.
    pub fn index_of(&self, name: &str) -> usize {
        self.position(name).unwrap_or(0)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .skip(1)
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|offset| offset + 1)
    }
}

/// Package selector entries: top-level records by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageLookup {
    entries: Vec<(RecordId, String)>,
}

impl PackageLookup {
    pub fn from_store(store: &RecordStore) -> Self {
        let mut entries: Vec<(RecordId, String)> = store
            .all()
            .iter()
            .filter(|record| record.is_top_level() && !record.display_name.trim().is_empty())
            .map(|record| (record.id, record.display_name.clone()))
            .collect();
        entries.sort_by(|a, b| compare_ignore_case(&a.1, &b.1).then(a.0.cmp(&b.0)));
        Self { entries }
    }

    /// Number of selector entries including the sentinel.
    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record id at a selector index.
    pub fn id_at(&self, index: usize) -> Option<RecordId> {
        index
            .checked_sub(1)
            .and_then(|offset| self.entries.get(offset))
            .map(|entry| entry.0)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|offset| self.entries.get(offset))
            .map(|entry| entry.1.as_str())
    }

    /// Selector index of the first package with this name, 0 when absent.
    pub fn index_of(&self, name: &str) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.1.eq_ignore_ascii_case(name))
            .map_or(0, |offset| offset + 1)
    }
}

/// All selector arrays of the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookups {
    pub types: Lookup,
    pub categories: Lookup,
    pub publishers: Lookup,
    pub tags: Lookup,
    pub packages: PackageLookup,
}

impl Lookups {
    pub fn from_store(store: &RecordStore, tags: &TagCatalog) -> Self {
        let records = store.all();
        Self {
            types: Lookup::from_ordered(TypeCategory::ALL.iter().map(|category| category.as_str())),
            categories: Lookup::from_unsorted(records.iter().map(|r| r.category.as_str())),
            publishers: Lookup::from_unsorted(records.iter().map(|r| r.publisher.as_str())),
            tags: Lookup::from_ordered(tags.tags().iter().map(|tag| tag.name.as_str())),
            packages: PackageLookup::from_store(store),
        }
    }

    /// Type category at a selector index.
    pub fn type_at(&self, index: usize) -> Option<TypeCategory> {
        let name = self.types.name_at(index)?;
        TypeCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    #[test]
    fn sentinel_occupies_index_zero() {
        let lookup = Lookup::from_unsorted(["Props", "characters", "", "props"]);
        assert_eq!(lookup.names(), &["-all-", "characters", "Props"]);
        assert_eq!(lookup.name_at(0), None);
        assert_eq!(lookup.name_at(2), Some("Props"));
        assert_eq!(lookup.name_at(9), None);
        assert_eq!(lookup.index_of("PROPS"), 2);
        assert_eq!(lookup.index_of("missing"), 0);
    }

    #[test]
    fn lookups_from_store() {
        let store = RecordStore::from_records([
            Record::new(1, "Rocks").with_category("Environment").with_publisher("Acme"),
            Record::new(2, "Rock Part").with_parent(1).with_category("Environment"),
            Record::new(3, "Heroes").with_category("Characters").with_tag("People"),
        ]);
        let tags = TagCatalog::from_store(&store);
        let lookups = Lookups::from_store(&store, &tags);

        assert_eq!(lookups.categories.len(), 3);
        assert_eq!(lookups.publishers.names(), &["-all-", "Acme"]);
        assert_eq!(lookups.tags.index_of("people"), 1);
        assert_eq!(lookups.packages.len(), 3);
        assert_eq!(lookups.packages.id_at(1), Some(3));
        assert_eq!(lookups.packages.index_of("rocks"), 2);
        assert_eq!(lookups.type_at(1), Some(TypeCategory::Audio));
        assert_eq!(lookups.type_at(0), None);
    }
}
