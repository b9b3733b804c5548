//! Arena-style record store keyed by record id.
//!
//! Parent, child, and root relations are id lookups into the arena rather
//! than object references, so nothing stale survives a rebuild. Every
//! mutation bumps `generation`, which sessions compare against to decide
//! whether a cached rebuild is still valid.

mod lookups;
mod tags;

use std::sync::Arc;

use fnv::FnvHashMap;

use crate::error::{CatalogError, Result};
use crate::types::{Record, RecordId};

pub use lookups::{Lookup, Lookups, PackageLookup, ANY_LABEL};
pub use tags::{TagCatalog, TagInfo};

#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<Arc<Record>>,
    positions: FnvHashMap<RecordId, usize>,
    /// Lowercased safe name to record id.
    safe_names: FnvHashMap<String, RecordId>,
    generation: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records. A later record replaces an earlier one with the same id.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Monotonic mutation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All records in insertion order.
    pub fn all(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&Arc<Record>> {
        self.positions.get(&id).map(|&index| &self.records[index])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Finds a record by its safe name (case-insensitive).
    pub fn find_by_safe_name(&self, safe_name: &str) -> Option<&Arc<Record>> {
        let id = self.safe_names.get(&safe_name.to_lowercase())?;
        self.get(*id)
    }

    /// Inserts a record or replaces the record with the same id in place.
    ///
    /// Replacement swaps the `Arc`, so result sets holding the previous
    /// version keep seeing it unchanged.
    pub fn upsert(&mut self, record: Record) {
        let id = record.id;
        if !record.safe_name.is_empty() {
            self.safe_names.insert(record.safe_name.to_lowercase(), id);
        }
        let record = Arc::new(record);
        match self.positions.get(&id) {
            Some(&index) => {
                let previous = std::mem::replace(&mut self.records[index], record);
                if !previous.safe_name.is_empty()
                    && !previous
                        .safe_name
                        .eq_ignore_ascii_case(&self.records[index].safe_name)
                {
                    self.safe_names.remove(&previous.safe_name.to_lowercase());
                }
            }
            None => {
                self.positions.insert(id, self.records.len());
                self.records.push(record);
            }
        }
        self.generation += 1;
    }

    /// Removes a record. Children keep their `parent_id` and become orphans.
    pub fn remove(&mut self, id: RecordId) -> Option<Arc<Record>> {
        let index = self.positions.remove(&id)?;
        let removed = self.records.remove(index);
        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        if !removed.safe_name.is_empty() {
            self.safe_names.remove(&removed.safe_name.to_lowercase());
        }
        self.generation += 1;
        Some(removed)
    }

    /// Applies an in-place edit to one record.
    pub fn update<F>(&mut self, id: RecordId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Record),
    {
        let record = self.get(id).ok_or(CatalogError::NotFound(id))?;
        let mut updated = Record::clone(record);
        edit(&mut updated);
        updated.id = id;
        self.upsert(updated);
        Ok(())
    }

    /// Number of resolvable ancestors of a record (0 for top-level records).
    ///
    /// A parent id that does not resolve still counts as one level. Walks
    /// stop after `len()` hops so a cyclic chain cannot loop forever.
    pub fn depth_of(&self, id: RecordId) -> Option<usize> {
        let mut current = self.get(id)?;
        let mut depth = 0;
        while !current.is_top_level() {
            depth += 1;
            if depth > self.records.len() {
                break;
            }
            match self.get(current.parent_id) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Some(depth)
    }

    /// Largest depth of any child record, or `None` for an empty store.
    pub fn max_child_depth(&self) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        self.records
            .iter()
            .filter_map(|record| self.depth_of(record.id))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> RecordStore {
        RecordStore::from_records([
            Record::new(1, "Package"),
            Record::new(2, "Sub A").with_parent(1),
            Record::new(3, "Sub B").with_parent(1),
            Record::new(4, "Nested").with_parent(3),
        ])
    }

    #[test]
    fn lookup_by_id() {
        let store = sample_store();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(3).map(|r| r.display_name.as_str()), Some("Sub B"));
        assert!(store.get(99).is_none());
    }

    #[test]
    fn depth_follows_parent_chain() {
        let store = sample_store();
        assert_eq!(store.depth_of(1), Some(0));
        assert_eq!(store.depth_of(2), Some(1));
        assert_eq!(store.depth_of(4), Some(2));
        assert_eq!(store.max_child_depth(), Some(2));
    }

    #[test]
    fn empty_store_has_no_max_depth() {
        assert_eq!(RecordStore::new().max_child_depth(), None);
    }

    #[test]
    fn cyclic_chain_terminates() {
        let store = RecordStore::from_records([
            Record::new(1, "A").with_parent(2),
            Record::new(2, "B").with_parent(1),
        ]);
        assert!(store.depth_of(1).is_some());
        assert!(store.max_child_depth().is_some());
    }

    #[test]
    fn upsert_replaces_and_bumps_generation() {
        let mut store = sample_store();
        let before = store.generation();
        let old = store.get(2).cloned().expect("record");
        store.upsert(Record::new(2, "Renamed").with_parent(1));
        assert_eq!(store.len(), 4);
        assert!(store.generation() > before);
        assert_eq!(old.display_name, "Sub A");
        assert_eq!(store.get(2).map(|r| r.display_name.as_str()), Some("Renamed"));
    }

    #[test]
    fn remove_reindexes_positions() {
        let mut store = sample_store();
        assert!(store.remove(2).is_some());
        assert_eq!(store.get(4).map(|r| r.id), Some(4));
        assert!(store.get(2).is_none());
        assert_eq!(store.max_child_depth(), Some(2));
    }

    #[test]
    fn update_missing_record_fails() {
        let mut store = sample_store();
        let error = store.update(42, |record| record.excluded = true).unwrap_err();
        assert!(matches!(error, CatalogError::NotFound(42)));
    }

    #[test]
    fn safe_name_lookup_is_case_insensitive() {
        let mut record = Record::new(7, "Bundle Part");
        record.safe_name = "Vendor.BundlePart".to_string();
        let store = RecordStore::from_records([record]);
        assert_eq!(
            store.find_by_safe_name("vendor.bundlepart").map(|r| r.id),
            Some(7)
        );
    }
}
