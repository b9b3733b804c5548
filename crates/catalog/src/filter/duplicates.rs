use std::sync::Arc;

use fnv::FnvHashMap;

use crate::types::Record;

/// Keeps records whose positive foreign id is shared with another record in
/// `records`. Order is preserved.
pub fn retain_duplicates(records: &mut Vec<Arc<Record>>) {
    let mut counts: FnvHashMap<i64, usize> = FnvHashMap::default();
    for record in records.iter().filter(|record| record.foreign_id > 0) {
        *counts.entry(record.foreign_id).or_default() += 1;
    }
    records.retain(|record| {
        record.foreign_id > 0 && counts.get(&record.foreign_id).is_some_and(|count| *count > 1)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[Arc<Record>]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    #[test]
    fn keeps_groups_with_more_than_one_member() {
        let mut records = vec![
            Arc::new(Record::new(1, "a").with_foreign_id(5)),
            Arc::new(Record::new(2, "b").with_foreign_id(5)),
            Arc::new(Record::new(3, "c").with_foreign_id(7)),
        ];
        retain_duplicates(&mut records);
        assert_eq!(ids(&records), vec![1, 2]);
    }

    #[test]
    fn unset_foreign_ids_are_never_duplicates() {
        let mut records = vec![
            Arc::new(Record::new(1, "a")),
            Arc::new(Record::new(2, "b")),
            Arc::new(Record::new(3, "c").with_foreign_id(-4)),
            Arc::new(Record::new(4, "d").with_foreign_id(-4)),
        ];
        retain_duplicates(&mut records);
        assert!(records.is_empty());
    }
}
