//! Sort keys and the comparator table.

use std::cmp::Ordering;
use std::sync::Arc;

use fnv::FnvHashMap;
use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};

use crate::types::Record;

use super::version::Version;

/// Primary comparison for one sort key, before the name tie-break.
pub type Comparator = fn(&Record, &Record) -> Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Category,
    Publisher,
    Location,
    State,
    Size,
    FileCount,
    Rating,
    RatingCount,
    Updated,
    Version,
    Id,
    /// A dynamic metadata column.
    Custom(String),
}

impl SortKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Publisher => "publisher",
            Self::Location => "location",
            Self::State => "state",
            Self::Size => "size",
            Self::FileCount => "file_count",
            Self::Rating => "rating",
            Self::RatingCount => "rating_count",
            Self::Updated => "updated",
            Self::Version => "version",
            Self::Id => "id",
            Self::Custom(column) => column,
        }
    }

    /// Looks up a sort key by name; unknown names become `Custom`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Self::Name,
            "category" => Self::Category,
            "publisher" => Self::Publisher,
            "location" => Self::Location,
            "state" => Self::State,
            "size" => Self::Size,
            "file_count" | "files" => Self::FileCount,
            "rating" => Self::Rating,
            "rating_count" | "ratings" => Self::RatingCount,
            "updated" | "last_updated" => Self::Updated,
            "version" => Self::Version,
            "id" => Self::Id,
            _ => Self::Custom(value.trim().to_string()),
        }
    }
}

/// Comparator table keyed by sort key, built once per session.
#[derive(Debug, Clone)]
pub struct SortRegistry {
    table: FnvHashMap<SortKey, Comparator>,
}

impl Default for SortRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SortRegistry {
    pub fn new() -> Self {
        let entries: [(SortKey, Comparator); 12] = [
            (SortKey::Name, |_, _| Ordering::Equal),
            (SortKey::Category, |a, b| compare_ignore_case(&a.category, &b.category)),
            (SortKey::Publisher, |a, b| compare_ignore_case(&a.publisher, &b.publisher)),
            (SortKey::Location, |a, b| compare_ignore_case(&a.location, &b.location)),
            (SortKey::State, |a, b| {
                compare_ignore_case(&a.official_state, &b.official_state)
            }),
            (SortKey::Size, |a, b| a.size.cmp(&b.size)),
            (SortKey::FileCount, |a, b| a.file_count.cmp(&b.file_count)),
            (SortKey::Rating, |a, b| {
                a.rating
                    .total_cmp(&b.rating)
                    .then(a.rating_count.cmp(&b.rating_count))
            }),
            (SortKey::RatingCount, |a, b| {
                a.rating_count
                    .cmp(&b.rating_count)
                    .then(a.rating.total_cmp(&b.rating))
            }),
            (SortKey::Updated, compare_updated),
            (SortKey::Version, |a, b| {
                Version::parse(&a.version).cmp(&Version::parse(&b.version))
            }),
            (SortKey::Id, |a, b| a.id.cmp(&b.id)),
        ];
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// Primary comparator for `key`. Keys without an entry fall back to the
    /// last-updated timestamp.
    pub fn comparator(&self, key: &SortKey) -> Comparator {
        self.table.get(key).copied().unwrap_or(compare_updated)
    }

    /// Total order: primary comparator, then name (case-insensitive), then id.
    pub fn compare(&self, key: &SortKey, a: &Record, b: &Record) -> Ordering {
        let primary = self.comparator(key);
        primary(a, b).then_with(|| tie_break(a, b))
    }

    /// Sorts records in place. `descending` reverses the complete ordering.
    pub fn sort(&self, records: &mut [Arc<Record>], key: &SortKey, descending: bool) {
        let primary = self.comparator(key);
        records.par_sort_by(|a, b| {
            let ordering = primary(a, b).then_with(|| tie_break(a, b));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

fn compare_updated(a: &Record, b: &Record) -> Ordering {
    a.updated_at.cmp(&b.updated_at)
}

fn tie_break(a: &Record, b: &Record) -> Ordering {
    compare_ignore_case(&a.display_name, &b.display_name).then(a.id.cmp(&b.id))
}

/// Case-insensitive string comparison without allocating.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[Arc<Record>]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    fn rated(id: i64, name: &str, rating: f32, count: u32) -> Arc<Record> {
        let mut record = Record::new(id, name);
        record.rating = rating;
        record.rating_count = count;
        Arc::new(record)
    }

    #[test]
    fn name_sort_is_case_insensitive_with_id_tie_break() {
        let registry = SortRegistry::new();
        let mut records = vec![
            Arc::new(Record::new(3, "beta")),
            Arc::new(Record::new(1, "Alpha")),
            Arc::new(Record::new(2, "alpha")),
        ];
        registry.sort(&mut records, &SortKey::Name, false);
        assert_eq!(ids(&records), vec![1, 2, 3]);

        registry.sort(&mut records, &SortKey::Name, true);
        assert_eq!(ids(&records), vec![3, 2, 1]);
    }

    #[test]
    fn rating_ties_break_on_count_and_back() {
        let registry = SortRegistry::new();
        let mut records = vec![
            rated(1, "a", 4.0, 10),
            rated(2, "b", 4.0, 50),
            rated(3, "c", 5.0, 1),
        ];
        registry.sort(&mut records, &SortKey::Rating, true);
        assert_eq!(ids(&records), vec![3, 2, 1]);

        let mut by_count = vec![rated(1, "a", 3.0, 10), rated(2, "b", 4.5, 10)];
        registry.sort(&mut by_count, &SortKey::RatingCount, true);
        assert_eq!(ids(&by_count), vec![2, 1]);
    }

    #[test]
    fn version_sort_is_numeric() {
        let registry = SortRegistry::new();
        let mut records = vec![
            Arc::new(Record::new(1, "a").with_version("10.0")),
            Arc::new(Record::new(2, "b").with_version("2.0")),
            Arc::new(Record::new(3, "c").with_version("2.0-beta")),
        ];
        registry.sort(&mut records, &SortKey::Version, false);
        assert_eq!(ids(&records), vec![3, 2, 1]);
    }

    #[test]
    fn custom_keys_fall_back_to_updated_then_name() {
        let registry = SortRegistry::new();
        let mut newer = Record::new(1, "zeta");
        newer.updated_at = Some(200);
        let mut older = Record::new(2, "omega");
        older.updated_at = Some(100);
        let mut same = Record::new(3, "alpha");
        same.updated_at = Some(200);

        let mut records = vec![Arc::new(newer), Arc::new(older), Arc::new(same)];
        registry.sort(&mut records, &SortKey::parse("license"), false);
        assert_eq!(ids(&records), vec![2, 3, 1]);
    }

    #[test]
    fn parse_round_trips_builtin_names() {
        for key in [SortKey::Name, SortKey::RatingCount, SortKey::Updated] {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
        assert_eq!(SortKey::parse("License"), SortKey::Custom("License".to_string()));
    }
}
