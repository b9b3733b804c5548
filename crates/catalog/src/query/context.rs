//! Per-record view used while evaluating expert queries.

use std::borrow::Cow;

use crate::types::Record;

use super::expression::{NumericField, TextField};
use super::text_match::fold_case;

/// Query context for one record.
///
/// The display name is lowercased once up front because free-text terms,
/// the most common term kind, all compare against it.
pub struct RecordQueryContext<'a> {
    record: &'a Record,
    name: Cow<'a, str>,
}

impl<'a> RecordQueryContext<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self {
            record,
            name: fold_case(&record.display_name),
        }
    }

    pub fn record(&self) -> &'a Record {
        self.record
    }

    /// Lowercased display name.
    pub fn folded_name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn text_field(&self, field: TextField) -> &'a str {
        let record = self.record;
        match field {
            TextField::Name => &record.display_name,
            TextField::Description => &record.description,
            TextField::Category => &record.category,
            TextField::Publisher => &record.publisher,
            TextField::Location => &record.location,
            TextField::State => &record.official_state,
            TextField::SafeName => &record.safe_name,
        }
    }

    /// Numeric value of a field, `None` when the record does not carry it.
    pub fn numeric_field(&self, field: NumericField) -> Option<f64> {
        let record = self.record;
        match field {
            NumericField::Size => Some(record.size as f64),
            NumericField::FileCount => Some(record.file_count as f64),
            NumericField::Rating => Some(f64::from(record.rating)),
            NumericField::RatingCount => Some(f64::from(record.rating_count)),
            NumericField::Width => record.width.map(f64::from),
            NumericField::Height => record.height.map(f64::from),
            NumericField::Length => record.length,
            NumericField::Id => Some(record.id as f64),
            NumericField::ParentId => Some(record.parent_id as f64),
            NumericField::ForeignId => Some(record.foreign_id as f64),
        }
    }
}
