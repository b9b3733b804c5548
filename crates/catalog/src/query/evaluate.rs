//! Evaluation of expert-query expressions against records.

use crate::sort::Version;

use super::context::RecordQueryContext;
use super::expression::{QueryExpression, QueryFilter, QueryTerm, RecordFlag};
use super::text_match::{text_matches, text_matches_folded};

/// Evaluates a whole expression. An empty conjunction matches everything.
pub fn evaluate_expression(expression: &QueryExpression, context: &RecordQueryContext) -> bool {
    match expression {
        QueryExpression::Term(term) => evaluate_query_term(term, context),
        QueryExpression::Not(inner) => !evaluate_expression(inner, context),
        QueryExpression::And(parts) => parts.iter().all(|part| evaluate_expression(part, context)),
        QueryExpression::Or(parts) => parts.iter().any(|part| evaluate_expression(part, context)),
    }
}

/// Evaluates a single term against a record context.
pub fn evaluate_query_term(term: &QueryTerm, context: &RecordQueryContext) -> bool {
    match term {
        QueryTerm::Text(value) => text_matches_folded(value, context.folded_name()),
        QueryTerm::Filter(filter) => evaluate_query_filter(filter, context),
    }
}

fn evaluate_query_filter(filter: &QueryFilter, context: &RecordQueryContext) -> bool {
    let record = context.record();
    match filter {
        QueryFilter::Text { field, pattern } => text_matches(pattern, context.text_field(*field)),
        QueryFilter::Source(kind) => record.source == *kind,
        QueryFilter::Type(category) => {
            !record.extension.is_empty() && category.matches_extension(&record.extension)
        }
        QueryFilter::Tag { tags } => tags.iter().any(|tag| record.has_tag(tag)),
        QueryFilter::Numeric { field, predicate } => context
            .numeric_field(*field)
            .is_some_and(|value| predicate.matches(value)),
        QueryFilter::Version { op, version } => Version::parse(&record.version)
            .is_some_and(|candidate| op.evaluate(&candidate, version)),
        QueryFilter::Updated(predicate) => record
            .updated_at
            .is_some_and(|timestamp| predicate.matches(timestamp)),
        QueryFilter::Flag(flag) => match flag {
            RecordFlag::Deprecated => record.deprecated,
            RecordFlag::Abandoned => record.abandoned,
            RecordFlag::Downloaded => record.downloaded,
            RecordFlag::Excluded => record.excluded,
            RecordFlag::Feature => record.feature,
            RecordFlag::Preview => record.has_preview,
            RecordFlag::SubPackage => !record.is_top_level(),
        },
        QueryFilter::Metadata { key, pattern } => record
            .metadata
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(key))
            .is_some_and(|(_, value)| text_matches(pattern, value)),
    }
}
