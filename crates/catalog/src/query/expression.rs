//! Query expression types and AST nodes.

use crate::sort::Version;
use crate::types::SourceKind;

use super::date_filter::DatePredicate;
use super::numeric::{ComparisonOp, NumericPredicate};
use super::type_filter::TypeCategory;

/// A parsed query expression (AST node).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    Term(QueryTerm),
    Not(Box<QueryExpression>),
    And(Vec<QueryExpression>),
    Or(Vec<QueryExpression>),
}

/// A single query term (leaf node in the AST).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTerm {
    /// Free text matched against the display name.
    Text(String),
    Filter(QueryFilter),
}

/// String fields addressable with `field:value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Category,
    Publisher,
    Location,
    State,
    SafeName,
}

/// Numeric fields addressable with `field:<predicate>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Size,
    FileCount,
    Rating,
    RatingCount,
    Width,
    Height,
    Length,
    Id,
    ParentId,
    ForeignId,
}

/// Boolean record flags addressable with `is:flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFlag {
    Deprecated,
    Abandoned,
    Downloaded,
    Excluded,
    Feature,
    Preview,
    SubPackage,
}

/// A typed constraint on one record property.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Text { field: TextField, pattern: String },
    Source(SourceKind),
    Type(TypeCategory),
    /// Matches records carrying any of the tags.
    Tag { tags: Vec<String> },
    Numeric {
        field: NumericField,
        predicate: NumericPredicate,
    },
    Version { op: ComparisonOp, version: Version },
    Updated(DatePredicate),
    Flag(RecordFlag),
    Metadata { key: String, pattern: String },
}

/// Checks if an expression contains at least one concrete term.
pub fn query_expression_has_terms(expression: &QueryExpression) -> bool {
    match expression {
        QueryExpression::Term(_) => true,
        QueryExpression::Not(inner) => query_expression_has_terms(inner),
        QueryExpression::And(parts) | QueryExpression::Or(parts) => {
            parts.iter().any(query_expression_has_terms)
        }
    }
}

/// Lowercases every text pattern in the tree for case-insensitive matching.
pub fn lowercase_query_expression(expression: QueryExpression) -> QueryExpression {
    match expression {
        QueryExpression::Term(term) => QueryExpression::Term(match term {
            QueryTerm::Text(value) => QueryTerm::Text(value.to_lowercase()),
            QueryTerm::Filter(filter) => QueryTerm::Filter(lowercase_query_filter(filter)),
        }),
        QueryExpression::Not(inner) => {
            QueryExpression::Not(Box::new(lowercase_query_expression(*inner)))
        }
        QueryExpression::And(parts) => QueryExpression::And(
            parts.into_iter().map(lowercase_query_expression).collect(),
        ),
        QueryExpression::Or(parts) => {
            QueryExpression::Or(parts.into_iter().map(lowercase_query_expression).collect())
        }
    }
}

fn lowercase_query_filter(filter: QueryFilter) -> QueryFilter {
    match filter {
        QueryFilter::Text { field, pattern } => QueryFilter::Text {
            field,
            pattern: pattern.to_lowercase(),
        },
        QueryFilter::Tag { tags } => QueryFilter::Tag {
            tags: tags.into_iter().map(|tag| tag.to_lowercase()).collect(),
        },
        QueryFilter::Metadata { key, pattern } => QueryFilter::Metadata {
            key,
            pattern: pattern.to_lowercase(),
        },
        other => other,
    }
}
