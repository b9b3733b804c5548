//! Query parsing, compilation, and matching for catalog search.
//!
//! This module provides the search-box phrase language and the expert query
//! language behind its `=` prefix, including:
//! - Expression types (AND, OR, NOT, terms)
//! - Field filters (text fields, source, type, tags, numeric, version, date, flags, metadata)
//! - Query parsing and tokenization
//! - Query optimization (flattening, reordering by cost)
//! - Matching against `Record`

mod context;
mod date_filter;
mod evaluate;
mod expression;
mod matcher;
mod numeric;
mod optimizer;
mod parser;
mod text_match;
mod text_query;
mod type_filter;

pub use date_filter::DatePredicate;
pub use expression::{
    NumericField, QueryExpression, QueryFilter, QueryTerm, RecordFlag, TextField,
};
pub use matcher::RecordQueryMatcher;
pub use numeric::{parse_size_literal, ComparisonOp, NumericPredicate, RangeFilter};
pub use parser::QueryParser;
pub use text_match::{contains_folded, fold_case, wildcard_matches};
pub use text_query::{SearchFields, TextQuery, EXACT_PREFIX, EXPERT_PREFIX};
pub use type_filter::{lookup_type_category, TypeCategory};
