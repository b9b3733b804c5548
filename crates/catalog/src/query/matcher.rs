//! Compiled expert-query matcher.

use crate::error::Result;
use crate::types::Record;

use super::context::RecordQueryContext;
use super::evaluate::evaluate_expression;
use super::expression::{lowercase_query_expression, QueryExpression};
use super::optimizer::optimize_expression;
use super::parser::QueryParser;

/// A compiled expert query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQueryMatcher {
    expression: QueryExpression,
}

impl RecordQueryMatcher {
    /// Compiles a raw query string into a matcher.
    ///
    /// The compilation pipeline:
    /// 1. Parse the raw query string into an AST
    /// 2. Lowercase text patterns for case-insensitive matching
    /// 3. Optimize the expression (flatten nested AND/OR, reorder by cost)
    pub fn compile(raw_query: &str) -> Result<Self> {
        let parsed = QueryParser::parse(raw_query)?;
        let expression = optimize_expression(lowercase_query_expression(parsed));
        Ok(Self { expression })
    }

    /// Returns the optimized expression.
    pub fn expression(&self) -> &QueryExpression {
        &self.expression
    }

    pub fn matches(&self, record: &Record) -> bool {
        let context = RecordQueryContext::new(record);
        evaluate_expression(&self.expression, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, SourceKind};

    fn compile(query: &str) -> RecordQueryMatcher {
        RecordQueryMatcher::compile(query).expect("compile")
    }

    fn sample() -> Record {
        let mut record = Record::new(10, "Stylized Rock Pack")
            .with_publisher("Blue Studio")
            .with_category("3D/Environments")
            .with_tag("Nature")
            .with_size(12 * 1024 * 1024)
            .with_version("2.4.1");
        record.rating = 4.5;
        record.rating_count = 120;
        record.source = SourceKind::StorePackage;
        record.deprecated = true;
        record.metadata.insert("License".to_string(), "MIT".to_string());
        record
    }

    #[test]
    fn free_text_matches_name_case_insensitively() {
        let record = sample();
        assert!(compile("ROCK").matches(&record));
        assert!(compile("stylized*").matches(&record));
        assert!(!compile("tree").matches(&record));
    }

    #[test]
    fn boolean_operators() {
        let record = sample();
        assert!(compile("rock | tree").matches(&record));
        assert!(!compile("rock tree").matches(&record));
        assert!(compile("rock !tree").matches(&record));
        assert!(compile("NOT (tree OR water)").matches(&record));
    }

    #[test]
    fn field_filters() {
        let record = sample();
        assert!(compile("pub:blue cat:environments").matches(&record));
        assert!(compile("source:store tag:nature;props").matches(&record));
        assert!(compile("size:>10mb rating:>=4 ratings:100..200").matches(&record));
        assert!(compile("version:>2.0 version:<10").matches(&record));
        assert!(compile("is:deprecated meta.license:mit").matches(&record));
        assert!(!compile("is:downloaded").matches(&record));
        assert!(!compile("width:>0").matches(&record));
    }

    #[test]
    fn unknown_field_falls_back_to_name_text() {
        let mut record = sample();
        record.display_name = "foo:bar asset".to_string();
        assert!(compile("foo:bar").matches(&record));
    }

    #[test]
    fn invalid_query_fails_to_compile() {
        assert!(RecordQueryMatcher::compile("rating:>>").is_err());
        assert!(RecordQueryMatcher::compile("(rock").is_err());
    }
}
