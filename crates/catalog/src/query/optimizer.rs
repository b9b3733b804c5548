//! Query optimization for expert queries.
//!
//! Applies deterministic rewrites that make evaluation cheaper:
//! - Flattens nested AND/OR expressions
//! - Unwraps single-item conjunctions and disjunctions
//! - Reorders AND operands by cost (flag and numeric checks first, tag scans last)

use super::expression::{QueryExpression, QueryFilter, QueryTerm};

/// Optimizes a query expression. A new tree is returned.
pub fn optimize_expression(expr: QueryExpression) -> QueryExpression {
    match expr {
        QueryExpression::And(parts) => optimize_and(parts),
        QueryExpression::Or(parts) => optimize_or(parts),
        QueryExpression::Not(inner) => QueryExpression::Not(Box::new(optimize_expression(*inner))),
        QueryExpression::Term(_) => expr,
    }
}

fn optimize_and(parts: Vec<QueryExpression>) -> QueryExpression {
    let mut flattened = Vec::new();
    for expr in parts.into_iter().map(optimize_expression) {
        match expr {
            QueryExpression::And(nested) => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    reorder_by_cost(&mut flattened);
    QueryExpression::And(flattened)
}

fn optimize_or(parts: Vec<QueryExpression>) -> QueryExpression {
    let mut flattened = Vec::new();
    for expr in parts.into_iter().map(optimize_expression) {
        match expr {
            QueryExpression::Or(nested) => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    QueryExpression::Or(flattened)
}

/// Cost levels (lower runs first):
/// - 0: flags, numeric, source, date, and version checks (field reads)
/// - 1: name text terms and type checks (one substring search)
/// - 2: other text fields, metadata, and nested boolean expressions
/// - 3: tag filters (scan of the tag list per term)
fn expression_cost(expr: &QueryExpression) -> u8 {
    match expr {
        QueryExpression::Term(QueryTerm::Filter(filter)) => match filter {
            QueryFilter::Flag(_)
            | QueryFilter::Numeric { .. }
            | QueryFilter::Source(_)
            | QueryFilter::Updated(_)
            | QueryFilter::Version { .. } => 0,
            QueryFilter::Type(_) => 1,
            QueryFilter::Text { .. } | QueryFilter::Metadata { .. } => 2,
            QueryFilter::Tag { .. } => 3,
        },
        QueryExpression::Term(QueryTerm::Text(_)) => 1,
        _ => 2,
    }
}

fn reorder_by_cost(parts: &mut [QueryExpression]) {
    // Stable, so equal-cost operands keep their written order.
    parts.sort_by_key(expression_cost);
}
