//! Expert query parser and tokenizer.

use crate::error::{CatalogError, Result};
use crate::sort::Version;
use crate::types::SourceKind;

use super::date_filter::DatePredicate;
use super::expression::{
    query_expression_has_terms, NumericField, QueryExpression, QueryFilter, QueryTerm, RecordFlag,
    TextField,
};
use super::numeric::{parse_comparison, ComparisonOp, NumericPredicate};
use super::type_filter::lookup_type_category;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QueryToken {
    kind: QueryTokenKind,
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTokenKind {
    Word(String),
    Phrase(String),
    LParen,
    RParen,
    LAngle,
    RAngle,
    Pipe,
    Bang,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryGroupDelimiter {
    Parenthesis,
    Angle,
}

impl QueryGroupDelimiter {
    fn open_kind(self) -> QueryTokenKind {
        match self {
            Self::Parenthesis => QueryTokenKind::LParen,
            Self::Angle => QueryTokenKind::LAngle,
        }
    }

    fn close_kind(self) -> QueryTokenKind {
        match self {
            Self::Parenthesis => QueryTokenKind::RParen,
            Self::Angle => QueryTokenKind::RAngle,
        }
    }

    fn close_char(self) -> char {
        match self {
            Self::Parenthesis => ')',
            Self::Angle => '>',
        }
    }
}

// ---------------------------------------------------------------------------
// Query parser
// ---------------------------------------------------------------------------

/// Recursive-descent parser: AND binds loosest, then OR, then NOT.
pub struct QueryParser {
    tokens: Vec<QueryToken>,
    index: usize,
}

impl QueryParser {
    pub fn parse(input: &str) -> Result<QueryExpression> {
        let tokens = tokenize_query_input(input)?;
        if tokens.is_empty() {
            return Err(CatalogError::QueryParse(
                "query must contain at least one term".to_string(),
            ));
        }

        let mut parser = Self { tokens, index: 0 };
        let expression = parser.parse_and_expression(None)?;
        if let Some(token) = parser.peek() {
            return Err(CatalogError::QueryParse(format!(
                "unexpected token near byte {}",
                token.position
            )));
        }
        if !query_expression_has_terms(&expression) {
            return Err(CatalogError::QueryParse(
                "query must contain at least one term".to_string(),
            ));
        }

        Ok(expression)
    }

    fn parse_and_expression(
        &mut self,
        closing: Option<QueryGroupDelimiter>,
    ) -> Result<QueryExpression> {
        let mut parts = Vec::new();

        while !self.is_end() && !self.next_is_group_close(closing) {
            if self.consume_kind(|kind| *kind == QueryTokenKind::And) {
                continue;
            }

            parts.push(self.parse_or_expression(closing)?);

            if self.consume_kind(|kind| *kind == QueryTokenKind::And) {
                continue;
            }
            if self.next_starts_operand() {
                continue;
            }
            break;
        }

        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => QueryExpression::And(parts),
        })
    }

    fn parse_or_expression(
        &mut self,
        closing: Option<QueryGroupDelimiter>,
    ) -> Result<QueryExpression> {
        let mut parts = vec![self.parse_not_expression()?];

        while self.consume_kind(is_or_separator) {
            if self.is_end() || self.next_is_group_close(closing) {
                break;
            }
            if self.peek().is_some_and(|token| is_or_separator(&token.kind)) {
                continue;
            }
            parts.push(self.parse_not_expression()?);
        }

        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => QueryExpression::Or(parts),
        })
    }

    fn parse_not_expression(&mut self) -> Result<QueryExpression> {
        let mut negate = false;
        while self.consume_kind(|kind| matches!(kind, QueryTokenKind::Bang | QueryTokenKind::Not))
        {
            negate = !negate;
        }

        let expression = self.parse_primary_expression()?;
        if negate {
            Ok(QueryExpression::Not(Box::new(expression)))
        } else {
            Ok(expression)
        }
    }

    fn parse_primary_expression(&mut self) -> Result<QueryExpression> {
        for delimiter in [QueryGroupDelimiter::Parenthesis, QueryGroupDelimiter::Angle] {
            let open = delimiter.open_kind();
            if self.consume_kind(|kind| *kind == open) {
                return self.parse_group(delimiter);
            }
        }

        let Some(token) = self.next() else {
            return Err(CatalogError::QueryParse(
                "expected query term but reached end of query".to_string(),
            ));
        };

        match &token.kind {
            QueryTokenKind::Word(_) | QueryTokenKind::Phrase(_) => {
                Ok(QueryExpression::Term(parse_query_term(&token)?))
            }
            QueryTokenKind::RParen => Err(CatalogError::QueryParse(format!(
                "unexpected ')' near byte {}",
                token.position
            ))),
            QueryTokenKind::RAngle => Err(CatalogError::QueryParse(format!(
                "unexpected '>' near byte {}",
                token.position
            ))),
            _ => Err(CatalogError::QueryParse(format!(
                "expected query term near byte {}",
                token.position
            ))),
        }
    }

    fn parse_group(&mut self, closing: QueryGroupDelimiter) -> Result<QueryExpression> {
        let expression = self.parse_and_expression(Some(closing))?;
        let close = closing.close_kind();
        if self.consume_kind(|kind| *kind == close) {
            return Ok(expression);
        }

        let position = self
            .peek()
            .map(|token| token.position)
            .unwrap_or_else(|| self.last_position());
        Err(CatalogError::QueryParse(format!(
            "missing closing '{}' near byte {position}",
            closing.close_char()
        )))
    }

    fn next_starts_operand(&self) -> bool {
        matches!(
            self.peek().map(|token| &token.kind),
            Some(
                QueryTokenKind::Word(_)
                    | QueryTokenKind::Phrase(_)
                    | QueryTokenKind::LParen
                    | QueryTokenKind::LAngle
                    | QueryTokenKind::Bang
                    | QueryTokenKind::Not
            )
        )
    }

    fn consume_kind(&mut self, accept: impl Fn(&QueryTokenKind) -> bool) -> bool {
        match self.peek() {
            Some(token) if accept(&token.kind) => {
                self.index += 1;
                true
            }
            _ => false,
        }
    }

    fn next_is_group_close(&self, delimiter: Option<QueryGroupDelimiter>) -> bool {
        match (delimiter, self.peek()) {
            (Some(delimiter), Some(token)) => token.kind == delimiter.close_kind(),
            _ => false,
        }
    }

    fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<QueryToken> {
        let token = self.tokens.get(self.index)?.clone();
        self.index += 1;
        Some(token)
    }

    fn last_position(&self) -> usize {
        self.tokens
            .last()
            .map(|token| token.position)
            .unwrap_or_default()
    }
}

fn is_or_separator(kind: &QueryTokenKind) -> bool {
    matches!(kind, QueryTokenKind::Pipe | QueryTokenKind::Or)
}

// ---------------------------------------------------------------------------
// Term parsing
// ---------------------------------------------------------------------------

fn parse_query_term(token: &QueryToken) -> Result<QueryTerm> {
    let raw = match &token.kind {
        QueryTokenKind::Phrase(value) => return Ok(QueryTerm::Text(value.clone())),
        QueryTokenKind::Word(raw) => raw,
        _ => {
            return Err(CatalogError::QueryParse(
                "invalid query token while parsing term".to_string(),
            ))
        }
    };

    let Some(split) = raw.find(':') else {
        return Ok(QueryTerm::Text(raw.clone()));
    };
    if split == 0 {
        return Ok(QueryTerm::Text(raw.clone()));
    }
    let name = raw[..split].to_ascii_lowercase();
    let argument = unquote(raw[split + 1..].trim());

    if let Some(key) = name.strip_prefix("meta.") {
        if key.is_empty() {
            return Err(CatalogError::QueryParse(
                "meta. requires a column name".to_string(),
            ));
        }
        return Ok(QueryTerm::Filter(QueryFilter::Metadata {
            key: key.to_string(),
            pattern: argument.to_string(),
        }));
    }

    if let Some(field) = text_field(&name) {
        if argument.is_empty() {
            return Err(CatalogError::QueryParse(format!(
                "{name}: requires a value"
            )));
        }
        return Ok(QueryTerm::Filter(QueryFilter::Text {
            field,
            pattern: argument.to_string(),
        }));
    }

    if let Some(field) = numeric_field(&name) {
        let predicate = if field == NumericField::Size {
            NumericPredicate::parse_size(argument)?
        } else {
            NumericPredicate::parse(argument)?
        };
        return Ok(QueryTerm::Filter(QueryFilter::Numeric { field, predicate }));
    }

    let filter = match name.as_str() {
        "source" | "src" => {
            let kind = SourceKind::parse(argument).ok_or_else(|| {
                CatalogError::QueryParse(format!("unknown source kind: {argument}"))
            })?;
            QueryFilter::Source(kind)
        }
        "type" => {
            if argument.is_empty() {
                return Err(CatalogError::QueryParse(
                    "type: requires a category".to_string(),
                ));
            }
            let category = lookup_type_category(argument).ok_or_else(|| {
                CatalogError::QueryParse(format!("unknown type category: {argument}"))
            })?;
            QueryFilter::Type(category)
        }
        "tag" | "tags" => {
            let tags = argument
                .split(';')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if tags.is_empty() {
                return Err(CatalogError::QueryParse(
                    "tag: requires at least one tag name".to_string(),
                ));
            }
            QueryFilter::Tag { tags }
        }
        "version" | "ver" => {
            let (op, value) = parse_comparison(argument).unwrap_or((ComparisonOp::Eq, argument));
            let version = Version::parse(value).ok_or_else(|| {
                CatalogError::QueryParse(format!("invalid version: {argument:?}"))
            })?;
            QueryFilter::Version { op, version }
        }
        "updated" | "date" => QueryFilter::Updated(DatePredicate::parse(argument)?),
        "is" => {
            let flag = record_flag(argument).ok_or_else(|| {
                CatalogError::QueryParse(format!("unknown flag: is:{argument}"))
            })?;
            QueryFilter::Flag(flag)
        }
        _ => return Ok(QueryTerm::Text(raw.clone())),
    };
    Ok(QueryTerm::Filter(filter))
}

fn text_field(name: &str) -> Option<TextField> {
    match name {
        "name" => Some(TextField::Name),
        "desc" | "description" => Some(TextField::Description),
        "category" | "cat" => Some(TextField::Category),
        "publisher" | "pub" => Some(TextField::Publisher),
        "location" | "loc" => Some(TextField::Location),
        "state" => Some(TextField::State),
        "safe" | "safename" => Some(TextField::SafeName),
        _ => None,
    }
}

fn numeric_field(name: &str) -> Option<NumericField> {
    match name {
        "size" => Some(NumericField::Size),
        "files" | "filecount" => Some(NumericField::FileCount),
        "rating" => Some(NumericField::Rating),
        "ratings" | "ratingcount" => Some(NumericField::RatingCount),
        "width" => Some(NumericField::Width),
        "height" => Some(NumericField::Height),
        "length" => Some(NumericField::Length),
        "id" => Some(NumericField::Id),
        "parent" => Some(NumericField::ParentId),
        "foreign" | "foreignid" => Some(NumericField::ForeignId),
        _ => None,
    }
}

fn record_flag(value: &str) -> Option<RecordFlag> {
    match value.trim().to_ascii_lowercase().as_str() {
        "deprecated" => Some(RecordFlag::Deprecated),
        "abandoned" => Some(RecordFlag::Abandoned),
        "downloaded" => Some(RecordFlag::Downloaded),
        "excluded" => Some(RecordFlag::Excluded),
        "feature" | "bundle" => Some(RecordFlag::Feature),
        "preview" => Some(RecordFlag::Preview),
        "sub" | "subpackage" | "child" => Some(RecordFlag::SubPackage),
        _ => None,
    }
}

/// Strips one pair of surrounding double quotes from a field argument.
fn unquote(argument: &str) -> &str {
    argument
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(argument)
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize_query_input(input: &str) -> Result<Vec<QueryToken>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let single = match ch {
            '(' => Some(QueryTokenKind::LParen),
            ')' => Some(QueryTokenKind::RParen),
            '<' => Some(QueryTokenKind::LAngle),
            '>' => Some(QueryTokenKind::RAngle),
            '|' => Some(QueryTokenKind::Pipe),
            '!' => Some(QueryTokenKind::Bang),
            _ => None,
        };
        if let Some(kind) = single {
            chars.next();
            tokens.push(QueryToken { kind, position });
            continue;
        }

        if ch == '"' {
            chars.next();
            let phrase = consume_quoted_phrase(&mut chars, position)?;
            tokens.push(QueryToken {
                kind: QueryTokenKind::Phrase(phrase),
                position,
            });
            continue;
        }

        let mut end = position;
        let mut seen_colon = false;
        let mut in_quotes = false;
        while let Some(&(index, next)) = chars.peek() {
            if next == '"' && seen_colon {
                in_quotes = !in_quotes;
            } else if !in_quotes {
                if next.is_whitespace() || matches!(next, '(' | ')' | '|') {
                    break;
                }
                // Operators belong to the word once a field prefix was seen.
                if !seen_colon && matches!(next, '<' | '>' | '!') {
                    break;
                }
            }
            if next == ':' {
                seen_colon = true;
            }
            end = index + next.len_utf8();
            chars.next();
        }

        let raw = &input[position..end];
        let kind = if raw.eq_ignore_ascii_case("and") {
            QueryTokenKind::And
        } else if raw.eq_ignore_ascii_case("or") {
            QueryTokenKind::Or
        } else if raw.eq_ignore_ascii_case("not") {
            QueryTokenKind::Not
        } else {
            QueryTokenKind::Word(raw.to_string())
        };
        tokens.push(QueryToken { kind, position });
    }

    Ok(tokens)
}

fn consume_quoted_phrase<I>(chars: &mut std::iter::Peekable<I>, start: usize) -> Result<String>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut phrase = String::new();
    let mut escaped = false;

    for (_, ch) in chars.by_ref() {
        if escaped {
            phrase.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => return Ok(phrase),
            _ => phrase.push(ch),
        }
    }

    Err(CatalogError::QueryParse(format!(
        "missing closing quote near byte {start}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> QueryExpression {
        QueryParser::parse(input).expect("parse")
    }

    fn text(value: &str) -> QueryExpression {
        QueryExpression::Term(QueryTerm::Text(value.to_string()))
    }

    #[test]
    fn implicit_and_between_words() {
        assert_eq!(
            parse("rock stone"),
            QueryExpression::And(vec![text("rock"), text("stone")])
        );
    }

    #[test]
    fn or_binds_tighter_than_and() {
        assert_eq!(
            parse("tree oak | pine"),
            QueryExpression::And(vec![
                text("tree"),
                QueryExpression::Or(vec![text("oak"), text("pine")]),
            ])
        );
    }

    #[test]
    fn not_groups_and_phrases() {
        assert_eq!(
            parse("!(\"low poly\" OR <cartoon>)"),
            QueryExpression::Not(Box::new(QueryExpression::Or(vec![
                text("low poly"),
                text("cartoon"),
            ])))
        );
    }

    #[test]
    fn field_terms_keep_operators() {
        let expression = parse("size:>10mb version:>=2.0 rating:!=3");
        let QueryExpression::And(parts) = expression else {
            panic!("expected And");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(
            &parts[0],
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Numeric {
                field: NumericField::Size,
                ..
            }))
        ));
        assert!(matches!(
            &parts[1],
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Version {
                op: ComparisonOp::Gte,
                ..
            }))
        ));
        assert!(matches!(
            &parts[2],
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Numeric {
                field: NumericField::Rating,
                ..
            }))
        ));
    }

    #[test]
    fn quoted_field_argument() {
        assert_eq!(
            parse("pub:\"Blue Studio\""),
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Text {
                field: TextField::Publisher,
                pattern: "Blue Studio".to_string(),
            }))
        );
    }

    #[test]
    fn metadata_and_tags() {
        assert_eq!(
            parse("meta.license:mit"),
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Metadata {
                key: "license".to_string(),
                pattern: "mit".to_string(),
            }))
        );
        assert_eq!(
            parse("tag:nature;props"),
            QueryExpression::Term(QueryTerm::Filter(QueryFilter::Tag {
                tags: vec!["nature".to_string(), "props".to_string()],
            }))
        );
    }

    #[test]
    fn unknown_field_is_text() {
        assert_eq!(parse("foo:bar"), text("foo:bar"));
    }

    #[test]
    fn malformed_queries_are_errors() {
        assert!(QueryParser::parse("").is_err());
        assert!(QueryParser::parse("(rock").is_err());
        assert!(QueryParser::parse("rock)").is_err());
        assert!(QueryParser::parse("\"open").is_err());
        assert!(QueryParser::parse("size:abc").is_err());
        assert!(QueryParser::parse("type:nonsense").is_err());
        assert!(QueryParser::parse("is:shiny").is_err());
        assert!(QueryParser::parse("!").is_err());
    }
}
