//! The search-box phrase language.
//!
//! The leading character of the (variable-substituted) phrase picks the mode:
//! - `~rest`: one case-insensitive substring match of `rest`, no word splitting
//! - `=rest`: an expert query (see `QueryParser`)
//! - anything else: whitespace-separated terms; `+term` and bare terms are
//!   required, `-term` must not match

use bitflags::bitflags;

use crate::types::Record;

use super::matcher::RecordQueryMatcher;
use super::text_match::contains_folded;

bitflags! {
    /// Fields searched by free text in addition to the display name.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SearchFields: u8 {
        const DESCRIPTION = 0b01;
        /// The field of the active grouping mode.
        const GROUP = 0b10;
    }
}

pub const EXACT_PREFIX: char = '~';
pub const EXPERT_PREFIX: char = '=';

/// A parsed search-box phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum TextQuery {
    /// Matches every record.
    All,
    Exact(String),
    Terms {
        required: Vec<String>,
        excluded: Vec<String>,
    },
    Expert(RecordQueryMatcher),
    /// An expert query that failed to parse; matches nothing.
    Invalid(String),
}

impl TextQuery {
    pub fn parse(phrase: &str) -> Self {
        if let Some(rest) = phrase.strip_prefix(EXACT_PREFIX) {
            return if rest.is_empty() {
                Self::All
            } else {
                Self::Exact(rest.to_lowercase())
            };
        }
        if let Some(rest) = phrase.strip_prefix(EXPERT_PREFIX) {
            if rest.trim().is_empty() {
                return Self::All;
            }
            return match RecordQueryMatcher::compile(rest) {
                Ok(matcher) => Self::Expert(matcher),
                Err(error) => Self::Invalid(error.to_string()),
            };
        }
        Self::parse_terms(phrase)
    }

    /// Parses a phrase for refining an in-memory snapshot.
    ///
    /// Only term matching applies: a leading `~` is dropped and an expert
    /// query matches everything.
    pub fn parse_refinement(phrase: &str) -> Self {
        if phrase.starts_with(EXPERT_PREFIX) {
            return Self::All;
        }
        Self::parse_terms(phrase.strip_prefix(EXACT_PREFIX).unwrap_or(phrase))
    }

    fn parse_terms(phrase: &str) -> Self {
        let mut required = Vec::new();
        let mut excluded = Vec::new();
        for word in phrase.split_whitespace() {
            if let Some(term) = word.strip_prefix('-') {
                if !term.is_empty() {
                    excluded.push(term.to_lowercase());
                }
            } else if let Some(term) = word.strip_prefix('+') {
                if !term.is_empty() {
                    required.push(term.to_lowercase());
                }
            } else {
                required.push(word.to_lowercase());
            }
        }

        if required.is_empty() && excluded.is_empty() {
            Self::All
        } else {
            Self::Terms { required, excluded }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Parse error of an invalid expert query.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Invalid(message) => Some(message),
            _ => None,
        }
    }

    /// Matches a record. `group_value` is the text of the active grouping
    /// field, consulted only when `fields` contains `GROUP`.
    pub fn matches(&self, record: &Record, fields: SearchFields, group_value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Invalid(_) => false,
            Self::Expert(matcher) => matcher.matches(record),
            Self::Exact(needle) => any_field_contains(record, fields, group_value, needle),
            Self::Terms { required, excluded } => {
                required
                    .iter()
                    .all(|term| any_field_contains(record, fields, group_value, term))
                    && !excluded
                        .iter()
                        .any(|term| any_field_contains(record, fields, group_value, term))
            }
        }
    }
}

fn any_field_contains(
    record: &Record,
    fields: SearchFields,
    group_value: Option<&str>,
    needle: &str,
) -> bool {
    if contains_folded(&record.display_name, needle) {
        return true;
    }
    if fields.contains(SearchFields::DESCRIPTION) && contains_folded(&record.description, needle) {
        return true;
    }
    fields.contains(SearchFields::GROUP)
        && group_value.is_some_and(|value| contains_folded(value, needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record::new(1, name)
    }

    #[test]
    fn include_and_exclude_terms() {
        let query = TextQuery::parse("+sword -legacy");
        assert!(query.matches(&record("Fantasy Sword Pack"), SearchFields::empty(), None));
        assert!(!query.matches(&record("Legacy Sword Set"), SearchFields::empty(), None));
        assert!(!query.matches(&record("Shield Pack"), SearchFields::empty(), None));
    }

    #[test]
    fn exact_mode_does_not_split_words() {
        let query = TextQuery::parse("~sword pack");
        assert!(query.matches(&record("Fantasy Sword Pack"), SearchFields::empty(), None));
        assert!(!query.matches(&record("Sword Fantasy Pack"), SearchFields::empty(), None));

        let split = TextQuery::parse("sword pack");
        assert!(split.matches(&record("Sword Fantasy Pack"), SearchFields::empty(), None));
    }

    #[test]
    fn optional_fields_extend_the_search() {
        let item = record("Rock").with_description("Granite boulders");
        let query = TextQuery::parse("granite");
        assert!(!query.matches(&item, SearchFields::empty(), None));
        assert!(query.matches(&item, SearchFields::DESCRIPTION, None));

        let by_group = TextQuery::parse("nature");
        assert!(!by_group.matches(&item, SearchFields::DESCRIPTION, Some("Nature")));
        assert!(by_group.matches(&item, SearchFields::GROUP, Some("Nature")));
    }

    #[test]
    fn expert_mode_and_parse_errors() {
        let query = TextQuery::parse("=name:sword | name:axe");
        assert!(query.matches(&record("Battle Axe"), SearchFields::empty(), None));
        assert!(query.error().is_none());

        let broken = TextQuery::parse("=(sword");
        assert!(broken.error().is_some());
        assert!(!broken.matches(&record("Sword"), SearchFields::empty(), None));
    }

    #[test]
    fn blank_phrases_match_everything() {
        assert!(TextQuery::parse("").is_all());
        assert!(TextQuery::parse("   ").is_all());
        assert!(TextQuery::parse("~").is_all());
        assert!(TextQuery::parse("= ").is_all());
        assert!(TextQuery::parse("+ -").is_all());
    }

    #[test]
    fn refinement_uses_term_matching() {
        assert!(TextQuery::parse_refinement("=is:deprecated").is_all());
        assert_eq!(
            TextQuery::parse_refinement("~rock -moss"),
            TextQuery::Terms {
                required: vec!["rock".to_string()],
                excluded: vec!["moss".to_string()],
            }
        );
    }
}
