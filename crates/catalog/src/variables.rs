//! Named `{variable}` placeholders in search phrases.
//!
//! A placeholder is a `{`, a name without braces, and a `}`. Surrounding
//! whitespace inside the braces is ignored, and empty names are not
//! placeholders.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchVariable {
    pub name: String,
    pub default_value: String,
    pub current_value: String,
    /// Suggested values offered for selection.
    pub options: Vec<String>,
}

impl SearchVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Current value, else default, else empty.
    pub fn effective_value(&self) -> &str {
        if !self.current_value.is_empty() {
            &self.current_value
        } else {
            &self.default_value
        }
    }
}

/// Placeholder spans and names in order of appearance.
fn placeholders(query: &str) -> Vec<(Range<usize>, &str)> {
    let mut found = Vec::new();
    let mut open: Option<usize> = None;
    for (index, ch) in query.char_indices() {
        match ch {
            '{' => open = Some(index),
            '}' => {
                if let Some(start) = open.take() {
                    let name = query[start + 1..index].trim();
                    if !name.is_empty() {
                        found.push((start..index + 1, name));
                    }
                }
            }
            _ => {}
        }
    }
    found
}

/// Variable names used in `query`, deduplicated in order of first appearance.
pub fn detect(query: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (_, name) in placeholders(query) {
        if !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// The variables of one search phrase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet {
    variables: Vec<SearchVariable>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables(variables: Vec<SearchVariable>) -> Self {
        Self { variables }
    }

    pub fn variables(&self) -> &[SearchVariable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SearchVariable> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    /// Matches the set to the names in `query`: vanished names are dropped
    /// with their values, new names start empty. Returns whether anything changed.
    pub fn reconcile(&mut self, query: &str) -> bool {
        let names = detect(query);
        let unchanged = names.len() == self.variables.len()
            && names
                .iter()
                .zip(&self.variables)
                .all(|(name, variable)| *name == variable.name);
        if unchanged {
            return false;
        }

        let mut previous = std::mem::take(&mut self.variables);
        self.variables = names
            .into_iter()
            .map(|name| {
                match previous.iter().position(|variable| variable.name == name) {
                    Some(index) => previous.swap_remove(index),
                    None => SearchVariable::new(name),
                }
            })
            .collect();
        true
    }

    /// Replaces every placeholder with its variable's effective value.
    /// Placeholders without a variable become empty.
    pub fn substitute(&self, query: &str) -> String {
        let spans = placeholders(query);
        if spans.is_empty() {
            return query.to_string();
        }
        let mut out = String::with_capacity(query.len());
        let mut cursor = 0;
        for (span, name) in spans {
            out.push_str(&query[cursor..span.start]);
            if let Some(variable) = self.get(name) {
                out.push_str(variable.effective_value());
            }
            cursor = span.end;
        }
        out.push_str(&query[cursor..]);
        out
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let variable = self
            .variables
            .iter_mut()
            .find(|variable| variable.name == name)
            .ok_or_else(|| CatalogError::InvalidInput(format!("unknown search variable {name:?}")))?;
        variable.current_value = value.into();
        Ok(())
    }

    pub fn set_default(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let variable = self
            .variables
            .iter_mut()
            .find(|variable| variable.name == name)
            .ok_or_else(|| CatalogError::InvalidInput(format!("unknown search variable {name:?}")))?;
        variable.default_value = value.into();
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_deduplicates_in_order() {
        assert_eq!(
            detect("{style} rock {size} {style} { } {} {a{b}"),
            vec!["style", "size", "b"]
        );
        assert!(detect("no placeholders }{").is_empty());
    }

    #[test]
    fn reconcile_keeps_surviving_values() {
        let mut set = VariableSet::new();
        assert!(set.reconcile("{style} {size}"));
        set.set_value("style", "cartoon").expect("set");
        set.set_value("size", "large").expect("set");

        assert!(set.reconcile("{style} {color}"));
        let names: Vec<&str> = set.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["style", "color"]);
        assert_eq!(set.get("style").map(|v| v.current_value.as_str()), Some("cartoon"));
        assert_eq!(set.get("color").map(|v| v.current_value.as_str()), Some(""));

        assert!(!set.reconcile("{style}  {color} again"));
    }

    #[test]
    fn substitute_falls_back_to_default_then_empty() {
        let mut set = VariableSet::new();
        set.reconcile("{a} {b} {c}");
        set.set_value("a", "one").expect("set");
        set.set_default("b", "two").expect("set");
        assert_eq!(set.substitute("x{a}y { b } {c}{missing}!"), "xoney two !");
        assert!(set.set_value("zzz", "v").is_err());
    }

    #[test]
    fn json_keeps_empty_values_and_options() {
        let set = VariableSet::from_variables(vec![
            SearchVariable {
                name: "style".to_string(),
                default_value: String::new(),
                current_value: "toon".to_string(),
                options: vec!["toon".to_string(), "real".to_string()],
            },
            SearchVariable::new("empty"),
        ]);
        let restored = VariableSet::from_json(&set.to_json().expect("encode")).expect("decode");
        assert_eq!(restored, set);
        assert!(VariableSet::from_json("").expect("empty").is_empty());
    }
}
