//! Text and wildcard matching utilities.
//!
//! Patterns are expected to be lowercased already; candidates are lowercased
//! here before comparison.

use std::borrow::Cow;

use memchr::memmem;

/// Lowercases `value`, borrowing when it contains no uppercase characters.
pub fn fold_case(value: &str) -> Cow<'_, str> {
    if value.chars().any(char::is_uppercase) {
        Cow::Owned(value.to_lowercase())
    } else {
        Cow::Borrowed(value)
    }
}

/// Case-insensitive substring test. `needle` must already be lowercase.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = fold_case(haystack);
    memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

/// Whether a pattern contains `*` or `?` wildcards.
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Matches a lowercase pattern against a candidate.
///
/// Wildcard patterns must match the whole candidate; plain patterns match
/// anywhere as a substring.
pub fn text_matches(pattern: &str, candidate: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    text_matches_folded(pattern, fold_case(candidate).as_ref())
}

/// Like `text_matches`, for a candidate that is already lowercase.
pub fn text_matches_folded(pattern: &str, folded_candidate: &str) -> bool {
    if has_wildcards(pattern) {
        return wildcard_matches(pattern, folded_candidate);
    }
    memmem::find(folded_candidate.as_bytes(), pattern.as_bytes()).is_some()
}

// ---------------------------------------------------------------------------
// Wildcard matching
// ---------------------------------------------------------------------------

/// Matches a pattern with wildcards (* and ?) against a candidate string.
pub fn wildcard_matches(pattern: &str, candidate: &str) -> bool {
    let pattern_chars = pattern.chars().collect::<Vec<_>>();
    let candidate_chars = candidate.chars().collect::<Vec<_>>();

    let mut pattern_index = 0usize;
    let mut candidate_index = 0usize;
    let mut star_index: Option<usize> = None;
    let mut star_candidate_index = 0usize;

    while candidate_index < candidate_chars.len() {
        if pattern_index < pattern_chars.len()
            && (pattern_chars[pattern_index] == '?'
                || pattern_chars[pattern_index] == candidate_chars[candidate_index])
        {
            pattern_index += 1;
            candidate_index += 1;
            continue;
        }

        if pattern_index < pattern_chars.len() && pattern_chars[pattern_index] == '*' {
            star_index = Some(pattern_index);
            pattern_index += 1;
            star_candidate_index = candidate_index;
            continue;
        }

        if let Some(last_star_index) = star_index {
            pattern_index = last_star_index + 1;
            star_candidate_index += 1;
            candidate_index = star_candidate_index;
            continue;
        }

        return false;
    }

    while pattern_index < pattern_chars.len() && pattern_chars[pattern_index] == '*' {
        pattern_index += 1;
    }

    pattern_index == pattern_chars.len()
}
