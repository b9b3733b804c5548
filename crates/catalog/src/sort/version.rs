//! Semantic-version-like version strings.
//!
//! Versions compare component-wise as numbers, so `10.0` sorts after `2.0`
//! and `2.0` equals `2.0.0`. A pre-release suffix (`1.0-beta`, `1.0b2`) sorts
//! before the plain release.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
    pre: Option<String>,
}

impl Version {
    /// Parses a version string. Returns `None` when it does not start with a number
    /// (after an optional `v` prefix).
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix(['v', 'V'])
            .unwrap_or(trimmed);
        let trimmed = match trimmed.find('+') {
            Some(build) => &trimmed[..build],
            None => trimmed,
        };

        let mut parts = Vec::new();
        let mut pre = None;
        let mut rest = trimmed;
        loop {
            let digits = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                break;
            }
            parts.push(rest[..digits].parse::<u64>().ok()?);
            rest = &rest[digits..];
            match rest.strip_prefix('.') {
                Some(next) if next.starts_with(|ch: char| ch.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }
        if parts.is_empty() {
            return None;
        }

        let suffix = rest.trim_start_matches(['-', '.', '_']);
        if !suffix.is_empty() {
            pre = Some(suffix.to_ascii_lowercase());
        }
        Some(Self { parts, pre })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.parts.len().max(other.parts.len());
        for index in 0..width {
            let left = self.parts.get(index).copied().unwrap_or(0);
            let right = other.parts.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(left), Some(right)) => compare_prerelease(left, right),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Compares dot-separated pre-release identifiers, numerically where both are numbers.
fn compare_prerelease(left: &str, right: &str) -> Ordering {
    let mut left_ids = left.split('.');
    let mut right_ids = right.split('.');
    loop {
        match (left_ids.next(), right_ids.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(a), Ok(b)) => a.cmp(&b),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).expect("version")
    }

    #[test]
    fn numeric_components_compare_as_numbers() {
        assert!(v("10.0") > v("2.0"));
        assert!(v("1.10.0") > v("1.9.5"));
        assert_eq!(v("2.0"), v("2.0.0"));
        assert_eq!(v("v3.1"), v("3.1"));
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert!(v("1.0-beta") < v("1.0"));
        assert!(v("1.0b2") < v("1.0"));
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("1.0-rc.2") < v("1.0-rc.10"));
        assert!(v("1.0-beta") > v("0.9"));
        assert!(v("1.0.0-rc1") < v("1.0.0"));
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert_eq!(v("1.2.3+build.7"), v("1.2.3"));
    }

    #[test]
    fn non_numeric_versions_do_not_parse() {
        assert!(Version::parse("").is_none());
        assert!(Version::parse("latest").is_none());
    }
}
