//! Date predicates for the `updated:` expert-query field.
//!
//! ## Supported Syntax
//!
//! ### Keywords
//! - `today`, `yesterday`
//! - `thisweek`, `lastweek`, `pastweek`
//! - `thismonth`, `lastmonth`, `pastmonth`
//! - `thisyear`, `lastyear`, `pastyear`
//!
//! ### Absolute Dates
//! - `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`
//! - `DD-MM-YYYY`, `MM/DD/YYYY`, `DD.MM.YYYY`
//! - `YYYY-MM` (whole month), `YYYY` (whole year)
//!
//! ### Comparisons and Ranges
//! - `<2024-01-01`, `>=2024-01-01`, `!=2024-01-01`
//! - `2024-01-01..2024-12-31`, `..2024-12-31`, `2024-01-01..`
//!
//! Timestamps are Unix seconds; day bounds are computed in UTC so that
//! catalog timestamps compare the same on every machine.

use chrono::{Datelike, Duration, NaiveDate, Utc};

use crate::error::{CatalogError, Result};

use super::numeric::{parse_comparison, ComparisonOp};

/// A parsed date predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct DatePredicate {
    kind: DatePredicateKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatePredicateKind {
    /// Inclusive bounds, either side optional.
    Range {
        start: Option<i64>,
        end: Option<i64>,
    },
    /// Outside a specific span.
    NotEqual { start: i64, end: i64 },
}

/// First and last second of a day, month, or year.
#[derive(Debug, Clone, Copy)]
struct DateSpan {
    start: i64,
    end: i64,
}

impl DatePredicate {
    /// Parses a date predicate relative to the current UTC date.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_relative_to(raw, Utc::now().date_naive())
    }

    /// Parses a date predicate with keywords resolved against `today`.
    pub fn parse_relative_to(raw: &str, today: NaiveDate) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::QueryParse(
                "date filter requires a value".to_string(),
            ));
        }

        if let Some((op, value_raw)) = parse_comparison(trimmed) {
            let span = parse_date_span(value_raw, today)?;
            return Ok(match op {
                ComparisonOp::Lt => Self::range(None, Some(span.start.saturating_sub(1))),
                ComparisonOp::Lte => Self::range(None, Some(span.end)),
                ComparisonOp::Gt => Self::range(Some(span.end.saturating_add(1)), None),
                ComparisonOp::Gte => Self::range(Some(span.start), None),
                ComparisonOp::Eq => Self::range(Some(span.start), Some(span.end)),
                ComparisonOp::Ne => Self {
                    kind: DatePredicateKind::NotEqual {
                        start: span.start,
                        end: span.end,
                    },
                },
            });
        }

        if let Some(split) = trimmed.find("..") {
            let start_raw = trimmed[..split].trim();
            let end_raw = trimmed[split + 2..].trim();
            if start_raw.is_empty() && end_raw.is_empty() {
                return Err(CatalogError::QueryParse(
                    "date range requires at least one bound".to_string(),
                ));
            }
            let start = if start_raw.is_empty() {
                None
            } else {
                Some(parse_date_span(start_raw, today)?.start)
            };
            let end = if end_raw.is_empty() {
                None
            } else {
                Some(parse_date_span(end_raw, today)?.end)
            };
            if let (Some(start), Some(end)) = (start, end) {
                if start > end {
                    return Err(CatalogError::QueryParse(
                        "date range start must be before or equal to end".to_string(),
                    ));
                }
            }
            return Ok(Self::range(start, end));
        }

        let span = parse_date_span(trimmed, today)?;
        Ok(Self::range(Some(span.start), Some(span.end)))
    }

    fn range(start: Option<i64>, end: Option<i64>) -> Self {
        Self {
            kind: DatePredicateKind::Range { start, end },
        }
    }

    /// Checks a Unix timestamp (seconds) against this predicate.
    pub fn matches(&self, timestamp: i64) -> bool {
        match &self.kind {
            DatePredicateKind::Range { start, end } => {
                start.map_or(true, |bound| timestamp >= bound)
                    && end.map_or(true, |bound| timestamp <= bound)
            }
            DatePredicateKind::NotEqual { start, end } => timestamp < *start || timestamp > *end,
        }
    }
}

fn parse_date_span(raw: &str, today: NaiveDate) -> Result<DateSpan> {
    let trimmed = raw.trim();
    if let Some(span) = keyword_span(trimmed, today) {
        return Ok(span);
    }
    if let Some(date) = parse_absolute_date(trimmed) {
        return Ok(span_between(date, date));
    }
    if let Some(span) = parse_partial_date(trimmed) {
        return Ok(span);
    }
    Err(CatalogError::QueryParse(format!(
        "unrecognized date value: {raw:?}"
    )))
}

fn keyword_span(keyword: &str, today: NaiveDate) -> Option<DateSpan> {
    let year = today.year();
    let month = today.month();

    match keyword.to_ascii_lowercase().as_str() {
        "today" => Some(span_between(today, today)),
        "yesterday" => {
            let date = today.checked_sub_signed(Duration::days(1))?;
            Some(span_between(date, date))
        }
        "thisweek" => {
            let offset = today.weekday().num_days_from_monday() as i64;
            let start = today.checked_sub_signed(Duration::days(offset))?;
            Some(span_between(start, start.checked_add_signed(Duration::days(6))?))
        }
        "lastweek" => {
            let offset = today.weekday().num_days_from_monday() as i64 + 7;
            let start = today.checked_sub_signed(Duration::days(offset))?;
            Some(span_between(start, start.checked_add_signed(Duration::days(6))?))
        }
        "thismonth" => month_span(year, month),
        "lastmonth" => {
            if month == 1 {
                month_span(year.checked_sub(1)?, 12)
            } else {
                month_span(year, month - 1)
            }
        }
        "thisyear" => year_span(year),
        "lastyear" => year_span(year.checked_sub(1)?),
        "pastweek" => trailing_span(today, 7),
        "pastmonth" => trailing_span(today, 30),
        "pastyear" => trailing_span(today, 365),
        _ => None,
    }
}

fn span_between(first: NaiveDate, last: NaiveDate) -> DateSpan {
    let start = first
        .and_hms_opt(0, 0, 0)
        .map(|moment| moment.and_utc().timestamp())
        .unwrap_or(i64::MIN);
    let end = last
        .and_hms_opt(23, 59, 59)
        .map(|moment| moment.and_utc().timestamp())
        .unwrap_or(i64::MAX);
    DateSpan { start, end }
}

fn month_span(year: i32, month: u32) -> Option<DateSpan> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some(span_between(first, last))
}

fn year_span(year: i32) -> Option<DateSpan> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some(span_between(first, last))
}

fn trailing_span(today: NaiveDate, days: i64) -> Option<DateSpan> {
    let start = today.checked_sub_signed(Duration::days(days - 1))?;
    Some(span_between(start, today))
}

fn parse_absolute_date(raw: &str) -> Option<NaiveDate> {
    let separator = raw.chars().find(|ch| matches!(ch, '-' | '/' | '.'))?;
    let year_first = raw.len() >= 4 && raw[..4].chars().all(|ch| ch.is_ascii_digit());

    let formats: &[&str] = match (separator, year_first) {
        ('-', true) => &["%Y-%m-%d"],
        ('-', false) => &["%d-%m-%Y", "%m-%d-%Y"],
        ('/', true) => &["%Y/%m/%d"],
        ('/', false) => &["%m/%d/%Y", "%d/%m/%Y"],
        ('.', true) => &["%Y.%m.%d"],
        ('.', false) => &["%d.%m.%Y", "%m.%d.%Y"],
        _ => &[],
    };

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// `YYYY` or `YYYY-MM`.
fn parse_partial_date(raw: &str) -> Option<DateSpan> {
    let mut parts = raw.splitn(2, ['-', '/', '.']);
    let year_raw = parts.next()?;
    if year_raw.len() != 4 || !year_raw.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_raw.parse().ok()?;
    match parts.next() {
        None => year_span(year),
        Some(month_raw) => {
            let month: u32 = month_raw.parse().ok()?;
            month_span(year, month)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(year: i32, month: u32, day: u32, hour: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .map(|moment| moment.and_utc().timestamp())
            .expect("valid date")
    }

    fn fixed_today() -> NaiveDate {
        // A Wednesday.
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
    }

    fn parse(raw: &str) -> DatePredicate {
        DatePredicate::parse_relative_to(raw, fixed_today()).expect("parse")
    }

    #[test]
    fn absolute_day_matches_whole_day() {
        let predicate = parse("2024-06-15");
        assert!(predicate.matches(ts(2024, 6, 15, 0)));
        assert!(predicate.matches(ts(2024, 6, 15, 23)));
        assert!(!predicate.matches(ts(2024, 6, 16, 0)));
        assert!(parse("2024/06/15").matches(ts(2024, 6, 15, 12)));
    }

    #[test]
    fn comparisons_use_day_bounds() {
        let after = parse(">2024-01-01");
        assert!(after.matches(ts(2024, 1, 2, 0)));
        assert!(!after.matches(ts(2024, 1, 1, 18)));

        let before = parse("<2024-01-01");
        assert!(before.matches(ts(2023, 12, 31, 23)));
        assert!(!before.matches(ts(2024, 1, 1, 0)));

        let not_equal = parse("!=2024-06-15");
        assert!(not_equal.matches(ts(2024, 6, 14, 12)));
        assert!(!not_equal.matches(ts(2024, 6, 15, 12)));
    }

    #[test]
    fn ranges_and_open_ranges() {
        let range = parse("2024-01-01..2024-12-31");
        assert!(range.matches(ts(2024, 6, 15, 12)));
        assert!(!range.matches(ts(2023, 6, 15, 12)));

        assert!(parse("..2024-06-30").matches(ts(2020, 1, 1, 0)));
        assert!(parse("2024-06-01..").matches(ts(2030, 1, 1, 0)));
    }

    #[test]
    fn keywords_resolve_against_today() {
        assert!(parse("today").matches(ts(2024, 6, 12, 9)));
        assert!(parse("yesterday").matches(ts(2024, 6, 11, 9)));
        assert!(parse("thisweek").matches(ts(2024, 6, 10, 0)));
        assert!(!parse("thisweek").matches(ts(2024, 6, 9, 23)));
        assert!(parse("lastmonth").matches(ts(2024, 5, 31, 12)));
        assert!(parse("pastweek").matches(ts(2024, 6, 6, 1)));
        assert!(!parse("pastweek").matches(ts(2024, 6, 5, 1)));
    }

    #[test]
    fn partial_dates_cover_month_and_year() {
        assert!(parse("2024-02").matches(ts(2024, 2, 29, 12)));
        assert!(!parse("2024-02").matches(ts(2024, 3, 1, 0)));
        assert!(parse(">=2023").matches(ts(2023, 1, 1, 0)));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(DatePredicate::parse("").is_err());
        assert!(DatePredicate::parse("notadate").is_err());
        assert!(DatePredicate::parse("2024-12-31..2024-01-01").is_err());
    }
}
