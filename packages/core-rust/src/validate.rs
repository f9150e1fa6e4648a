//! Cross-cutting input validators.
//!
//! Pure, deterministic functions run before any downstream call is issued.
//! A validator either returns the normalized value or fails with a reason
//! that maps to the `Invalid` error kind; validation failures never reach
//! the retry policy.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ClassifiedError;

/// Maximum accepted identifier length after trimming.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Calendar date format accepted by the gateway. The analytics backend
/// itself rejects anything else, so lenient parsing here would only defer
/// the failure downstream.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z0-9._-]+$").expect("literal pattern compiles"))
}

/// Reason an input was rejected. Converts into a caller-safe
/// [`ClassifiedError`] of kind `Invalid`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} contains characters outside [A-Za-z0-9._-]")]
    Charset { field: &'static str },
    #[error("{field} is not a valid calendar date (expected YYYY-MM-DD)")]
    BadDate { field: &'static str },
    #[error("start date must not be after end date")]
    ReversedRange,
}

impl From<ValidationError> for ClassifiedError {
    fn from(err: ValidationError) -> Self {
        Self::invalid(err.to_string())
    }
}

/// A validated, normalized date range. Equal start and end is a valid
/// single-day range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// Normalized ISO start date (`YYYY-MM-DD`).
    pub start: String,
    /// Normalized ISO end date (`YYYY-MM-DD`).
    pub end: String,
}

/// Validates a cross-cutting identifier (username, record id).
///
/// Trims surrounding whitespace, then requires a non-empty value of at most
/// [`MAX_IDENTIFIER_LEN`] characters drawn from `[A-Za-z0-9._-]`. Returns
/// the trimmed value.
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first violated rule.
pub fn identifier(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if !identifier_pattern().is_match(trimmed) {
        return Err(ValidationError::Charset { field });
    }
    Ok(trimmed.to_string())
}

/// Validates a (start, end) calendar-date pair.
///
/// Both values must parse strictly as `YYYY-MM-DD` and the range must be
/// ordered (`start <= end`). Returns both dates re-rendered in normalized
/// ISO form.
///
/// # Errors
///
/// Returns [`ValidationError::BadDate`] for an unparseable value and
/// [`ValidationError::ReversedRange`] when `start > end`.
pub fn date_range(start_raw: &str, end_raw: &str) -> Result<DateRange, ValidationError> {
    let start = parse_date(start_raw, "startDate")?;
    let end = parse_date(end_raw, "endDate")?;

    if start > end {
        return Err(ValidationError::ReversedRange);
    }

    Ok(DateRange {
        start: start.format(DATE_FORMAT).to_string(),
        end: end.format(DATE_FORMAT).to_string(),
    })
}

fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::BadDate { field })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn identifier_accepts_allowed_charset() {
        assert_eq!(identifier("alice", "username").unwrap(), "alice");
        assert_eq!(identifier("a1-b2_c3.d4", "username").unwrap(), "a1-b2_c3.d4");
    }

    #[test]
    fn identifier_trims_whitespace() {
        assert_eq!(identifier("  alice \n", "username").unwrap(), "alice");
    }

    #[test]
    fn identifier_rejects_empty_and_blank() {
        assert_eq!(
            identifier("", "username").unwrap_err(),
            ValidationError::Empty { field: "username" }
        );
        assert_eq!(
            identifier("   ", "username").unwrap_err(),
            ValidationError::Empty { field: "username" }
        );
    }

    #[test]
    fn identifier_rejects_disallowed_characters() {
        for bad in ["ali ce", "alice!", "a/b", "héllo", "a\nb", "{alice}"] {
            assert_eq!(
                identifier(bad, "username").unwrap_err(),
                ValidationError::Charset { field: "username" },
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn identifier_enforces_length_bound() {
        let at_limit = "x".repeat(MAX_IDENTIFIER_LEN);
        assert_eq!(identifier(&at_limit, "id").unwrap(), at_limit);

        let over = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        assert_eq!(
            identifier(&over, "id").unwrap_err(),
            ValidationError::TooLong {
                field: "id",
                max: MAX_IDENTIFIER_LEN
            }
        );
    }

    #[test]
    fn date_range_accepts_ordered_pair() {
        let range = date_range("2024-03-01", "2024-03-10").unwrap();
        assert_eq!(range.start, "2024-03-01");
        assert_eq!(range.end, "2024-03-10");
    }

    #[test]
    fn date_range_accepts_single_day() {
        let range = date_range("2024-03-10", "2024-03-10").unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn date_range_rejects_reversed_pair() {
        assert_eq!(
            date_range("2024-03-10", "2024-03-01").unwrap_err(),
            ValidationError::ReversedRange
        );
    }

    #[test]
    fn date_range_rejects_unparseable_input() {
        assert_eq!(
            date_range("10-03-2024", "2024-03-11").unwrap_err(),
            ValidationError::BadDate { field: "startDate" }
        );
        assert_eq!(
            date_range("2024-03-10", "not-a-date").unwrap_err(),
            ValidationError::BadDate { field: "endDate" }
        );
        // Calendar-impossible dates are rejected, not wrapped.
        assert!(date_range("2024-02-30", "2024-03-01").is_err());
    }

    #[test]
    fn validation_error_maps_to_invalid_kind() {
        let classified: ClassifiedError = ValidationError::ReversedRange.into();
        assert_eq!(classified.kind, ErrorKind::Invalid);
        assert!(classified.message.contains("start date"));
    }

    proptest! {
        #[test]
        fn identifier_within_charset_round_trips(
            s in "[A-Za-z0-9._-]{1,64}"
        ) {
            prop_assert_eq!(identifier(&s, "username").unwrap(), s);
        }

        #[test]
        fn identifier_with_disallowed_char_fails(
            prefix in "[A-Za-z0-9]{0,10}",
            bad in "[^A-Za-z0-9._-]",
            suffix in "[A-Za-z0-9]{0,10}"
        ) {
            let candidate = format!("{prefix}{bad}{suffix}");
            // Whitespace is trimmed before the charset check; skip inputs
            // that normalize to a pure-alphanumeric value.
            prop_assume!(!candidate.trim().is_empty());
            prop_assume!(candidate.trim() != format!("{prefix}{suffix}"));
            prop_assert!(identifier(&candidate, "username").is_err());
        }

        #[test]
        fn ordered_ranges_validate_and_normalize(
            start_off in 0u32..20_000,
            span in 0u32..1_000
        ) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let start = base + chrono::Days::new(u64::from(start_off));
            let end = start + chrono::Days::new(u64::from(span));

            let range = date_range(
                &start.format(DATE_FORMAT).to_string(),
                &end.format(DATE_FORMAT).to_string(),
            ).unwrap();

            prop_assert_eq!(range.start, start.format(DATE_FORMAT).to_string());
            prop_assert_eq!(range.end, end.format(DATE_FORMAT).to_string());
        }

        #[test]
        fn reversed_ranges_fail(
            start_off in 1u32..20_000,
            span in 1u32..1_000
        ) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let end = base + chrono::Days::new(u64::from(start_off));
            let start = end + chrono::Days::new(u64::from(span));

            let result = date_range(
                &start.format(DATE_FORMAT).to_string(),
                &end.format(DATE_FORMAT).to_string(),
            );
            prop_assert_eq!(result.unwrap_err(), ValidationError::ReversedRange);
        }
    }
}
