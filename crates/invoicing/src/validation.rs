//! Edit-boundary validation for the non-amount draft fields.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

/// Maximum length of draft notes, in Unicode code points.
pub const NOTES_MAX_CHARS: usize = 255;

/// Canonical stored form of a payment date.
pub const PAYMENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Digits and the usual phone punctuation: `+ - ( ) . space`.
pub fn is_valid_phone(value: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^[0-9+\-() .]*$").expect("phone pattern is valid"));
    regex.is_match(value)
}

pub fn notes_within_limit(text: &str) -> bool {
    text.chars().count() <= NOTES_MAX_CHARS
}

/// Clip notes to [`NOTES_MAX_CHARS`] code points.
pub fn truncate_notes(text: &str) -> String {
    text.chars().take(NOTES_MAX_CHARS).collect()
}

/// Normalize a payment date to `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY` and RFC 3339 timestamps. Blank input
/// normalizes to the empty string (a cleared field); anything else is `None`.
pub fn normalize_payment_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(String::new());
    }

    let date = NaiveDate::parse_from_str(value, PAYMENT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))?;

    Some(date.format(PAYMENT_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_charset() {
        for ok in ["", "913.335.9000", "+1 (913) 335-9000"] {
            assert!(is_valid_phone(ok), "{ok:?}");
        }
        for bad in ["913-CALL-NOW", "555#1", "ext:12"] {
            assert!(!is_valid_phone(bad), "{bad:?}");
        }
    }

    #[test]
    fn notes_are_clipped_by_code_points() {
        let long = "é".repeat(300);
        let clipped = truncate_notes(&long);
        assert_eq!(clipped.chars().count(), NOTES_MAX_CHARS);
        assert!(notes_within_limit(&clipped));
        assert!(!notes_within_limit(&long));
    }

    #[test]
    fn payment_dates_share_one_stored_format() {
        assert_eq!(normalize_payment_date("2025-12-22").as_deref(), Some("2025-12-22"));
        assert_eq!(normalize_payment_date("12/22/2025").as_deref(), Some("2025-12-22"));
        assert_eq!(
            normalize_payment_date("2025-12-22T11:46:00-06:00").as_deref(),
            Some("2025-12-22")
        );
        assert_eq!(normalize_payment_date("  ").as_deref(), Some(""));
        assert_eq!(normalize_payment_date("22/12/2025"), None);
        assert_eq!(normalize_payment_date("soon"), None);
    }
}
