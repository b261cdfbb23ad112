//! Invoice amounts: edit-boundary validation, parsing and display formatting.
//!
//! Amounts are stored exactly as typed (digits and at most one decimal point)
//! and only turned into a [`Decimal`] when summed or displayed.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

const ZERO_DISPLAY: &str = "$0.00";

/// Whether `value` is acceptable raw amount input.
///
/// Accepts the empty string (a cleared field) and partial input such as `"12."`
/// or `"."` so the user can type a decimal number one keystroke at a time.
pub fn is_valid_amount_input(value: &str) -> bool {
    static AMOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = AMOUNT_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9]*\.?[0-9]*$").expect("amount pattern is valid")
    });
    regex.is_match(value)
}

/// Parse a raw (or `$`/`,`-decorated) amount into a decimal.
///
/// Returns `None` for blank input, a lone `"."` and anything that is not a
/// number that fits in a [`Decimal`].
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();

    let mut numeric = cleaned.as_str();
    if let Some(stripped) = numeric.strip_suffix('.') {
        numeric = stripped;
    }
    if numeric.is_empty() {
        return None;
    }

    let value = if numeric.starts_with('.') {
        Decimal::from_str(&format!("0{numeric}"))
    } else {
        Decimal::from_str(numeric)
    };
    value.ok()
}

/// Render a raw amount for display, e.g. `"1234.5"` → `"$1,234.50"`.
///
/// Rules, carried over unchanged from the intake screen:
/// - blank, `"."` or unparsable input renders as `$0.00`;
/// - values below 1,000 always end in `.00`, whatever their fraction;
/// - values of 1,000 or more with a non-zero fraction show its first two
///   digits (truncated, not rounded);
/// - whole values of 1,000 or more end in `.00`, except exactly 1,000 and
///   anything from 1,000,000 up, which show no fraction at all.
pub fn format_amount(raw: &str) -> String {
    let numeric: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    if numeric.is_empty() || numeric == "." {
        return ZERO_DISPLAY.to_string();
    }

    let Some(value) = parse_amount(&numeric) else {
        return ZERO_DISPLAY.to_string();
    };

    let (integer_part, fraction_part) = match numeric.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (numeric.as_str(), ""),
    };
    let integer_part = if integer_part.is_empty() { "0" } else { integer_part };
    let is_whole = fraction_part.chars().all(|c| c == '0');

    let thousand = Decimal::from(1_000);
    let million = Decimal::from(1_000_000);

    let fraction = if value < thousand {
        ".00".to_string()
    } else if !is_whole {
        let mut digits: String = fraction_part.chars().take(2).collect();
        while digits.len() < 2 {
            digits.push('0');
        }
        format!(".{digits}")
    } else {
        let whole = value.trunc();
        if whole == thousand || whole >= million {
            String::new()
        } else {
            ".00".to_string()
        }
    };

    format!("${}{}", group_thousands(integer_part), fraction)
}

/// Format a computed decimal (e.g. a total) with the same display rules.
pub fn format_decimal(value: Decimal) -> String {
    format_amount(&value.normalize().to_string())
}

/// Insert `,` every three digits from the right, keeping a leading sign.
pub(crate) fn group_thousands(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
