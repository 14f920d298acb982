//! Contact field validation.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("Invalid email regex"));

/// `+` then a country code that does not start with 0, 8 to 15 digits total.
static INTERNATIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("Invalid phone regex"));

/// NANP number: optional leading 1, area code and exchange starting 2-9.
static US_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1?[2-9]\d{2}[2-9]\d{6}$").expect("Invalid phone regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Accepts international numbers with a `+` prefix, or US numbers without one.
///
/// Spaces, dashes, dots and parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact = normalize_phone(phone);
    if compact.starts_with('+') {
        INTERNATIONAL_RE.is_match(&compact)
    } else {
        US_RE.is_match(&compact)
    }
}

/// Strip formatting characters from a phone number.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}
