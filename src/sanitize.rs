//! Input cleaning and validation for untrusted form fields.
//!
//! Every function is pure. Validators return `Option<String>` — `Some` with
//! the normalized value, `None` when the input is invalid — so callers never
//! have to guess whether an empty string means "absent" or "rejected".

use std::sync::LazyLock;

use regex::Regex;

const MAX_TEXT_LEN: usize = 1000;
const MAX_NAME_LEN: usize = 100;

// These patterns are compile-time constants; construction cannot fail.
#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
#[allow(clippy::expect_used)]
static CERTIFICATE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}-[0-9]{4}-[0-9]{3}$").expect("valid certificate regex"));
#[allow(clippy::expect_used)]
static JS_PROTOCOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid protocol regex"));
#[allow(clippy::expect_used)]
static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("valid handler regex"));

/// Strip markup-significant characters and script-injection patterns from
/// free-form text, capped at 1000 chars.
pub fn clean_text(input: &str) -> String {
    let without_angles: String = input.trim().chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_protocol = JS_PROTOCOL_RE.replace_all(&without_angles, "");
    let without_handlers = EVENT_HANDLER_RE.replace_all(&without_protocol, "");
    without_handlers.chars().take(MAX_TEXT_LEN).collect()
}

/// Normalize an email address to lowercase; `None` when it does not look
/// like `local@domain.tld`.
pub fn clean_email(input: &str) -> Option<String> {
    let cleaned = input.trim().to_lowercase();
    EMAIL_RE.is_match(&cleaned).then_some(cleaned)
}

/// Keep only digits and common phone punctuation; `None` unless at least
/// ten digits remain.
pub fn clean_phone(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '+' | '-' | '(' | ')' | ' '))
        .collect();
    let digit_count = cleaned.chars().filter(char::is_ascii_digit).count();
    (digit_count >= 10).then_some(cleaned)
}

/// Normalize a certificate ID to uppercase; `None` unless it matches the
/// issued format `XXX-YYYY-NNN` (3 letters, 4 digits, 3 digits).
pub fn clean_certificate_id(input: &str) -> Option<String> {
    let cleaned = input.trim().to_uppercase();
    CERTIFICATE_ID_RE.is_match(&cleaned).then_some(cleaned)
}

/// Keep only letters, spaces, hyphens, and apostrophes, capped at 100 chars.
pub fn clean_name(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(*c, '-' | '\''))
        .take(MAX_NAME_LEN)
        .collect()
}

/// Names of the given fields whose values trim to empty.
///
/// Handlers reject the request with a 400 naming the first missing field.
pub fn missing_fields(fields: &[(&str, &str)]) -> Vec<String> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| (*name).to_string())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ── clean_text ──────────────────────────────────────────────────────

    #[test]
    fn clean_text_strips_angle_brackets() {
        assert_eq!(clean_text("<script>alert(1)</script>"), "scriptalert(1)/script");
    }

    #[test]
    fn clean_text_strips_javascript_protocol() {
        assert_eq!(clean_text("JavaScript:doEvil()"), "doEvil()");
    }

    #[test]
    fn clean_text_strips_event_handlers() {
        assert_eq!(clean_text("x onclick=steal() y"), "x steal() y");
    }

    #[test]
    fn clean_text_trims_and_caps_length() {
        let long = "a".repeat(2000);
        assert_eq!(clean_text(&long).len(), 1000);
        assert_eq!(clean_text("  hello  "), "hello");
    }

    // ── clean_email ─────────────────────────────────────────────────────

    #[test]
    fn clean_email_lowercases_valid_address() {
        assert_eq!(
            clean_email("  John.Doe@Example.COM "),
            Some("john.doe@example.com".to_string())
        );
    }

    #[test]
    fn clean_email_rejects_malformed_addresses() {
        assert_eq!(clean_email("not-an-email"), None);
        assert_eq!(clean_email("missing@tld"), None);
        assert_eq!(clean_email("two words@example.com"), None);
        assert_eq!(clean_email(""), None);
    }

    // ── clean_phone ─────────────────────────────────────────────────────

    #[test]
    fn clean_phone_keeps_punctuation_and_digits() {
        assert_eq!(
            clean_phone("+1 (555) 123-4567"),
            Some("+1 (555) 123-4567".to_string())
        );
    }

    #[test]
    fn clean_phone_strips_letters() {
        assert_eq!(clean_phone("call 5551234567 now"), Some(" 5551234567 ".to_string()));
    }

    #[test]
    fn clean_phone_requires_ten_digits() {
        assert_eq!(clean_phone("555-1234"), None);
        assert_eq!(clean_phone(""), None);
    }

    // ── clean_certificate_id ────────────────────────────────────────────

    #[test]
    fn valid_certificate_ids_are_uppercased_unchanged() {
        assert_eq!(
            clean_certificate_id("pvi-2024-001"),
            Some("PVI-2024-001".to_string())
        );
        assert_eq!(
            clean_certificate_id(" PVI-2024-001 "),
            Some("PVI-2024-001".to_string())
        );
        assert_eq!(
            clean_certificate_id("ABC-1999-999"),
            Some("ABC-1999-999".to_string())
        );
    }

    #[test]
    fn malformed_certificate_ids_are_rejected() {
        for bad in [
            "",
            "PVI-2024",
            "PV-2024-001",
            "PVI-24-001",
            "PVI-2024-1",
            "PVI-2024-0011",
            "1VI-2024-001",
            "PVI_2024_001",
            "PVI-2024-001 extra",
        ] {
            assert_eq!(clean_certificate_id(bad), None, "should reject {bad:?}");
        }
    }

    // ── clean_name ──────────────────────────────────────────────────────

    #[test]
    fn clean_name_keeps_letters_spaces_hyphens_apostrophes() {
        assert_eq!(clean_name("Mary-Jane O'Brien"), "Mary-Jane O'Brien");
    }

    #[test]
    fn clean_name_drops_digits_and_symbols() {
        assert_eq!(clean_name("R2-D2 <admin>"), "R-D admin");
    }

    #[test]
    fn clean_name_caps_length() {
        let long = "a".repeat(500);
        assert_eq!(clean_name(&long).len(), 100);
    }

    // ── missing_fields ──────────────────────────────────────────────────

    #[test]
    fn missing_fields_reports_empty_and_whitespace_values() {
        let missing = missing_fields(&[
            ("fullName", "John"),
            ("email", ""),
            ("phone", "   "),
            ("motivation", "because"),
        ]);
        assert_eq!(missing, vec!["email".to_string(), "phone".to_string()]);
    }

    #[test]
    fn missing_fields_empty_when_all_present() {
        assert!(missing_fields(&[("a", "1"), ("b", "2")]).is_empty());
    }
}
