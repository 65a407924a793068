//! Secret and PII redaction utilities.
//!
//! Phone numbers are the only personal data this client handles. They are
//! masked to the last four digits wherever they reach a log line.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Number of trailing digits left visible by [`mask_phone`].
pub const VISIBLE_PHONE_DIGITS: usize = 4;

/// Checks if a key/variable name likely refers to a secret.
///
/// ```
/// use quick_evac_shared::is_secret_key;
///
/// assert!(is_secret_key("API_KEY"));
/// assert!(is_secret_key("authorization"));
/// assert!(!is_secret_key("QEVAC_LOG_LEVEL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"]
        .iter()
        .any(|needle| key.contains(needle))
}

/// Checks if a key names a phone number field (`phone`, `phoneNumber`, `phone_number`).
pub fn is_phone_key(key: &str) -> bool {
    key.to_ascii_lowercase().starts_with("phone")
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use quick_evac_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("API_KEY", "sk-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("LOG_LEVEL", "debug"), "debug");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// Mask every digit of a phone number except the last four.
///
/// Non-digit characters are dropped. Inputs with four or fewer digits are
/// masked completely.
///
/// ```
/// use quick_evac_shared::mask_phone;
///
/// assert_eq!(mask_phone("(555) 123-4567"), "******4567");
/// assert_eq!(mask_phone("123"), "***");
/// ```
pub fn mask_phone(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= VISIBLE_PHONE_DIGITS {
        return "*".repeat(digits.len());
    }
    let hidden = digits.len() - VISIBLE_PHONE_DIGITS;
    let mut masked = "*".repeat(hidden);
    masked.extend(digits.iter().skip(hidden));
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_secret_patterns() {
        assert!(is_secret_key("API_KEY"));
        assert!(is_secret_key("refresh_token"));
        assert!(is_secret_key("CLIENT_SECRET"));
        assert!(is_secret_key("db_password"));
        assert!(is_secret_key("credentials"));
        assert!(is_secret_key("basic_auth"));
    }

    #[test]
    fn rejects_non_secret_patterns() {
        assert!(!is_secret_key("QEVAC_API_BASE_URL"));
        assert!(!is_secret_key("TIMEOUT_MS"));
        assert!(!is_secret_key("phoneNumber"));
    }

    #[test]
    fn phone_keys_match_common_spellings() {
        assert!(is_phone_key("phone"));
        assert!(is_phone_key("phoneNumber"));
        assert!(is_phone_key("phone_number"));
        assert!(!is_phone_key("zone"));
        assert!(!is_phone_key("telephoneCount"));
    }

    #[test]
    fn mask_phone_keeps_last_four_digits() {
        assert_eq!(mask_phone("15551234567"), "*******4567");
        assert_eq!(mask_phone("+44 20 7946 0958"), "********0958");
        assert_eq!(mask_phone("4567"), "****");
        assert_eq!(mask_phone(""), "");
    }
}
