//! Phone number validation, normalization, and display formatting.
//!
//! Only ASCII digits count. Everything else (spaces, dashes, parentheses, a
//! leading `+`) is noise and is discarded.

use crate::errors::PhoneValidationError;
use quick_evac_shared::mask_phone;
use serde::Serialize;
use std::fmt;

/// Minimum number of digits for a number to be accepted.
pub const MIN_PHONE_DIGITS: usize = 10;

const LOCAL_DIGITS: usize = 10;

/// Strip every non-digit character. No truncation or padding.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Returns true when the raw input contains at least ten digits.
pub fn is_valid(raw: &str) -> bool {
    raw.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

/// Render digits for display.
///
/// - exactly 10 digits: `(AAA) BBB-CCCC`
/// - more than 10: `+<prefix> (AAA) BBB-CCCC`, the last ten digits are local
/// - otherwise the digits are returned unchanged
///
/// Non-digits are stripped first, so formatting an already formatted number
/// yields the same output.
///
/// ```
/// use quick_evac_domain::phone::format;
///
/// assert_eq!(format("5551234567"), "(555) 123-4567");
/// assert_eq!(format("15551234567"), "+1 (555) 123-4567");
/// assert_eq!(format("+1 (555) 123-4567"), "+1 (555) 123-4567");
/// assert_eq!(format("12345"), "12345");
/// ```
pub fn format(normalized: &str) -> String {
    let digits = normalize(normalized);
    match digits.len() {
        LOCAL_DIGITS => format_local(&digits),
        len if len > LOCAL_DIGITS => {
            let (prefix, local) = digits.split_at(len - LOCAL_DIGITS);
            format!("+{prefix} {}", format_local(local))
        },
        _ => digits,
    }
}

fn format_local(local: &str) -> String {
    let (area, rest) = local.split_at(3);
    let (exchange, line) = rest.split_at(3);
    format!("({area}) {exchange}-{line}")
}

/// E.164 rendering used when the number is handed to SMS-capable services.
///
/// Ten-digit numbers are assumed to be North American and get `+1`.
pub fn to_e164(normalized: &str) -> String {
    let digits = normalize(normalized);
    if digits.len() == LOCAL_DIGITS {
        format!("+1{digits}")
    } else {
        format!("+{digits}")
    }
}

/// A phone number that has been normalized and validated.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedPhoneNumber(Box<str>);

impl NormalizedPhoneNumber {
    /// Normalize raw input and reject it when fewer than ten digits remain.
    pub fn parse(raw: &str) -> Result<Self, PhoneValidationError> {
        let digits = normalize(raw);
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(PhoneValidationError {
                digit_count: digits.len(),
            });
        }
        Ok(Self(digits.into_boxed_str()))
    }

    /// The digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form, see [`format`].
    pub fn formatted(&self) -> String {
        format(&self.0)
    }

    /// E.164 form, see [`to_e164`].
    pub fn e164(&self) -> String {
        to_e164(&self.0)
    }

    /// All but the last four digits masked, for logs.
    pub fn masked(&self) -> String {
        mask_phone(&self.0)
    }
}

impl fmt::Debug for NormalizedPhoneNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("NormalizedPhoneNumber")
            .field(&self.masked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_ten_digit_input() {
        assert_eq!(format(&normalize("555-123-4567")), "(555) 123-4567");
    }

    #[test]
    fn formats_international_prefix() {
        assert_eq!(format("445551234567"), "+44 (555) 123-4567");
    }

    #[test]
    fn short_and_empty_inputs_pass_through() {
        assert_eq!(format(""), "");
        assert_eq!(format("123456789"), "123456789");
        assert!(!is_valid(""));
        assert!(!is_valid("abc"));
    }

    #[test]
    fn parse_rejects_short_numbers() {
        assert_eq!(
            NormalizedPhoneNumber::parse("555-1234"),
            Err(PhoneValidationError { digit_count: 7 })
        );
    }

    #[test]
    fn parse_accepts_punctuated_numbers() -> Result<(), PhoneValidationError> {
        let phone = NormalizedPhoneNumber::parse("(555) 123-4567")?;
        assert_eq!(phone.as_str(), "5551234567");
        assert_eq!(phone.formatted(), "(555) 123-4567");
        assert_eq!(phone.e164(), "+15551234567");
        Ok(())
    }

    #[test]
    fn debug_output_masks_digits() -> Result<(), PhoneValidationError> {
        let phone = NormalizedPhoneNumber::parse("5551234567")?;
        let rendered = format!("{phone:?}");
        assert!(rendered.contains("******4567"));
        assert!(!rendered.contains("555123"));
        Ok(())
    }

    #[test]
    fn e164_keeps_existing_country_code() {
        assert_eq!(to_e164("+44 20 7946 0958"), "+442079460958");
    }

    fn noisy_digits() -> impl Strategy<Value = (String, usize)> {
        proptest::collection::vec(
            prop_oneof![
                "[0-9]".prop_map(|d| (d, 1usize)),
                "[ ()+.\\-a-z]".prop_map(|n| (n, 0usize)),
            ],
            0..30,
        )
        .prop_map(|parts| {
            parts
                .into_iter()
                .fold((String::new(), 0), |(mut raw, count), (piece, digits)| {
                    raw.push_str(&piece);
                    (raw, count + digits)
                })
        })
    }

    proptest! {
        #[test]
        fn validity_depends_only_on_digit_count((raw, digits) in noisy_digits()) {
            prop_assert_eq!(is_valid(&raw), digits >= MIN_PHONE_DIGITS);
            prop_assert_eq!(normalize(&raw).len(), digits);
        }

        #[test]
        fn normalize_is_idempotent(raw in ".{0,40}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn formatting_is_idempotent((raw, _) in noisy_digits()) {
            let formatted = format(&normalize(&raw));
            prop_assert_eq!(format(&normalize(&formatted)), formatted.clone());
        }

        #[test]
        fn formatting_preserves_digits(digits in "[0-9]{0,16}") {
            prop_assert_eq!(normalize(&format(&digits)), digits);
        }
    }
}
