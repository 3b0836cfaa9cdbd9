// Primary Account Number (PAN)
//
// Valid iff 12-19 digits and the Luhn checksum passes.
// The full number is never printed by Debug/Display; use masked().

use super::{CardFieldValue, Field};
use sha2::{Digest, Sha256};

/// Minimum PAN length (ISO/IEC 7812)
pub const MIN_PAN_LENGTH: usize = 12;

/// Maximum PAN length (ISO/IEC 7812)
pub const MAX_PAN_LENGTH: usize = 19;

#[derive(Clone, PartialEq, Eq)]
pub struct AccountNumber {
    /// Normalized number: spaces and dashes removed
    number: String,
}

impl AccountNumber {
    /// Wrap a raw account number, stripping spaces and dashes.
    pub fn new(raw: &str) -> Self {
        AccountNumber {
            number: raw
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect(),
        }
    }

    /// Parse from track text: blank → Unavailable, anything else → Present.
    pub fn parse(raw: &str) -> Field<Self> {
        let account_number = Self::new(raw);
        if account_number.number.is_empty() {
            Field::Unavailable
        } else {
            Field::Present(account_number)
        }
    }

    pub fn len(&self) -> usize {
        self.number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.number.is_empty()
    }

    fn is_all_digits(&self) -> bool {
        !self.number.is_empty() && self.number.bytes().all(|b| b.is_ascii_digit())
    }

    fn has_valid_length(&self) -> bool {
        (MIN_PAN_LENGTH..=MAX_PAN_LENGTH).contains(&self.number.len())
    }

    /// Luhn (mod 10) checksum over the digits
    pub fn passes_luhn_check(&self) -> bool {
        if !self.is_all_digits() {
            return false;
        }

        let sum: u32 = self
            .number
            .bytes()
            .rev()
            .enumerate()
            .map(|(i, b)| {
                let digit = u32::from(b - b'0');
                if i % 2 == 1 {
                    let doubled = digit * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    digit
                }
            })
            .sum();

        sum % 10 == 0
    }

    /// Last four characters of the number
    pub fn last_four(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or("")
    }

    /// Mask all but the last four characters
    ///
    /// Example: "4111111111111111" → "************1111"
    pub fn masked(&self) -> String {
        let visible = self.last_four();
        let hidden = self.number.chars().count() - visible.chars().count();
        format!("{}{}", "*".repeat(hidden), visible)
    }

    /// SHA-256 of the normalized number, hex encoded
    ///
    /// Lets logs and reports correlate cards without carrying the PAN.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.number.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl CardFieldValue for AccountNumber {
    fn is_valid(&self) -> bool {
        self.has_valid_length() && self.passes_luhn_check()
    }

    fn as_raw(&self) -> &str {
        &self.number
    }
}

impl std::fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccountNumber").field(&self.masked()).finish()
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_visa_test_number() {
        let pan = AccountNumber::new("4111111111111111");
        assert!(pan.passes_luhn_check());
        assert!(pan.is_valid());
        assert_eq!(pan.len(), 16);
    }

    #[test]
    fn test_normalizes_spaces_and_dashes() {
        let a = AccountNumber::new("4111 1111-1111 1111");
        let b = AccountNumber::new("4111111111111111");
        assert_eq!(a, b);
        assert_eq!(a.as_raw(), "4111111111111111");
    }

    #[test]
    fn test_luhn_failure_is_invalid() {
        let pan = AccountNumber::new("4111111111111112");
        assert!(!pan.passes_luhn_check());
        assert!(!pan.is_valid());
    }

    #[test]
    fn test_length_bounds() {
        // Passes Luhn but too short
        assert!(AccountNumber::new("42").passes_luhn_check());
        assert!(!AccountNumber::new("42").is_valid());

        // 20 digits is too long even if the checksum works out
        let long = AccountNumber::new("00000000000000000000");
        assert!(long.passes_luhn_check());
        assert!(!long.is_valid());
    }

    #[test]
    fn test_non_digits_are_invalid() {
        let pan = AccountNumber::new("41111111111111AB");
        assert!(!pan.passes_luhn_check());
        assert!(!pan.is_valid());
    }

    #[test]
    fn test_parse_blank_is_unavailable() {
        assert!(!AccountNumber::parse("").is_present());
        assert!(!AccountNumber::parse("   ").is_present());
        assert!(AccountNumber::parse("4000000000000002").has_value());
    }

    #[test]
    fn test_masking_never_shows_full_number() {
        let pan = AccountNumber::new("4111111111111111");
        assert_eq!(pan.masked(), "************1111");
        assert_eq!(pan.last_four(), "1111");
        assert_eq!(format!("{}", pan), "************1111");
        assert!(!format!("{:?}", pan).contains("4111111111111111"));

        assert_eq!(AccountNumber::new("123").masked(), "123");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = AccountNumber::new("4111111111111111");
        let b = AccountNumber::new("4111-1111-1111-1111");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        assert_ne!(a.fingerprint(), AccountNumber::new("4000000000000002").fingerprint());
    }
}
