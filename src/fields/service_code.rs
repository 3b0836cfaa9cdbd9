// Three-digit service code. Digit meanings are not decoded here.

use super::{CardFieldValue, Field};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCode {
    raw: String,
}

impl ServiceCode {
    pub fn new(raw: &str) -> Self {
        ServiceCode {
            raw: raw.trim().to_string(),
        }
    }

    /// Parse from track text: blank → Unavailable, anything else → Present.
    pub fn parse(raw: &str) -> Field<Self> {
        let code = Self::new(raw);
        if code.raw.is_empty() {
            Field::Unavailable
        } else {
            Field::Present(code)
        }
    }
}

impl CardFieldValue for ServiceCode {
    fn is_valid(&self) -> bool {
        self.raw.len() == 3 && self.raw.bytes().all(|b| b.is_ascii_digit())
    }

    fn as_raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_digits_valid() {
        assert!(ServiceCode::new("101").is_valid());
        assert!(ServiceCode::new("201").is_valid());
        assert!(ServiceCode::new(" 120 ").is_valid());
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!ServiceCode::new("10").is_valid());
        assert!(!ServiceCode::new("1011").is_valid());
        assert!(!ServiceCode::new("1a1").is_valid());
    }
}
