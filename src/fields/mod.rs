// Card Fields - Field-presence values for the three financial fields
//
// Each field read from a track is in one of three states:
// - Unavailable: the track did not carry it (or it was blank)
// - Present but invalid: decoded, but fails its own well-formedness rule
// - Present and valid: usable for comparison and reporting
//
// Structural equality looks at the wrapped value only. Validity is a
// separate property, consulted by the consistency check.

pub mod account_number;
pub mod expiration_date;
pub mod service_code;

pub use account_number::AccountNumber;
pub use expiration_date::ExpirationDate;
pub use service_code::ServiceCode;

use crate::equality::{optional_equals, optional_hash_code, string_hash_code};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// ============================================================================
// FIELD VALUE CONTRACT
// ============================================================================

/// A decoded card field value (account number, expiration date, service code)
pub trait CardFieldValue: PartialEq {
    /// Whether the value passes its own well-formedness rule
    fn is_valid(&self) -> bool;

    /// Normalized representation used for equality and hashing
    fn as_raw(&self) -> &str;

    /// Stable hash code, consistent with `PartialEq`
    fn hash_code(&self) -> u32 {
        string_hash_code(self.as_raw())
    }
}

// ============================================================================
// FIELD (tagged presence)
// ============================================================================

#[derive(Debug, Clone)]
pub enum Field<T> {
    /// Not carried by the track
    Unavailable,

    /// Decoded from the track; may still be invalid
    Present(T),
}

impl<T: CardFieldValue> Field<T> {
    /// True iff present AND valid
    pub fn has_value(&self) -> bool {
        matches!(self, Field::Present(value) if value.is_valid())
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    /// Wrapped value, whether valid or not
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Unavailable => None,
        }
    }

    /// Wrapped value only when it is valid
    pub fn valid_value(&self) -> Option<&T> {
        self.value().filter(|value| value.is_valid())
    }

    /// Stable hash code; `Unavailable` contributes 0
    pub fn hash_code(&self) -> u32 {
        optional_hash_code(self.value(), T::hash_code)
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unavailable
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Unavailable,
        }
    }
}

impl<T: CardFieldValue> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        optional_equals(self.value(), other.value())
    }
}

impl<T: CardFieldValue> Eq for Field<T> {}

impl<T: CardFieldValue> Hash for Field<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

// ============================================================================
// CARD FIELD (dimension names)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardField {
    AccountNumber,
    ExpirationDate,
    ServiceCode,
}

impl CardField {
    /// All dimensions, in consistency-check order
    pub const ALL: [CardField; 3] = [
        CardField::AccountNumber,
        CardField::ExpirationDate,
        CardField::ServiceCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::AccountNumber => "account number",
            CardField::ExpirationDate => "expiration date",
            CardField::ServiceCode => "service code",
        }
    }
}

impl std::fmt::Display for CardField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
