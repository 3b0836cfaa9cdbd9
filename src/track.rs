// 💳 Track Records - What one magnetic track says about a card
//
// ISO/IEC 7813 cards repeat the same financial fields on several tracks.
// Any track can be damaged, truncated or absent, so each decoded track is an
// independent, immutable snapshot that must be checked against its siblings
// before the data is trusted.
//
// Track1 / Track2 / Track3 = TrackData (raw text) + BankCardTrackData (fields),
// all implementing the BankCardTrack trait.

use crate::equality::combine_hash_codes;
use crate::fields::{AccountNumber, CardField, ExpirationDate, Field, ServiceCode};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// ============================================================================
// TRACK KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackKind {
    Track1,
    Track2,
    Track3,
}

impl TrackKind {
    pub fn number(&self) -> u8 {
        match self {
            TrackKind::Track1 => 1,
            TrackKind::Track2 => 2,
            TrackKind::Track3 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Track1 => "Track 1",
            TrackKind::Track2 => "Track 2",
            TrackKind::Track3 => "Track 3",
        }
    }

    /// Whether this track format encodes the field at all
    pub fn carries(&self, field: CardField) -> bool {
        match self {
            TrackKind::Track1 | TrackKind::Track2 => true,
            TrackKind::Track3 => field == CardField::AccountNumber,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TRACK DATA (raw capture)
// ============================================================================

/// Raw captured track text plus any discretionary remainder.
///
/// Kept for diagnostics only; never part of equality.
#[derive(Debug, Clone, Default)]
pub struct TrackData {
    raw: String,
    discretionary_data: Option<String>,
}

impl TrackData {
    pub fn new(raw: impl Into<String>, discretionary_data: Option<String>) -> Self {
        TrackData {
            raw: raw.into(),
            discretionary_data: discretionary_data.filter(|data| !data.is_empty()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn discretionary_data(&self) -> Option<&str> {
        self.discretionary_data.as_deref()
    }

    pub fn has_discretionary_data(&self) -> bool {
        self.discretionary_data.is_some()
    }
}

// ============================================================================
// CONSISTENCY MODE / CHECK
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// Fields available on both sides must agree; one-sided fields are ignored
    #[default]
    Lenient,

    /// Every field must be available on both sides and agree
    Strict,
}

/// Outcome of comparing two track records field by field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub mode: ConsistencyMode,

    /// Available on both sides with different values
    pub conflicts: Vec<CardField>,

    /// Not available on both sides (only recorded in strict mode)
    pub unverified: Vec<CardField>,
}

impl ConsistencyCheck {
    fn agreed(mode: ConsistencyMode) -> Self {
        ConsistencyCheck {
            mode,
            conflicts: Vec::new(),
            unverified: Vec::new(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.conflicts.is_empty() && self.unverified.is_empty()
    }
}

// ============================================================================
// BANK CARD TRACK DATA (the three fields)
// ============================================================================

/// Account number, expiration date and service code as read from one track.
///
/// Any subset of the fields may be unavailable, including all three.
#[derive(Debug, Clone, Default)]
pub struct BankCardTrackData {
    account_number: Field<AccountNumber>,
    expiration_date: Field<ExpirationDate>,
    service_code: Field<ServiceCode>,
}

impl BankCardTrackData {
    pub fn new(
        account_number: Field<AccountNumber>,
        expiration_date: Field<ExpirationDate>,
        service_code: Field<ServiceCode>,
    ) -> Self {
        BankCardTrackData {
            account_number,
            expiration_date,
            service_code,
        }
    }

    pub fn account_number(&self) -> &Field<AccountNumber> {
        &self.account_number
    }

    pub fn expiration_date(&self) -> &Field<ExpirationDate> {
        &self.expiration_date
    }

    pub fn service_code(&self) -> &Field<ServiceCode> {
        &self.service_code
    }

    pub fn has_account_number(&self) -> bool {
        self.account_number.has_value()
    }

    pub fn has_expiration_date(&self) -> bool {
        self.expiration_date.has_value()
    }

    pub fn has_service_code(&self) -> bool {
        self.service_code.has_value()
    }

    pub fn has_field(&self, field: CardField) -> bool {
        match field {
            CardField::AccountNumber => self.has_account_number(),
            CardField::ExpirationDate => self.has_expiration_date(),
            CardField::ServiceCode => self.has_service_code(),
        }
    }

    /// Structural equality of a single field (validity not consulted)
    pub fn field_equals(&self, other: &Self, field: CardField) -> bool {
        match field {
            CardField::AccountNumber => self.account_number == other.account_number,
            CardField::ExpirationDate => self.expiration_date == other.expiration_date,
            CardField::ServiceCode => self.service_code == other.service_code,
        }
    }

    /// True if no field carries a valid value
    pub fn is_blank(&self) -> bool {
        CardField::ALL.iter().all(|field| !self.has_field(*field))
    }

    /// Compare field by field.
    ///
    /// A field is only compared when both records have it available. In
    /// lenient mode a one-sided field imposes no constraint; in strict mode
    /// it is recorded as unverified. Comparing a record with itself is
    /// always consistent, without looking at the fields.
    pub fn check_consistency(&self, other: &Self, mode: ConsistencyMode) -> ConsistencyCheck {
        self.check_consistency_over(other, mode, &CardField::ALL)
    }

    /// Like `check_consistency`, but strict mode only reports fields in
    /// `verifiable` as unverified. Conflicts are checked on every field.
    pub fn check_consistency_over(
        &self,
        other: &Self,
        mode: ConsistencyMode,
        verifiable: &[CardField],
    ) -> ConsistencyCheck {
        let mut check = ConsistencyCheck::agreed(mode);
        if std::ptr::eq(self, other) {
            return check;
        }

        for field in CardField::ALL {
            if self.has_field(field) && other.has_field(field) {
                if !self.field_equals(other, field) {
                    check.conflicts.push(field);
                }
            } else if mode == ConsistencyMode::Strict && verifiable.contains(&field) {
                check.unverified.push(field);
            }
        }

        check
    }

    /// Verifies that the available data agrees with another track.
    ///
    /// `None` (no other track) is never consistent.
    pub fn is_consistent_with(&self, other: Option<&Self>) -> bool {
        match other {
            Some(other) => self
                .check_consistency(other, ConsistencyMode::Lenient)
                .is_consistent(),
            None => false,
        }
    }

    /// Stable hash code over (expiration date, account number, service code),
    /// in that order: `31 * (31 * (31 + exp) + pan) + svc`.
    pub fn hash_code(&self) -> u32 {
        combine_hash_codes(&[
            self.expiration_date.hash_code(),
            self.account_number.hash_code(),
            self.service_code.hash_code(),
        ])
    }
}

impl PartialEq for BankCardTrackData {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.expiration_date == other.expiration_date
                && self.account_number == other.account_number
                && self.service_code == other.service_code)
    }
}

impl Eq for BankCardTrackData {}

impl Hash for BankCardTrackData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

// ============================================================================
// BANK CARD TRACK (shared capability set)
// ============================================================================

/// Capabilities shared by every track that carries bank card fields
pub trait BankCardTrack {
    fn kind(&self) -> TrackKind;

    fn track_data(&self) -> &TrackData;

    fn card_data(&self) -> &BankCardTrackData;

    fn raw_data(&self) -> &str {
        self.track_data().raw()
    }

    fn discretionary_data(&self) -> Option<&str> {
        self.track_data().discretionary_data()
    }

    fn account_number(&self) -> &Field<AccountNumber> {
        self.card_data().account_number()
    }

    fn expiration_date(&self) -> &Field<ExpirationDate> {
        self.card_data().expiration_date()
    }

    fn service_code(&self) -> &Field<ServiceCode> {
        self.card_data().service_code()
    }

    fn has_account_number(&self) -> bool {
        self.card_data().has_account_number()
    }

    fn has_expiration_date(&self) -> bool {
        self.card_data().has_expiration_date()
    }

    fn has_service_code(&self) -> bool {
        self.card_data().has_service_code()
    }

    fn carries(&self, field: CardField) -> bool {
        self.kind().carries(field)
    }

    /// Field-by-field check; strict mode only demands fields both track
    /// formats carry
    fn check_consistency(
        &self,
        other: &dyn BankCardTrack,
        mode: ConsistencyMode,
    ) -> ConsistencyCheck {
        let verifiable: Vec<CardField> = CardField::ALL
            .into_iter()
            .filter(|field| self.carries(*field) && other.carries(*field))
            .collect();
        self.card_data()
            .check_consistency_over(other.card_data(), mode, &verifiable)
    }

    fn is_consistent_with(&self, other: Option<&dyn BankCardTrack>) -> bool {
        self.card_data()
            .is_consistent_with(other.map(|other| other.card_data()))
    }
}

// ============================================================================
// CONCRETE TRACKS
// ============================================================================

/// Track 1 (IATA, alphanumeric): carries the cardholder name as well
#[derive(Debug, Clone)]
pub struct Track1 {
    track: TrackData,
    card: BankCardTrackData,
    format_code: char,
    name: Option<String>,
}

impl Track1 {
    pub fn new(
        track: TrackData,
        card: BankCardTrackData,
        format_code: char,
        name: Option<String>,
    ) -> Self {
        Track1 {
            track,
            card,
            format_code,
            name: name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        }
    }

    pub fn format_code(&self) -> char {
        self.format_code
    }

    /// Cardholder name, e.g. "DOE/JANE"
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Track 2 (ABA, numeric)
#[derive(Debug, Clone)]
pub struct Track2 {
    track: TrackData,
    card: BankCardTrackData,
}

impl Track2 {
    pub fn new(track: TrackData, card: BankCardTrackData) -> Self {
        Track2 { track, card }
    }
}

/// Track 3 (numeric): only the account number is decoded
#[derive(Debug, Clone)]
pub struct Track3 {
    track: TrackData,
    card: BankCardTrackData,
    format_code: String,
}

impl Track3 {
    pub fn new(
        track: TrackData,
        account_number: Field<AccountNumber>,
        format_code: String,
    ) -> Self {
        Track3 {
            track,
            card: BankCardTrackData::new(account_number, Field::Unavailable, Field::Unavailable),
            format_code,
        }
    }

    pub fn format_code(&self) -> &str {
        &self.format_code
    }
}

macro_rules! impl_bank_card_track {
    ($track:ty, $kind:expr) => {
        impl BankCardTrack for $track {
            fn kind(&self) -> TrackKind {
                $kind
            }

            fn track_data(&self) -> &TrackData {
                &self.track
            }

            fn card_data(&self) -> &BankCardTrackData {
                &self.card
            }
        }

        // Equality and hashing cover the card fields only, never raw text
        impl PartialEq for $track {
            fn eq(&self, other: &Self) -> bool {
                self.card == other.card
            }
        }

        impl Eq for $track {}

        impl Hash for $track {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.card.hash(state);
            }
        }
    };
}

impl_bank_card_track!(Track1, TrackKind::Track1);
impl_bank_card_track!(Track2, TrackKind::Track2);
impl_bank_card_track!(Track3, TrackKind::Track3);

// ============================================================================
// TESTS
// ============================================================================
