// ⚖️ Reconciliation Engine - Do all tracks of one swipe describe the same card?
//
// Every pair of present tracks (1-2, 1-3, 2-3) is checked field by field.
// A card identity is merged ONLY when no pair disagrees; each field is then
// taken from the first track (in track order) that has it available.

use crate::config::ReconcileConfig;
use crate::fields::{CardField, ExpirationDate, ServiceCode};
use crate::parser::{self, parse_track1, parse_track2, parse_track3};
use crate::track::{BankCardTrack, ConsistencyMode, Track1, Track2, Track3, TrackKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CARD SWIPE (input)
// ============================================================================

/// Zero to three tracks read from one physical swipe
#[derive(Debug, Clone, Default)]
pub struct CardSwipe {
    pub track1: Option<Track1>,
    pub track2: Option<Track2>,
    pub track3: Option<Track3>,
}

impl CardSwipe {
    pub fn new(track1: Option<Track1>, track2: Option<Track2>, track3: Option<Track3>) -> Self {
        CardSwipe {
            track1,
            track2,
            track3,
        }
    }

    /// Parse raw track text; blank text means the track was not read
    pub fn parse(track1: &str, track2: &str, track3: &str) -> parser::Result<Self> {
        Ok(CardSwipe {
            track1: parse_track1(track1)?,
            track2: parse_track2(track2)?,
            track3: parse_track3(track3)?,
        })
    }

    /// Present tracks, in track order
    pub fn tracks(&self) -> Vec<&dyn BankCardTrack> {
        let mut tracks: Vec<&dyn BankCardTrack> = Vec::with_capacity(3);
        if let Some(track) = &self.track1 {
            tracks.push(track);
        }
        if let Some(track) = &self.track2 {
            tracks.push(track);
        }
        if let Some(track) = &self.track3 {
            tracks.push(track);
        }
        tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_count() == 0
    }
}

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationResult {
    /// Every pair of tracks agrees; identity merged
    Consistent { tracks_compared: usize },

    /// At least one pair disagrees (or is unverified in strict mode)
    Inconsistent { conflicts: usize, unverified: usize },

    /// Tracks agree, but fewer were read than the config requires
    InsufficientTracks { present: usize, required: usize },

    /// No track was read at all
    NoData,
}

impl ReconciliationResult {
    pub fn is_consistent(&self) -> bool {
        matches!(self, ReconciliationResult::Consistent { .. })
    }

    pub fn has_discrepancy(&self) -> bool {
        matches!(self, ReconciliationResult::Inconsistent { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationResult::Consistent { .. } => "consistent",
            ReconciliationResult::Inconsistent { .. } => "inconsistent",
            ReconciliationResult::InsufficientTracks { .. } => "insufficient tracks",
            ReconciliationResult::NoData => "no data",
        }
    }
}

// ============================================================================
// DISCREPANCY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscrepancyKind {
    /// Available on both tracks with different values
    Conflict,

    /// Not available on both tracks (strict mode only)
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: CardField,
    pub left: TrackKind,
    pub right: TrackKind,
    pub kind: DiscrepancyKind,
    pub description: String,
}

impl Discrepancy {
    fn new(field: CardField, left: TrackKind, right: TrackKind, kind: DiscrepancyKind) -> Self {
        let description = match kind {
            DiscrepancyKind::Conflict => {
                format!("{} differs between {} and {}", field, left, right)
            }
            DiscrepancyKind::Unverified => {
                format!("{} not available on both {} and {}", field, left, right)
            }
        };
        Discrepancy {
            field,
            left,
            right,
            kind,
            description,
        }
    }
}

// ============================================================================
// CARD IDENTITY (merged view)
// ============================================================================

/// Best-known card identity merged from consistent tracks.
///
/// Carries the PAN only masked and as a SHA-256 fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardIdentity {
    pub masked_account_number: Option<String>,
    pub account_fingerprint: Option<String>,
    pub expiration_date: Option<ExpirationDate>,
    pub service_code: Option<ServiceCode>,
    pub cardholder_name: Option<String>,

    /// Which track supplied each field
    pub sources: Vec<(CardField, TrackKind)>,
}

impl CardIdentity {
    /// Merged identity of a swipe, or `None` when its tracks disagree
    /// under `mode` (or no track was read).
    pub fn from_swipe(swipe: &CardSwipe, mode: ConsistencyMode) -> Option<Self> {
        let tracks = swipe.tracks();
        let engine = ReconciliationEngine::with_mode(mode);
        if tracks.is_empty() || !engine.find_discrepancies(&tracks).is_empty() {
            return None;
        }
        let name = swipe.track1.as_ref().and_then(|track| track.name());
        Some(Self::merge(&tracks, name))
    }

    /// Take each field from the first track that has it available.
    /// Only reached after the tracks were found consistent.
    fn merge(tracks: &[&dyn BankCardTrack], cardholder_name: Option<&str>) -> Self {
        let mut identity = CardIdentity {
            masked_account_number: None,
            account_fingerprint: None,
            expiration_date: None,
            service_code: None,
            cardholder_name: cardholder_name.map(str::to_string),
            sources: Vec::new(),
        };

        if let Some(track) = tracks.iter().find(|track| track.has_account_number()) {
            if let Some(pan) = track.account_number().valid_value() {
                identity.masked_account_number = Some(pan.masked());
                identity.account_fingerprint = Some(pan.fingerprint());
                identity.sources.push((CardField::AccountNumber, track.kind()));
            }
        }

        if let Some(track) = tracks.iter().find(|track| track.has_expiration_date()) {
            identity.expiration_date = track.expiration_date().valid_value().cloned();
            identity.sources.push((CardField::ExpirationDate, track.kind()));
        }

        if let Some(track) = tracks.iter().find(|track| track.has_service_code()) {
            identity.service_code = track.service_code().valid_value().cloned();
            identity.sources.push((CardField::ServiceCode, track.kind()));
        }

        identity
    }

    pub fn has_account_number(&self) -> bool {
        self.masked_account_number.is_some()
    }

    /// True iff an expiration date is known and `as_of` is past it
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiration_date
            .as_ref()
            .is_some_and(|date| date.is_expired(as_of))
    }

    pub fn source_of(&self, field: CardField) -> Option<TrackKind> {
        self.sources
            .iter()
            .find(|(source_field, _)| *source_field == field)
            .map(|(_, track)| *track)
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: String,
    pub mode: ConsistencyMode,
    pub tracks_present: Vec<TrackKind>,
    pub result: ReconciliationResult,
    pub discrepancies: Vec<Discrepancy>,
    pub identity: Option<CardIdentity>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.result.is_consistent()
    }

    pub fn summary(&self) -> String {
        let tracks = self
            .tracks_present
            .iter()
            .map(|track| track.number().to_string())
            .collect::<Vec<_>>()
            .join(",");

        let card = self
            .identity
            .as_ref()
            .and_then(|identity| identity.masked_account_number.as_deref())
            .unwrap_or("-");

        format!(
            "Swipe {}: {} (tracks [{}], {} discrepancies, card {})",
            self.id,
            self.result.as_str(),
            tracks,
            self.discrepancies.len(),
            card
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Field comparison mode (default: lenient)
    pub mode: ConsistencyMode,

    /// Tracks required before an identity is merged (default: 1)
    pub min_tracks: usize,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            mode: ConsistencyMode::Lenient,
            min_tracks: 1,
        }
    }

    pub fn strict() -> Self {
        Self::with_mode(ConsistencyMode::Strict)
    }

    pub fn with_mode(mode: ConsistencyMode) -> Self {
        ReconciliationEngine {
            mode,
            min_tracks: 1,
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        ReconciliationEngine {
            mode: config.mode,
            min_tracks: config.min_tracks,
        }
    }

    /// Check every pair of present tracks and merge when they agree
    pub fn reconcile(&self, swipe: &CardSwipe) -> ReconciliationReport {
        self.reconcile_with_id(uuid::Uuid::new_v4().to_string(), swipe)
    }

    /// Same as `reconcile`, under a caller-supplied swipe id
    pub fn reconcile_with_id(&self, id: String, swipe: &CardSwipe) -> ReconciliationReport {
        let tracks = swipe.tracks();
        let discrepancies = self.find_discrepancies(&tracks);

        for discrepancy in &discrepancies {
            tracing::debug!(
                swipe_id = %id,
                field = %discrepancy.field,
                left = %discrepancy.left,
                right = %discrepancy.right,
                kind = ?discrepancy.kind,
                "track discrepancy"
            );
        }

        let result = if tracks.is_empty() {
            ReconciliationResult::NoData
        } else if !discrepancies.is_empty() {
            let conflicts = discrepancies
                .iter()
                .filter(|d| d.kind == DiscrepancyKind::Conflict)
                .count();
            ReconciliationResult::Inconsistent {
                conflicts,
                unverified: discrepancies.len() - conflicts,
            }
        } else if tracks.len() < self.min_tracks {
            ReconciliationResult::InsufficientTracks {
                present: tracks.len(),
                required: self.min_tracks,
            }
        } else {
            ReconciliationResult::Consistent {
                tracks_compared: tracks.len(),
            }
        };

        let identity = if result.is_consistent() {
            let name = swipe.track1.as_ref().and_then(|track| track.name());
            Some(CardIdentity::merge(&tracks, name))
        } else {
            None
        };

        tracing::info!(
            swipe_id = %id,
            result = result.as_str(),
            tracks = tracks.len(),
            discrepancies = discrepancies.len(),
            fingerprint = identity
                .as_ref()
                .and_then(|identity| identity.account_fingerprint.as_deref())
                .unwrap_or("-"),
            "swipe reconciled"
        );

        ReconciliationReport {
            id,
            mode: self.mode,
            tracks_present: tracks.iter().map(|track| track.kind()).collect(),
            result,
            discrepancies,
            identity,
            reconciled_at: Utc::now(),
        }
    }

    /// Discrepancies between two tracks under this engine's mode
    pub fn check_pair(
        &self,
        left: &dyn BankCardTrack,
        right: &dyn BankCardTrack,
    ) -> Vec<Discrepancy> {
        let check = left.check_consistency(right, self.mode);
        let discrepancy = |field: &CardField, kind: DiscrepancyKind| {
            Discrepancy::new(*field, left.kind(), right.kind(), kind)
        };

        let conflicts = check
            .conflicts
            .iter()
            .map(|field| discrepancy(field, DiscrepancyKind::Conflict));
        let unverified = check
            .unverified
            .iter()
            .map(|field| discrepancy(field, DiscrepancyKind::Unverified));

        conflicts.chain(unverified).collect()
    }

    fn find_discrepancies(&self, tracks: &[&dyn BankCardTrack]) -> Vec<Discrepancy> {
        let mut discrepancies = Vec::new();
        for (i, left) in tracks.iter().enumerate() {
            for right in &tracks[i + 1..] {
                discrepancies.extend(self.check_pair(*left, *right));
            }
        }
        discrepancies
    }

    /// Quick check: do all present tracks agree?
    pub fn is_consistent(&self, swipe: &CardSwipe) -> bool {
        self.find_discrepancies(&swipe.tracks()).is_empty()
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
