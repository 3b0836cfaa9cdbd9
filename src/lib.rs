// Magnetic Stripe Reconciliation - Core Library
// Card field model, track records and the cross-track consistency engine

pub mod equality;
pub mod fields;         // Field-presence values: PAN, expiration date, service code
pub mod track;          // Track data + bank card track records
pub mod parser;         // Track 1/2/3 grammars
pub mod config;         // Reconcile settings
pub mod reconciliation; // Pairwise consistency + identity merge

// Re-export commonly used types
pub use equality::{combine_hash_codes, optional_equals, optional_hash_code, string_hash_code};
pub use fields::{AccountNumber, CardField, CardFieldValue, ExpirationDate, Field, ServiceCode};
pub use track::{
    BankCardTrack, BankCardTrackData, ConsistencyCheck, ConsistencyMode,
    Track1, Track2, Track3, TrackData, TrackKind,
};
pub use parser::{parse_track1, parse_track2, parse_track3, TrackParseError};
pub use config::ReconcileConfig;
pub use reconciliation::{
    CardIdentity, CardSwipe, Discrepancy, DiscrepancyKind,
    ReconciliationEngine, ReconciliationReport, ReconciliationResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
