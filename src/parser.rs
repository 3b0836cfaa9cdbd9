// 🏗️ Track Grammars - Raw swipe text → track records
//
// Minimal ISO/IEC 7813 grammars:
//   Track 1 (format B): %B<PAN>^<NAME>^<YYMM|^><SSS|^><discretionary>?
//   Track 2:            ;<PAN>=<YYMM|=><SSS|=><discretionary>?
//   Track 3:            ;<FC><PAN>=<rest>?
//
// Sentinels are optional. A field separator standing in for the expiration
// date or service code means that field is unavailable.
// Blank input = track not read (Ok(None)). Text that cannot be represented
// at all is rejected.

use crate::fields::{AccountNumber, ExpirationDate, Field, ServiceCode};
use crate::track::{BankCardTrackData, Track1, Track2, Track3, TrackData, TrackKind};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static TRACK1_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%?([A-Z])([0-9]{1,19})\^([^^]{2,26})\^([0-9]{4}|\^)([0-9]{3}|\^)([^?]*)\??\s*$")
        .expect("track 1 pattern is valid")
});

static TRACK2_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^;?([0-9]{1,19})=([0-9]{4}|=)([0-9]{3}|=)([^?]*)\??\s*$")
        .expect("track 2 pattern is valid")
});

static TRACK3_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^;?([0-9]{2})([0-9]{1,19})=([^?]*)\??\s*$").expect("track 3 pattern is valid")
});

// ============================================================================
// ERRORS
// ============================================================================

/// Track text that cannot be represented as a track record.
///
/// The raw text is deliberately not carried: it may contain a full PAN.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackParseError {
    #[error("{track} data ({length} chars) does not match the track format")]
    Malformed { track: TrackKind, length: usize },
}

impl TrackParseError {
    fn malformed(track: TrackKind, raw: &str) -> Self {
        TrackParseError::Malformed {
            track,
            length: raw.chars().count(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackParseError>;

// ============================================================================
// HELPERS
// ============================================================================

/// A lone separator in a field position means "not encoded"
fn separator_or<T>(value: &str, separator: &str, parse: fn(&str) -> Field<T>) -> Field<T> {
    if value == separator {
        Field::Unavailable
    } else {
        parse(value)
    }
}

fn discretionary(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|data| !data.is_empty())
}

// ============================================================================
// PARSERS
// ============================================================================

pub fn parse_track1(raw: &str) -> Result<Option<Track1>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let captures = TRACK1_PATTERN
        .captures(trimmed)
        .ok_or_else(|| TrackParseError::malformed(TrackKind::Track1, trimmed))?;

    let format_code = captures[1].chars().next().unwrap_or('B');
    let card = BankCardTrackData::new(
        AccountNumber::parse(&captures[2]),
        separator_or(&captures[4], "^", ExpirationDate::parse),
        separator_or(&captures[5], "^", ServiceCode::parse),
    );

    Ok(Some(Track1::new(
        TrackData::new(raw, discretionary(&captures[6])),
        card,
        format_code,
        Some(captures[3].to_string()),
    )))
}

pub fn parse_track2(raw: &str) -> Result<Option<Track2>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let captures = TRACK2_PATTERN
        .captures(trimmed)
        .ok_or_else(|| TrackParseError::malformed(TrackKind::Track2, trimmed))?;

    let card = BankCardTrackData::new(
        AccountNumber::parse(&captures[1]),
        separator_or(&captures[2], "=", ExpirationDate::parse),
        separator_or(&captures[3], "=", ServiceCode::parse),
    );

    Ok(Some(Track2::new(
        TrackData::new(raw, discretionary(&captures[4])),
        card,
    )))
}

pub fn parse_track3(raw: &str) -> Result<Option<Track3>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let captures = TRACK3_PATTERN
        .captures(trimmed)
        .ok_or_else(|| TrackParseError::malformed(TrackKind::Track3, trimmed))?;

    Ok(Some(Track3::new(
        TrackData::new(raw, discretionary(&captures[3])),
        AccountNumber::parse(&captures[2]),
        captures[1].to_string(),
    )))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::CardFieldValue;
    use crate::track::BankCardTrack;

    #[test]
    fn test_parse_track1_full() {
        let track = parse_track1("%B4111111111111111^DOE/JANE^2712101000000000?")
            .unwrap()
            .unwrap();

        assert_eq!(track.format_code(), 'B');
        assert_eq!(track.name(), Some("DOE/JANE"));
        assert!(track.has_account_number());
        assert!(track.has_expiration_date());
        assert!(track.has_service_code());
        assert_eq!(track.expiration_date().value().map(|d| d.as_raw()), Some("2712"));
        assert_eq!(track.service_code().value().map(|s| s.as_raw()), Some("101"));
        assert_eq!(track.discretionary_data(), Some("000000000"));
    }

    #[test]
    fn test_parse_track1_missing_date_and_service_code() {
        let track = parse_track1("%B4111111111111111^DOE/JANE^^^?").unwrap().unwrap();
        assert!(track.has_account_number());
        assert!(!track.expiration_date().is_present());
        assert!(!track.service_code().is_present());
        assert_eq!(track.discretionary_data(), None);
    }

    #[test]
    fn test_parse_track2_full() {
        let track = parse_track2(";4111111111111111=27121010000?").unwrap().unwrap();
        assert_eq!(track.kind(), TrackKind::Track2);
        assert!(track.has_account_number());
        assert!(track.has_expiration_date());
        assert!(track.has_service_code());
        assert_eq!(track.discretionary_data(), Some("0000"));
        assert_eq!(track.raw_data(), ";4111111111111111=27121010000?");
    }

    #[test]
    fn test_parse_track2_without_sentinels() {
        let track = parse_track2("4111111111111111=2712101").unwrap().unwrap();
        assert!(track.has_service_code());
        assert_eq!(track.discretionary_data(), None);
    }

    #[test]
    fn test_parse_track2_invalid_values_are_present() {
        // Bad Luhn and month 13 still decode; they just are not available
        let track = parse_track2(";4111111111111112=2713101?").unwrap().unwrap();
        assert!(track.account_number().is_present());
        assert!(!track.has_account_number());
        assert!(track.expiration_date().is_present());
        assert!(!track.has_expiration_date());
        assert!(track.has_service_code());
    }

    #[test]
    fn test_parse_track3() {
        let track = parse_track3(";014111111111111111=7240000?").unwrap().unwrap();
        assert_eq!(track.format_code(), "01");
        assert!(track.has_account_number());
        assert!(!track.has_expiration_date());
        assert!(!track.has_service_code());
        assert_eq!(track.discretionary_data(), Some("7240000"));
    }

    #[test]
    fn test_blank_input_is_not_read() {
        assert!(parse_track1("").unwrap().is_none());
        assert!(parse_track2("   ").unwrap().is_none());
        assert!(parse_track3("\n").unwrap().is_none());
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let err = parse_track2("garbage").unwrap_err();
        assert_eq!(
            err,
            TrackParseError::Malformed {
                track: TrackKind::Track2,
                length: 7
            }
        );

        assert!(parse_track1(";4111111111111111=2712101?").is_err());
        assert!(parse_track3("%B4111^X^2712101?").is_err());
    }

    #[test]
    fn test_error_message_does_not_leak_pan() {
        let err = parse_track1("%B4111111111111111 no separators").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Track 1 data"));
        assert!(!message.contains("4111111111111111"));
    }
}
