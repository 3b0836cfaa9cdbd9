// Card expiration date, encoded YYMM on tracks 1 and 2

use super::{CardFieldValue, Field};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpirationDate {
    /// YYMM as read from the track (trimmed)
    raw: String,
}

impl ExpirationDate {
    pub fn new(raw: &str) -> Self {
        ExpirationDate {
            raw: raw.trim().to_string(),
        }
    }

    /// Parse from track text: blank → Unavailable, anything else → Present.
    pub fn parse(raw: &str) -> Field<Self> {
        let date = Self::new(raw);
        if date.raw.is_empty() {
            Field::Unavailable
        } else {
            Field::Present(date)
        }
    }

    /// Build from a calendar year and month (1-12).
    pub fn from_year_month(year: i32, month: u32) -> Self {
        Self::new(&format!("{:02}{:02}", year.rem_euclid(100), month))
    }

    fn parts(&self) -> Option<(i32, u32)> {
        if self.raw.len() != 4 || !self.raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let yy: i32 = self.raw[0..2].parse().ok()?;
        let mm: u32 = self.raw[2..4].parse().ok()?;
        if !(1..=12).contains(&mm) {
            return None;
        }
        Some((2000 + yy, mm))
    }

    /// Four-digit year (20YY)
    pub fn year(&self) -> Option<i32> {
        self.parts().map(|(year, _)| year)
    }

    pub fn month(&self) -> Option<u32> {
        self.parts().map(|(_, month)| month)
    }

    /// Last calendar day the card is usable
    pub fn last_day(&self) -> Option<NaiveDate> {
        let (year, month) = self.parts()?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
    }

    /// True iff the date is valid and `as_of` falls after its last day
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.last_day().is_some_and(|last_day| as_of > last_day)
    }

    /// "MM/YY" display form, or the raw text when invalid
    pub fn display(&self) -> String {
        match self.last_day() {
            Some(day) => format!("{:02}/{:02}", day.month(), day.year() % 100),
            None => self.raw.clone(),
        }
    }
}

impl CardFieldValue for ExpirationDate {
    fn is_valid(&self) -> bool {
        self.parts().is_some()
    }

    fn as_raw(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_yymm() {
        let date = ExpirationDate::new("2712");
        assert!(date.is_valid());
        assert_eq!(date.year(), Some(2027));
        assert_eq!(date.month(), Some(12));
        assert_eq!(date.last_day(), NaiveDate::from_ymd_opt(2027, 12, 31));
        assert_eq!(date.display(), "12/27");
    }

    #[test]
    fn test_invalid_month() {
        assert!(!ExpirationDate::new("2713").is_valid());
        assert!(!ExpirationDate::new("2700").is_valid());
        assert_eq!(ExpirationDate::new("2713").display(), "2713");
    }

    #[test]
    fn test_wrong_shape() {
        assert!(!ExpirationDate::new("271").is_valid());
        assert!(!ExpirationDate::new("27-1").is_valid());
        assert!(!ExpirationDate::new("12/27").is_valid());
    }

    #[test]
    fn test_last_day_handles_february() {
        let date = ExpirationDate::new("2802");
        assert_eq!(date.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29));
    }

    #[test]
    fn test_is_expired() {
        let date = ExpirationDate::new("2406");
        let june_30 = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let july_1 = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(!date.is_expired(june_30));
        assert!(date.is_expired(july_1));

        // Invalid dates never report expired
        assert!(!ExpirationDate::new("2499").is_expired(july_1));
    }

    #[test]
    fn test_from_year_month() {
        assert_eq!(ExpirationDate::from_year_month(2027, 12), ExpirationDate::new("2712"));
        assert_eq!(ExpirationDate::from_year_month(2030, 1).as_raw(), "3001");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let date = ExpirationDate::new("2712");
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2712\"");

        let back: ExpirationDate = serde_json::from_str("\"2712\"").unwrap();
        assert_eq!(back, date);
    }

    #[test]
    fn test_parse_blank_is_unavailable() {
        assert!(!ExpirationDate::parse(" ").is_present());
        assert!(ExpirationDate::parse("3001").has_value());
    }
}
