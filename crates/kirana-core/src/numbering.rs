//! # Invoice Number Allocator
//!
//! Daily sequential invoice numbers.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   2 4 0 1 1 5 0 0 0 4                                                   │
//! │   └─┬─┘└┬┘└┬┘ └──┬──┘                                                   │
//! │     yy  mm dd   ####    4-digit daily sequence (wider past 9999)        │
//! │                                                                         │
//! │   Sequential   2401150004       allocated from stored numbers          │
//! │   Provisional  INV1705312345678 only when the store is unreachable     │
//! │                                 and configuration allows it            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitation
//! Allocation reads existing numbers and takes max + 1. Two counters
//! allocating at the same moment can pick the same number; the unique
//! index on `invoice_number` in storage rejects the second save.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of provisional numbers.
pub const PROVISIONAL_PREFIX: &str = "INV";

/// Length of the `YYMMDD` prefix.
pub const DAY_PREFIX_LEN: usize = 6;

/// Minimum width of the daily sequence.
pub const SEQUENCE_WIDTH: usize = 4;

// =============================================================================
// Invoice Number
// =============================================================================

/// An allocated invoice number.
///
/// Provisional numbers are kept apart so lists and reports can flag them.
/// Serialized as the bare string either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum InvoiceNumber {
    /// `YYMMDD####` from the daily sequence.
    Sequential(String),
    /// `INV<unix-millis>`, issued while the number source was unavailable.
    Provisional(String),
}

impl InvoiceNumber {
    pub fn as_str(&self) -> &str {
        match self {
            InvoiceNumber::Sequential(s) | InvoiceNumber::Provisional(s) => s,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, InvoiceNumber::Provisional(_))
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for InvoiceNumber {
    fn from(s: String) -> Self {
        if s.starts_with(PROVISIONAL_PREFIX) {
            InvoiceNumber::Provisional(s)
        } else {
            InvoiceNumber::Sequential(s)
        }
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        match number {
            InvoiceNumber::Sequential(s) | InvoiceNumber::Provisional(s) => s,
        }
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// `YYMMDD` for a date.
pub fn day_prefix(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Daily sequence of an existing number.
///
/// Numbers shorter than ten characters count as 0. Otherwise the leading
/// digits after the prefix are read; none (or an overflow) count as 0.
pub fn sequence_of(number: &str) -> u64 {
    if number.len() < DAY_PREFIX_LEN + SEQUENCE_WIDTH {
        return 0;
    }

    let digits: String = number
        .get(DAY_PREFIX_LEN..)
        .unwrap_or_default()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse().unwrap_or(0)
}

/// Allocates the next number for `today`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kirana_core::numbering::allocate;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let next = allocate(["2401150001", "2401150003", "2401140009"], today);
/// assert_eq!(next.as_str(), "2401150004");
///
/// let first = allocate(Vec::<String>::new(), today);
/// assert_eq!(first.as_str(), "2401150001");
/// ```
pub fn allocate<I>(existing: I, today: NaiveDate) -> InvoiceNumber
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let prefix = day_prefix(today);

    let max = existing
        .into_iter()
        .filter(|number| number.as_ref().starts_with(&prefix))
        .map(|number| sequence_of(number.as_ref()))
        .max()
        .unwrap_or(0);

    InvoiceNumber::Sequential(format!(
        "{}{:0width$}",
        prefix,
        max.saturating_add(1),
        width = SEQUENCE_WIDTH
    ))
}

/// Timestamp-derived number for when the store cannot be read.
pub fn provisional(at: DateTime<Utc>) -> InvoiceNumber {
    InvoiceNumber::Provisional(format!("{}{}", PROVISIONAL_PREFIX, at.timestamp_millis()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_day_prefix() {
        assert_eq!(day_prefix(jan_15()), "240115");
        assert_eq!(day_prefix(NaiveDate::from_ymd_opt(2031, 12, 3).unwrap()), "311203");
    }

    #[test]
    fn test_first_of_the_day() {
        let next = allocate(["2401140042"], jan_15());
        assert_eq!(next, InvoiceNumber::Sequential("2401150001".to_string()));
    }

    #[test]
    fn test_next_after_max() {
        let next = allocate(["2401150001", "2401150003"], jan_15());
        assert_eq!(next.as_str(), "2401150004");
    }

    #[test]
    fn test_short_and_garbled_suffixes_count_as_zero() {
        assert_eq!(sequence_of("240115"), 0);
        assert_eq!(sequence_of("240115001"), 0);
        assert_eq!(sequence_of("240115abcd"), 0);
        assert_eq!(sequence_of("2401150007x"), 7);

        let next = allocate(["240115abcd", "24011500"], jan_15());
        assert_eq!(next.as_str(), "2401150001");
    }

    #[test]
    fn test_provisional_numbers_are_ignored() {
        let next = allocate(["INV1705312345678", "2401150002"], jan_15());
        assert_eq!(next.as_str(), "2401150003");
    }

    #[test]
    fn test_sequence_grows_past_four_digits() {
        let next = allocate(["2401159999"], jan_15());
        assert_eq!(next.as_str(), "24011510000");
    }

    #[test]
    fn test_provisional() {
        let at = Utc.timestamp_millis_opt(1_705_312_345_678).unwrap();
        let number = provisional(at);
        assert!(number.is_provisional());
        assert_eq!(number.as_str(), "INV1705312345678");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let number = InvoiceNumber::from("INV1".to_string());
        assert!(number.is_provisional());

        let json = serde_json::to_string(&InvoiceNumber::Sequential("2401150001".into())).unwrap();
        assert_eq!(json, "\"2401150001\"");

        let back: InvoiceNumber = serde_json::from_str(&json).unwrap();
        assert!(!back.is_provisional());
    }
}
