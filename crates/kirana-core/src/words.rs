//! # Numeric Formatter
//!
//! Writes a rupee amount in English words on the Indian scale, the way it
//! appears on the "Amount in words" line of a bill.
//!
//! ## Scale
//! ```text
//! ┌────────────────────┬───────────────┐
//! │  1 00              │  Hundred      │
//! │  1 000             │  Thousand     │
//! │  1 00 000          │  Lakh         │
//! │  1 00 00 000       │  Crore        │
//! └────────────────────┴───────────────┘
//!
//! 37760      → Thirty Seven Thousand Seven Hundred Sixty Rupees Only
//! 1 00 00 000 → One Crore Rupees Only
//! 0          → Zero
//! ```
//!
//! Zero is written as a bare `"Zero"` with no currency suffix.

use crate::money::Money;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const HUNDRED: u64 = 100;
const THOUSAND: u64 = 1_000;
const LAKH: u64 = 1_00_000;
const CRORE: u64 = 1_00_00_000;

/// Suffix appended to every non-zero amount.
pub const RUPEES_ONLY: &str = "Rupees Only";

/// Words for a whole-rupee amount.
///
/// ## Example
/// ```rust
/// use kirana_core::words::words_for_amount;
///
/// assert_eq!(words_for_amount(0), "Zero");
/// assert_eq!(words_for_amount(15), "Fifteen Rupees Only");
/// assert_eq!(words_for_amount(1_50_000), "One Lakh Fifty Thousand Rupees Only");
/// ```
pub fn words_for_amount(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    format!("{} {}", convert(n), RUPEES_ONLY)
}

/// Words for the whole-rupee part of an amount.
///
/// Paise are dropped; negative amounts read as `"Zero"`.
pub fn amount_in_words(amount: Money) -> String {
    words_for_amount(u64::try_from(amount.rupees()).unwrap_or(0))
}

fn convert(n: u64) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }

    if n < HUNDRED {
        let tens = TENS[(n / 10) as usize];
        return match n % 10 {
            0 => tens.to_string(),
            unit => format!("{} {}", tens, ONES[unit as usize]),
        };
    }

    let (scale, word) = if n < THOUSAND {
        (HUNDRED, "Hundred")
    } else if n < LAKH {
        (THOUSAND, "Thousand")
    } else if n < CRORE {
        (LAKH, "Lakh")
    } else {
        (CRORE, "Crore")
    };

    let head = format!("{} {}", convert(n / scale), word);
    match n % scale {
        0 => head,
        rest => format!("{} {}", head, convert(rest)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn non_zero_amounts_end_with_suffix(n in 1u64..1_000_000_000_000) {
            let words = words_for_amount(n);
            prop_assert!(words.ends_with(" Rupees Only"));
            prop_assert!(!words.contains("  "));
            prop_assert!(!words.starts_with(' '));
        }
    }
}
