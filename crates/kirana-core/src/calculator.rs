//! # Invoice Calculator
//!
//! Turns line items, a GST rate and the amount received into the figures
//! printed at the bottom of a bill.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  per line:  unit_price × qty ──► × (1 − discount%/100) ──► amount       │
//! │                                                                         │
//! │  subtotal   = Σ amount                                                  │
//! │  sgst, cgst = subtotal × rate / 200      (once, never per line,         │
//! │                                           10 decimal places)            │
//! │  tax        = sgst + cgst                (sgst == cgst exactly)         │
//! │  grand      = round(subtotal + tax)      (whole rupees, half up)        │
//! │  round off  = grand − (subtotal + tax)   (signed)                       │
//! │  balance    = grand − paid               (negative when overpaid)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Figures are exact decimals. The GST halves are held to [`GST_SCALE`]
//! places so they can always be split evenly, and the grand total is
//! rounded to whole rupees. Display rounding happens in [`Money::to_fixed`].
//!
//! Arithmetic is checked: a bill whose figures leave the decimal range is
//! rejected with `ValidationError::OutOfRange` rather than computed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::types::LineItem;
use crate::validation::{validate_line_item, validate_paid_amount, validate_tax_rate, ValidationResult};
use crate::words;

/// Decimal places kept on each GST half.
pub const GST_SCALE: u32 = 10;

// =============================================================================
// Invoice Totals
// =============================================================================

/// Derived totals of a bill.
///
/// Never edited by hand: build with [`compute_totals`] and adjust payments
/// with [`InvoiceTotals::with_paid_amount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    /// GST rate the totals were computed at.
    pub tax_rate: TaxRate,

    /// Sum of discounted line amounts.
    pub subtotal: Money,

    /// GST on the subtotal.
    pub tax_amount: Money,

    /// State share of GST.
    pub sgst: Money,

    /// Central share of GST.
    pub cgst: Money,

    /// Whole-rupee total payable.
    pub grand_total: Money,

    /// `grand_total − (subtotal + tax_amount)`, signed.
    pub round_off: Money,

    /// Amount received.
    pub paid_amount: Money,

    /// `grand_total − paid_amount`.
    pub balance: Money,
}

impl InvoiceTotals {
    /// Totals of a bill with no rows.
    pub fn zero(tax_rate: TaxRate, paid_amount: Money) -> Self {
        Self {
            tax_rate,
            subtotal: Money::zero(),
            tax_amount: Money::zero(),
            sgst: Money::zero(),
            cgst: Money::zero(),
            grand_total: Money::zero(),
            round_off: Money::zero(),
            paid_amount,
            balance: -paid_amount,
        }
    }

    /// `subtotal + tax_amount`, before rounding to whole rupees.
    #[inline]
    pub fn pre_round_total(&self) -> Money {
        self.subtotal + self.tax_amount
    }

    /// Grand total in words, e.g. `"Five Hundred Rupees Only"`.
    pub fn amount_in_words(&self) -> String {
        words::amount_in_words(self.grand_total)
    }

    /// Nothing left to collect.
    #[inline]
    pub fn is_settled(&self) -> bool {
        !self.balance.is_positive()
    }

    /// Same totals with a different amount received.
    pub fn with_paid_amount(&self, paid_amount: Money) -> Self {
        Self {
            paid_amount,
            balance: self.grand_total - paid_amount,
            ..self.clone()
        }
    }
}

// =============================================================================
// Computation
// =============================================================================

/// Computes invoice totals.
///
/// ## Errors
/// Returns a [`ValidationError`](crate::error::ValidationError) for an
/// empty description, a non-positive quantity, a negative unit price, a
/// discount outside `[0, 100]`, a negative tax rate or a negative paid
/// amount, and `OutOfRange` when a figure would leave the decimal range.
///
/// ## Example
/// ```rust
/// use kirana_core::calculator::compute_totals;
/// use kirana_core::money::{Money, TaxRate};
/// use kirana_core::types::LineItem;
///
/// let items = [
///     LineItem::new("Kettle", 1, Money::from_rupees(100)),
///     LineItem::new("Bulb", 2, Money::from_rupees(50)),
/// ];
/// let totals = compute_totals(&items, TaxRate::from_percent_u32(12), Money::from_rupees(200)).unwrap();
///
/// assert_eq!(totals.subtotal, Money::from_rupees(200));
/// assert_eq!(totals.tax_amount, Money::from_rupees(24));
/// assert_eq!(totals.grand_total, Money::from_rupees(224));
/// assert_eq!(totals.balance, Money::from_rupees(24));
/// ```
pub fn compute_totals(
    items: &[LineItem],
    tax_rate: TaxRate,
    paid_amount: Money,
) -> ValidationResult<InvoiceTotals> {
    validate_tax_rate(tax_rate)?;
    validate_paid_amount(paid_amount)?;

    if items.is_empty() {
        return Ok(InvoiceTotals::zero(tax_rate, paid_amount));
    }

    for item in items {
        validate_line_item(item)?;
    }

    let subtotal = items.iter().try_fold(Money::zero(), |acc, item| {
        item.checked_amount()
            .and_then(|amount| acc.checked_add(amount))
            .ok_or_else(|| ValidationError::overflow("subtotal"))
    })?;

    let half = subtotal
        .checked_tax(tax_rate)
        .ok_or_else(|| ValidationError::overflow("tax amount"))?
        .half()
        .round_to_scale(GST_SCALE);
    let tax_amount = half
        .checked_add(half)
        .ok_or_else(|| ValidationError::overflow("tax amount"))?;

    let pre_round = subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| ValidationError::overflow("grand total"))?;
    let grand_total = pre_round.round_to_rupee();
    let round_off = grand_total
        .checked_sub(pre_round)
        .ok_or_else(|| ValidationError::overflow("round off"))?;
    let balance = grand_total
        .checked_sub(paid_amount)
        .ok_or_else(|| ValidationError::overflow("balance"))?;

    Ok(InvoiceTotals {
        tax_rate,
        subtotal,
        tax_amount,
        sgst: half,
        cgst: half,
        grand_total,
        round_off,
        paid_amount,
        balance,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn arb_item() -> impl Strategy<Value = LineItem> {
        // Discounts in hundredths of a percent reach deep decimal scales.
        (1i64..500, 0i64..10_000_000, 0i64..=10_000).prop_map(|(qty, paise, discount)| {
            LineItem::new("Item", qty, Money::from_paise(paise))
                .with_discount(Decimal::new(discount, 2))
        })
    }

    fn arb_rate() -> impl Strategy<Value = TaxRate> {
        prop_oneof![Just(0u32), Just(5), Just(12), Just(18), Just(28)]
            .prop_map(TaxRate::from_percent_u32)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn gst_halves_sum_exactly(items in prop::collection::vec(arb_item(), 0..20), rate in arb_rate()) {
            let totals = compute_totals(&items, rate, Money::zero()).unwrap();
            prop_assert_eq!(totals.sgst + totals.cgst, totals.tax_amount);
            prop_assert_eq!(totals.sgst, totals.cgst);
        }

        #[test]
        fn round_off_reconciles(items in prop::collection::vec(arb_item(), 0..20), rate in arb_rate()) {
            let totals = compute_totals(&items, rate, Money::zero()).unwrap();
            prop_assert_eq!(totals.subtotal + totals.tax_amount + totals.round_off, totals.grand_total);
            prop_assert!(totals.round_off.amount().abs() <= Decimal::new(5, 1));
            prop_assert_eq!(totals.grand_total.amount().fract(), Decimal::ZERO);
        }

        #[test]
        fn balance_is_grand_minus_paid(
            items in prop::collection::vec(arb_item(), 1..10),
            paid in 0i64..10_000_000,
        ) {
            let paid = Money::from_paise(paid);
            let totals = compute_totals(&items, TaxRate::from_percent_u32(18), paid).unwrap();
            prop_assert_eq!(totals.balance, totals.grand_total - paid);
        }

        #[test]
        fn computation_is_idempotent(items in prop::collection::vec(arb_item(), 0..10), rate in arb_rate()) {
            let first = compute_totals(&items, rate, Money::zero()).unwrap();
            let second = compute_totals(&items, rate, Money::zero()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
