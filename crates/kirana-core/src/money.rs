//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling rupee amounts.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  With integer paise:                                                    │
//! │    GST 18% on ₹100.05 = ₹18.009 → 1801 paise                           │
//! │    SGST = CGST = 900.5 paise  ❌ cannot split evenly                    │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals                                           │
//! │    tax = 18.009, sgst = cgst = 9.0045, sgst + cgst == tax  ✅          │
//! │    Only display rounds (2 places, half away from zero)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::money::{Money, TaxRate};
//!
//! let price = Money::from_paise(10005); // ₹100.05
//! let tax = price.calculate_tax(TaxRate::from_percent_u32(18));
//!
//! assert_eq!(tax.half() + tax.half(), tax);
//! assert_eq!(tax.to_fixed(), "18.01");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a rupee amount as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for round off and balance
/// - **Single field tuple struct**: Zero-cost abstraction over Decimal
/// - **No float constructor**: amounts come from paise, whole rupees, or
///   parsed decimal strings
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  LineItem.unit_price ──► base amount ──► discounted amount              │
/// │                                                │                        │
/// │                                                ▼                        │
/// │  subtotal ──► GST ──► SGST / CGST ──► grand total ──► balance           │
/// │                                                                         │
/// │  Renderers only ever see Money::to_fixed() strings                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates Money from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(32000).to_fixed(), "32000.00");
    /// ```
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Creates Money from paise (1/100 rupee).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1099).to_fixed(), "10.99");
    /// assert_eq!(Money::from_paise(-40).to_fixed(), "-0.40");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, 2))
    }

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the whole-rupee part, truncated toward zero.
    ///
    /// Saturates to zero when the amount does not fit an `i64`.
    pub fn rupees(&self) -> i64 {
        self.0.trunc().to_i64().unwrap_or(0)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(29900); // ₹299.00
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_rupees(897));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// `amount × (1 − percent/100)`, exact.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let base = Money::from_rupees(1000);
    /// let discounted = base.apply_percentage_discount(Decimal::new(125, 1)); // 12.5%
    /// assert_eq!(discounted.to_fixed(), "875.00");
    /// ```
    pub fn apply_percentage_discount(&self, percent: Decimal) -> Money {
        Money(self.0 * (Decimal::ONE - percent / Decimal::ONE_HUNDRED))
    }

    /// Calculates tax on this amount, exact (no rounding).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_rupees(32000);
    /// let tax = subtotal.calculate_tax(TaxRate::from_percent_u32(18));
    /// assert_eq!(tax, Money::from_rupees(5760));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.percent() / Decimal::ONE_HUNDRED)
    }

    /// Splits the amount into two halves (SGST/CGST).
    ///
    /// Exact while the amount has fewer than 28 decimal places; past that
    /// the last place is rounded. The calculator bounds the scale first.
    #[inline]
    pub fn half(&self) -> Money {
        Money(self.0 / Decimal::TWO)
    }

    /// Rounds to `dp` decimal places, ties away from zero.
    pub fn round_to_scale(&self, dp: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    // -------------------------------------------------------------------------
    // Checked arithmetic
    // -------------------------------------------------------------------------
    //
    // The operators panic when a result leaves the decimal range. Anything
    // fed by user input goes through these instead.

    /// `None` when the sum leaves the decimal range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `None` when the difference leaves the decimal range.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Checked [`multiply_quantity`](Self::multiply_quantity).
    ///
    /// ```rust
    /// use kirana_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::from_rupees(10).checked_multiply_quantity(3), Some(Money::from_rupees(30)));
    /// assert_eq!(Money::from_decimal(Decimal::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Checked [`apply_percentage_discount`](Self::apply_percentage_discount).
    pub fn checked_percentage_discount(&self, percent: Decimal) -> Option<Money> {
        let remaining = Decimal::ONE.checked_sub(percent.checked_div(Decimal::ONE_HUNDRED)?)?;
        self.0.checked_mul(remaining).map(Money)
    }

    /// Checked [`calculate_tax`](Self::calculate_tax).
    pub fn checked_tax(&self, rate: TaxRate) -> Option<Money> {
        self.0
            .checked_mul(rate.percent())?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(Money)
    }

    /// Rounds to the nearest whole rupee, ties away from zero.
    ///
    /// For the non-negative totals the calculator produces this is
    /// round-half-up: `₹37759.50 → ₹37760`.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(3775950).round_to_rupee(), Money::from_rupees(37760));
    /// assert_eq!(Money::from_paise(3775949).round_to_rupee(), Money::from_rupees(37759));
    /// ```
    pub fn round_to_rupee(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats with exactly two decimal places (half away from zero).
    ///
    /// This is the only place currency is rounded for display; every
    /// renderer goes through it.
    pub fn to_fixed(&self) -> String {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded.set_sign_positive(true);
        }
        rounded.rescale(2);
        rounded.to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the rupee sign and two decimals: `₹32000.00`, `-₹0.40`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = self.to_fixed();
        match fixed.strip_prefix('-') {
            Some(unsigned) => write!(f, "-₹{}", unsigned),
            None => write!(f, "₹{}", fixed),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

/// Report totals over stored bills. Saturates at the decimal range
/// instead of panicking.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate as a percentage.
///
/// ## Why a Percentage (not basis points)?
/// The billing screen offers 0%, 12% and 18% and shows the SGST/CGST halves
/// (6%, 9%). A decimal percentage keeps `18 / 2 = 9` exact without a
/// second unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "string")] Decimal);

impl TaxRate {
    /// Creates a tax rate from a decimal percentage.
    #[inline]
    pub const fn from_percent(percent: Decimal) -> Self {
        TaxRate(percent)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub fn from_percent_u32(percent: u32) -> Self {
        TaxRate(Decimal::from(percent))
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns the SGST (or CGST) share of the rate.
    #[inline]
    pub fn half_percent(&self) -> Decimal {
        self.0 / Decimal::TWO
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if tax rate is negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Displays the percentage without trailing zeros: `18`, `9`, `2.5`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constructors() {
        assert_eq!(Money::from_rupees(10).amount(), dec!(10));
        assert_eq!(Money::from_paise(1099).amount(), dec!(10.99));
        assert_eq!(Money::from_decimal(dec!(0.5)).amount(), dec!(0.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(1099)), "₹10.99");
        assert_eq!(format!("{}", Money::from_rupees(5)), "₹5.00");
        assert_eq!(format!("{}", Money::from_paise(-40)), "-₹0.40");
        assert_eq!(format!("{}", Money::zero()), "₹0.00");
    }

    #[test]
    fn test_to_fixed_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(2.345)).to_fixed(), "2.35");
        assert_eq!(Money::from_decimal(dec!(-2.345)).to_fixed(), "-2.35");
        assert_eq!(Money::from_decimal(dec!(2.344)).to_fixed(), "2.34");
    }

    #[test]
    fn test_to_fixed_never_prints_negative_zero() {
        assert_eq!(Money::from_decimal(dec!(-0.004)).to_fixed(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(1000);
        let b = Money::from_rupees(500);

        assert_eq!(a + b, Money::from_rupees(1500));
        assert_eq!(a - b, Money::from_rupees(500));
        assert_eq!(a * 3, Money::from_rupees(3000));
        assert_eq!(-b, Money::from_rupees(-500));

        let total: Money = [a, b].iter().sum();
        assert_eq!(total, Money::from_rupees(1500));
    }

    #[test]
    fn test_half_is_exact() {
        let tax = Money::from_decimal(dec!(18.009));
        assert_eq!(tax.half().amount(), dec!(9.0045));
        assert_eq!(tax.half() + tax.half(), tax);
    }

    #[test]
    fn test_percentage_discount() {
        let base = Money::from_rupees(200);
        assert_eq!(base.apply_percentage_discount(dec!(10)), Money::from_rupees(180));
        assert_eq!(base.apply_percentage_discount(dec!(0)), base);
        assert!(base.apply_percentage_discount(dec!(100)).is_zero());
    }

    #[test]
    fn test_checked_arithmetic_stops_at_the_range() {
        let max = Money::from_decimal(Decimal::MAX);

        assert_eq!(max.checked_multiply_quantity(2), None);
        assert_eq!(max.checked_add(Money::from_rupees(1)), None);
        assert_eq!(max.checked_tax(TaxRate::from_percent_u32(18)), None);
        assert_eq!((-max).checked_sub(Money::from_rupees(1)), None);

        let price = Money::from_rupees(100);
        assert_eq!(price.checked_multiply_quantity(3), Some(price * 3));
        assert_eq!(
            price.checked_percentage_discount(dec!(12.5)),
            Some(price.apply_percentage_discount(dec!(12.5)))
        );
        assert_eq!(
            price.checked_tax(TaxRate::from_percent_u32(18)),
            Some(Money::from_rupees(18))
        );
    }

    #[test]
    fn test_sum_saturates() {
        let max = Money::from_decimal(Decimal::MAX);
        let total: Money = [max, max].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_round_to_scale() {
        let third = Money::from_decimal(Decimal::ONE / Decimal::from(3));
        assert_eq!(third.round_to_scale(4).amount(), dec!(0.3333));
        assert_eq!(Money::from_decimal(dec!(0.00005)).round_to_scale(4).amount(), dec!(0.0001));
    }

    #[test]
    fn test_round_to_rupee_ties_go_up() {
        assert_eq!(Money::from_paise(50).round_to_rupee(), Money::from_rupees(1));
        assert_eq!(Money::from_paise(250).round_to_rupee(), Money::from_rupees(3));
        assert_eq!(Money::from_paise(249).round_to_rupee(), Money::from_rupees(2));
    }

    #[test]
    fn test_rupees_truncates() {
        assert_eq!(Money::from_paise(3776099).rupees(), 37760);
        assert_eq!(Money::from_paise(-150).rupees(), -1);
    }

    #[test]
    fn test_tax_rate() {
        let rate = TaxRate::from_percent_u32(18);
        assert_eq!(rate.half_percent(), dec!(9));
        assert_eq!(rate.to_string(), "18");
        assert!(TaxRate::default().is_zero());
        assert_eq!(TaxRate::from_percent(dec!(5.00)).to_string(), "5");
        assert!(TaxRate::from_percent(dec!(-1)).is_negative());
    }
}
