//! # Draft Bill State
//!
//! The bill being keyed in at the counter, before it gets a number.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add / update / remove rows, set customer, tax, paid, mode, due date   │
//! │       │        (every edit validated on entry)                         │
//! │       ▼                                                                 │
//! │  checkout() ──► CheckedDraft { customer, items, totals, ... }          │
//! │       │        (≥1 row, customer name, 10-digit phone, GSTIN)          │
//! │       ▼                                                                 │
//! │  save flow persists the invoice                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clear()  (tax rate is kept for the next bill)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never stored on the draft; they are derived through
//! [`compute_totals`] whenever asked for.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kirana_core::numbering::InvoiceNumber;
use kirana_core::validation::{
    normalize_phone, validate_customer_name, validate_entry_quantity, validate_gstin,
    validate_line_item, validate_paid_amount, validate_tax_rate,
};
use kirana_core::{
    compute_totals, CoreError, CoreResult, CustomerSnapshot, Invoice, InvoiceTotals, LineItem,
    Money, PaymentMode, TaxRate, ValidationError, MAX_LINE_ITEMS,
};

// =============================================================================
// Entry Types
// =============================================================================

/// A row as typed at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount_percent: Decimal,
}

impl LineItemInput {
    fn into_line_item(self) -> LineItem {
        let item = LineItem::new(self.description.trim(), self.quantity, self.unit_price)
            .with_discount(self.discount_percent);
        match self.brand {
            Some(brand) if !brand.trim().is_empty() => item.with_brand(brand.trim()),
            _ => item,
        }
    }
}

/// Partial edit of an existing row. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItemUpdate {
    pub description: Option<String>,
    pub brand: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Money>,
    pub discount_percent: Option<Decimal>,
}

// =============================================================================
// Draft
// =============================================================================

/// The bill under edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub items: Vec<LineItem>,
    pub customer: CustomerSnapshot,
    pub tax_rate: TaxRate,
    pub paid_amount: Money,
    pub payment_mode: PaymentMode,
    pub due_date: Option<NaiveDate>,
}

impl Draft {
    /// Empty draft at the given tax rate.
    pub fn new(tax_rate: TaxRate) -> Self {
        Draft {
            items: Vec::new(),
            customer: CustomerSnapshot::default(),
            tax_rate,
            paid_amount: Money::zero(),
            payment_mode: PaymentMode::default(),
            due_date: None,
        }
    }

    /// Appends a row and returns it.
    ///
    /// Every edit leaves the draft computable: a change the calculator
    /// rejects is not applied.
    pub fn add_item(&mut self, input: LineItemInput) -> CoreResult<&LineItem> {
        if self.items.len() >= MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLineItems {
                max: MAX_LINE_ITEMS,
            });
        }
        validate_entry_quantity(input.quantity)?;

        let item = input.into_line_item();
        validate_line_item(&item)?;

        self.items.push(item);
        if let Err(e) = self.totals() {
            self.items.pop();
            return Err(e);
        }
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// Applies a partial edit to the row with `id`.
    ///
    /// The row is only replaced if the edited version validates.
    pub fn update_item(&mut self, id: &str, update: LineItemUpdate) -> CoreResult<&LineItem> {
        let index = self.position(id)?;
        let mut item = self.items[index].clone();

        if let Some(description) = update.description {
            item.description = description.trim().to_string();
        }
        if let Some(brand) = update.brand {
            item.brand = brand.trim().to_string();
        }
        if let Some(quantity) = update.quantity {
            validate_entry_quantity(quantity)?;
            item.quantity = quantity;
        }
        if let Some(price) = update.unit_price {
            item.unit_price = price;
        }
        if let Some(percent) = update.discount_percent {
            item.discount_percent = percent;
        }
        validate_line_item(&item)?;

        let previous = std::mem::replace(&mut self.items[index], item);
        if let Err(e) = self.totals() {
            self.items[index] = previous;
            return Err(e);
        }
        Ok(&self.items[index])
    }

    /// Removes the row with `id`.
    pub fn remove_item(&mut self, id: &str) -> CoreResult<LineItem> {
        let index = self.position(id)?;
        Ok(self.items.remove(index))
    }

    pub fn set_tax_rate(&mut self, rate: TaxRate) -> CoreResult<()> {
        validate_tax_rate(rate)?;
        compute_totals(&self.items, rate, self.paid_amount)?;
        self.tax_rate = rate;
        Ok(())
    }

    pub fn set_paid_amount(&mut self, paid: Money) -> CoreResult<()> {
        validate_paid_amount(paid)?;
        compute_totals(&self.items, self.tax_rate, paid)?;
        self.paid_amount = paid;
        Ok(())
    }

    /// Stores the customer as typed. Checked at checkout.
    pub fn set_customer(&mut self, customer: CustomerSnapshot) {
        self.customer = customer;
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = mode;
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    /// Resets everything except the tax rate.
    pub fn clear(&mut self) {
        *self = Draft::new(self.tax_rate);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current totals.
    pub fn totals(&self) -> CoreResult<InvoiceTotals> {
        Ok(compute_totals(&self.items, self.tax_rate, self.paid_amount)?)
    }

    /// Checks the draft is ready to become an invoice.
    ///
    /// ## Rules
    /// - At least one row
    /// - Customer name present
    /// - Phone normalizes to 10 digits
    /// - GSTIN, when given, is 15 letters or digits
    pub fn checkout(&self) -> CoreResult<CheckedDraft> {
        if self.items.is_empty() {
            return Err(ValidationError::required("line items").into());
        }

        validate_customer_name(&self.customer.name)?;
        let phone = normalize_phone(&self.customer.phone)?;
        let gstin = match self.customer.gstin.as_deref() {
            Some(raw) => validate_gstin(raw)?,
            None => None,
        };

        let customer = CustomerSnapshot {
            name: self.customer.name.trim().to_string(),
            phone,
            address: self.customer.address.trim().to_string(),
            gstin,
        };

        Ok(CheckedDraft {
            totals: self.totals()?,
            customer,
            items: self.items.clone(),
            tax_rate: self.tax_rate,
            payment_mode: self.payment_mode,
            due_date: self.due_date,
        })
    }

    fn position(&self, id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| CoreError::LineItemNotFound(id.to_string()))
    }
}

/// A validated draft, ready for a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedDraft {
    /// Customer with normalized phone and GSTIN.
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub tax_rate: TaxRate,
    pub totals: InvoiceTotals,
    pub payment_mode: PaymentMode,
    pub due_date: Option<NaiveDate>,
}

impl CheckedDraft {
    /// Builds the invoice record. Date and time are shop-local.
    pub fn into_invoice(
        self,
        invoice_number: InvoiceNumber,
        customer_id: Option<String>,
        now: DateTime<Local>,
    ) -> Invoice {
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number,
            date: now.date_naive(),
            time: now.time(),
            due_date: self.due_date,
            payment_mode: self.payment_mode,
            customer_id,
            customer: self.customer,
            items: self.items,
            tax_rate: self.tax_rate,
            totals: self.totals,
            created_at: now.with_timezone(&Utc),
        }
    }
}

// =============================================================================
// Draft State
// =============================================================================

/// Session-owned draft behind a mutex.
///
/// ## Why std Mutex?
/// Every draft operation is quick and synchronous; the lock is never held
/// across an `.await`.
#[derive(Debug, Clone)]
pub struct DraftState {
    draft: Arc<Mutex<Draft>>,
}

impl DraftState {
    pub fn new(tax_rate: TaxRate) -> Self {
        DraftState {
            draft: Arc::new(Mutex::new(Draft::new(tax_rate))),
        }
    }

    /// Executes a function with read access to the draft.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Draft) -> R,
    {
        let draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
        f(&draft)
    }

    /// Executes a function with write access to the draft.
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Draft) -> R,
    {
        let mut draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut draft)
    }

    /// Copy of the current draft.
    pub fn snapshot(&self) -> Draft {
        self.with_draft(Draft::clone)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tv() -> LineItemInput {
        LineItemInput {
            description: "  Samsung LED TV 43\"  ".to_string(),
            brand: Some("Samsung".to_string()),
            quantity: 1,
            unit_price: Money::from_rupees(32000),
            discount_percent: Decimal::ZERO,
        }
    }

    fn customer() -> CustomerSnapshot {
        CustomerSnapshot {
            name: " Asha Verma ".to_string(),
            phone: "+91 98765 43210".to_string(),
            address: "12 MG Road".to_string(),
            gstin: Some("29abcde1234f1z5".to_string()),
        }
    }

    fn draft() -> Draft {
        Draft::new(TaxRate::from_percent_u32(18))
    }

    #[test]
    fn test_add_item_trims_and_keeps_brand() {
        let mut draft = draft();
        let item = draft.add_item(tv()).unwrap();

        assert_eq!(item.description, "Samsung LED TV 43\"");
        assert_eq!(item.brand, "Samsung");
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn test_rejected_edits_leave_draft_computable() {
        let mut draft = draft();
        draft.add_item(tv()).unwrap();

        let mut gold = tv();
        gold.unit_price = Money::from_decimal(Decimal::MAX);
        assert!(draft.add_item(gold).is_err());

        let absurd = TaxRate::from_percent(Decimal::MAX);
        assert!(draft.set_tax_rate(absurd).is_err());
        assert_eq!(draft.tax_rate, TaxRate::from_percent_u32(18));

        let id = draft.items[0].id.clone();
        let update = LineItemUpdate {
            unit_price: Some(Money::from_decimal(Decimal::MAX)),
            ..LineItemUpdate::default()
        };
        assert!(draft.update_item(&id, update).is_err());

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.totals().unwrap().grand_total, Money::from_rupees(37760));
    }

    #[test]
    fn test_add_item_rejects_bad_rows() {
        let mut draft = draft();

        let mut zero_qty = tv();
        zero_qty.quantity = 0;
        assert!(draft.add_item(zero_qty).is_err());

        let mut huge_qty = tv();
        huge_qty.quantity = 10_000;
        assert!(draft.add_item(huge_qty).is_err());

        let mut blank = tv();
        blank.description = "   ".to_string();
        assert!(draft.add_item(blank).is_err());

        let mut over_discount = tv();
        over_discount.discount_percent = dec!(101);
        assert!(draft.add_item(over_discount).is_err());

        assert!(draft.is_empty());
    }

    #[test]
    fn test_row_limit() {
        let mut draft = draft();
        for _ in 0..MAX_LINE_ITEMS {
            draft.add_item(tv()).unwrap();
        }
        assert!(matches!(
            draft.add_item(tv()),
            Err(CoreError::TooManyLineItems { .. })
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let mut draft = draft();
        let id = draft.add_item(tv()).unwrap().id.clone();

        let updated = draft
            .update_item(
                &id,
                LineItemUpdate {
                    quantity: Some(2),
                    discount_percent: Some(dec!(10)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.amount(), Money::from_rupees(57600));

        // A rejected edit leaves the row untouched.
        let bad = LineItemUpdate {
            quantity: Some(-1),
            ..Default::default()
        };
        assert!(draft.update_item(&id, bad).is_err());
        assert_eq!(draft.items[0].quantity, 2);

        assert!(matches!(
            draft.remove_item("missing"),
            Err(CoreError::LineItemNotFound(_))
        ));
        draft.remove_item(&id).unwrap();
        assert!(draft.is_empty());
    }

    #[test]
    fn test_totals_follow_the_calculator() {
        let mut draft = draft();
        draft.add_item(tv()).unwrap();
        draft.set_paid_amount(Money::from_rupees(30000)).unwrap();

        let totals = draft.totals().unwrap();
        assert_eq!(totals.grand_total, Money::from_rupees(37760));
        assert_eq!(totals.balance, Money::from_rupees(7760));

        draft.set_tax_rate(TaxRate::zero()).unwrap();
        assert_eq!(draft.totals().unwrap().grand_total, Money::from_rupees(32000));
    }

    #[test]
    fn test_negative_settings_rejected() {
        let mut draft = draft();
        assert!(draft.set_paid_amount(Money::from_rupees(-1)).is_err());
        assert!(draft
            .set_tax_rate(TaxRate::from_percent(dec!(-18)))
            .is_err());
        assert_eq!(draft.tax_rate, TaxRate::from_percent_u32(18));
    }

    #[test]
    fn test_checkout_requires_items_and_customer() {
        let mut draft = draft();
        draft.set_customer(customer());
        assert!(draft.checkout().is_err());

        draft.add_item(tv()).unwrap();
        draft.set_customer(CustomerSnapshot {
            name: "Asha".to_string(),
            phone: "12345".to_string(),
            ..Default::default()
        });
        assert!(draft.checkout().is_err());

        draft.set_customer(CustomerSnapshot {
            name: " ".to_string(),
            phone: "9876543210".to_string(),
            ..Default::default()
        });
        assert!(draft.checkout().is_err());
    }

    #[test]
    fn test_checkout_normalizes_customer() {
        let mut draft = draft();
        draft.add_item(tv()).unwrap();
        draft.set_customer(customer());

        let checked = draft.checkout().unwrap();
        assert_eq!(checked.customer.name, "Asha Verma");
        assert_eq!(checked.customer.phone, "9876543210");
        assert_eq!(checked.customer.gstin.as_deref(), Some("29ABCDE1234F1Z5"));
        assert_eq!(checked.totals.grand_total, Money::from_rupees(37760));
    }

    #[test]
    fn test_into_invoice_uses_local_date() {
        let mut draft = draft();
        draft.add_item(tv()).unwrap();
        draft.set_customer(customer());
        draft.set_payment_mode(PaymentMode::Upi);

        let now = Local.with_ymd_and_hms(2024, 1, 15, 14, 5, 0).unwrap();
        let invoice = draft.checkout().unwrap().into_invoice(
            InvoiceNumber::Sequential("2401150004".to_string()),
            Some("cust-1".to_string()),
            now,
        );

        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(invoice.invoice_number.as_str(), "2401150004");
        assert_eq!(invoice.payment_mode, PaymentMode::Upi);
        assert_eq!(invoice.customer_id.as_deref(), Some("cust-1"));
    }

    #[test]
    fn test_clear_keeps_tax_rate() {
        let state = DraftState::new(TaxRate::from_percent_u32(12));
        state.with_draft_mut(|d| {
            d.add_item(tv()).unwrap();
            d.set_customer(customer());
            d.set_due_date(NaiveDate::from_ymd_opt(2024, 2, 15));
        });

        state.with_draft_mut(Draft::clear);

        let draft = state.snapshot();
        assert!(draft.is_empty());
        assert_eq!(draft.customer, CustomerSnapshot::default());
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.tax_rate, TaxRate::from_percent_u32(12));
    }
}
