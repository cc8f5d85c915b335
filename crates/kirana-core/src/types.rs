//! # Domain Types
//!
//! Core domain types used throughout Kirana Billing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Invoice     │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  description    │   │  invoice_number │   │  id (UUID)      │       │
//! │  │  quantity       │   │  customer snap. │   │  phone (key)    │       │
//! │  │  unit_price     │   │  items, totals  │   │  name, address  │       │
//! │  │  discount %     │   │  payment_mode   │   │  gstin          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    StockLog     │   │ CompanyDetails  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price, stock   │   │  IN / OUT       │   │  letterhead     │       │
//! │  │  min_stock      │   │  old → new      │   │  bank, UPI      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An invoice copies the customer's name, phone, address and GSTIN at the
//! time of sale. Editing the customer later never rewrites a printed bill.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calculator::{compute_totals, InvoiceTotals};
use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::numbering::InvoiceNumber;

/// Brand printed when a line item has none.
pub const DEFAULT_BRAND: &str = "General";

fn default_brand() -> String {
    DEFAULT_BRAND.to_string()
}

// =============================================================================
// Line Item
// =============================================================================

/// One billed row of an invoice.
///
/// Mutable while it sits in a draft; frozen once the invoice is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Draft identifier so the editor can update or remove the row.
    pub id: String,

    /// What was sold. Must not be empty.
    pub description: String,

    /// Brand shown next to the description.
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Units sold. Must be positive.
    pub quantity: i64,

    /// Price of one unit before discount.
    pub unit_price: Money,

    /// Percentage discount in `[0, 100]`.
    #[serde(default)]
    #[ts(type = "string")]
    pub discount_percent: Decimal,
}

impl LineItem {
    /// Creates an undiscounted line item with the default brand.
    pub fn new(description: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            brand: default_brand(),
            quantity,
            unit_price,
            discount_percent: Decimal::ZERO,
        }
    }

    /// Sets the percentage discount.
    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    /// Sets the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn base_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Amount after the percentage discount.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    /// use kirana_core::types::LineItem;
    /// use rust_decimal::Decimal;
    ///
    /// let item = LineItem::new("Mixer", 2, Money::from_rupees(100))
    ///     .with_discount(Decimal::from(10));
    /// assert_eq!(item.amount(), Money::from_rupees(180));
    /// ```
    #[inline]
    pub fn amount(&self) -> Money {
        self.base_amount()
            .apply_percentage_discount(self.discount_percent)
    }

    /// [`amount`](Self::amount), or `None` when it leaves the decimal range.
    pub fn checked_amount(&self) -> Option<Money> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)?
            .checked_percentage_discount(self.discount_percent)
    }

    /// How much the discount took off.
    pub fn discount_amount(&self) -> Money {
        self.base_amount() - self.amount()
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMode {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "CASH")]
    Cash,
    #[serde(rename = "CARD")]
    Card,
    #[serde(rename = "NET BANKING")]
    NetBanking,
}

impl PaymentMode {
    /// All modes in the order the billing screen lists them.
    pub const ALL: [PaymentMode; 4] = [
        PaymentMode::Upi,
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::NetBanking,
    ];

    /// Label stored and printed on the invoice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::NetBanking => "NET BANKING",
        }
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `"Cash"`, `"cash"` and `"CASH"` all parse.
impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        PaymentMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "payment mode".to_string(),
                reason: format!("unknown payment mode '{}'", s.trim()),
            })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer details frozen onto an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gstin: Option<String>,
}

/// Retail or wholesale buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CustomerType {
    Retail,
    Wholesale,
}

impl CustomerType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Retail => "Retail",
            CustomerType::Wholesale => "Wholesale",
        }
    }
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::Retail
    }
}

impl FromStr for CustomerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retail" => Ok(CustomerType::Retail),
            "wholesale" => Ok(CustomerType::Wholesale),
            other => Err(ValidationError::InvalidFormat {
                field: "customer type".to_string(),
                reason: format!("unknown customer type '{}'", other),
            }),
        }
    }
}

/// Soft-delete flag shared by customers and products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Inactive => "Inactive",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}

impl FromStr for RecordStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", other),
            }),
        }
    }
}

/// A customer record. The phone number is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub name: String,
    /// Ten digits, no separators.
    pub phone: String,
    pub address: String,
    pub gstin: Option<String>,
    pub email: Option<String>,
    pub customer_type: CustomerType,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a new retail, active customer from the details typed on a bill.
    pub fn from_snapshot(snapshot: &CustomerSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: snapshot.name.clone(),
            phone: snapshot.phone.clone(),
            address: snapshot.address.clone(),
            gstin: snapshot.gstin.clone(),
            email: None,
            customer_type: CustomerType::Retail,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// The fields a bill is allowed to overwrite on an existing customer.
    pub fn patch_from(snapshot: &CustomerSnapshot) -> CustomerPatch {
        CustomerPatch {
            name: snapshot.name.clone(),
            address: snapshot.address.clone(),
            gstin: snapshot.gstin.clone(),
        }
    }

    /// Applies a patch and bumps `updated_at`.
    pub fn apply(&mut self, patch: &CustomerPatch, now: DateTime<Utc>) {
        self.name = patch.name.clone();
        self.address = patch.address.clone();
        self.gstin = patch.gstin.clone();
        self.updated_at = now;
    }
}

/// Update applied to an existing customer when a bill is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerPatch {
    pub name: String,
    pub address: String,
    pub gstin: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Line items are matched against it for stock deduction.
    pub name: String,

    pub brand: String,
    pub category: String,
    pub description: String,

    /// Selling price of one unit.
    pub price: Money,

    /// Catalog GST percentage. The invoice uses one bill-level rate instead.
    #[ts(type = "string")]
    pub gst: Decimal,

    /// Units on hand.
    pub stock: i64,

    /// Reorder threshold.
    pub min_stock: i64,

    /// Unit of measure ("pcs", "kg", ...).
    pub unit: String,

    pub status: RecordStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// At or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// `price × stock`.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

// =============================================================================
// Stock Log
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum StockChange {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl StockChange {
    /// Direction implied by a signed delta.
    pub fn from_delta(delta: i64) -> Self {
        if delta < 0 {
            StockChange::Out
        } else {
            StockChange::In
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockChange::In => "IN",
            StockChange::Out => "OUT",
        }
    }
}

impl FromStr for StockChange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(StockChange::In),
            "OUT" => Ok(StockChange::Out),
            other => Err(ValidationError::InvalidFormat {
                field: "change type".to_string(),
                reason: format!("unknown stock change '{}'", other),
            }),
        }
    }
}

/// Append-only record of one stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockLog {
    pub id: String,
    pub product_id: String,
    /// Product name at the time of the movement.
    pub product_name: String,
    pub old_stock: i64,
    pub new_stock: i64,
    pub change_type: StockChange,
    /// Always positive; the direction lives in `change_type`.
    pub quantity: i64,
    pub reason: String,
    pub remarks: Option<String>,
    pub updated_by: String,
    #[ts(as = "String")]
    pub date_time: DateTime<Utc>,
}

// =============================================================================
// Company Details
// =============================================================================

/// Letterhead, bank and UPI details printed on every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CompanyDetails {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub mobile: String,
    pub gstin: String,
    pub bank_name: String,
    pub bank_holder: String,
    pub account_number: String,
    pub ifsc: String,
    pub upi_id: String,
    pub terms: String,
    pub email: String,
}

impl Default for CompanyDetails {
    fn default() -> Self {
        Self {
            name: "Kirana Store".to_string(),
            tagline: "Electronics & Home Appliances".to_string(),
            address: "Main Road, Market Area".to_string(),
            mobile: "00000 00000".to_string(),
            gstin: String::new(),
            bank_name: String::new(),
            bank_holder: String::new(),
            account_number: String::new(),
            ifsc: String::new(),
            upi_id: String::new(),
            terms: "Goods once sold will not be taken back.".to_string(),
            email: String::new(),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized bill.
///
/// Immutable once saved, except for payments recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// `YYMMDD####` or a provisional `INV<millis>` number.
    #[ts(as = "String")]
    pub invoice_number: InvoiceNumber,

    #[ts(as = "String")]
    pub date: NaiveDate,

    #[ts(as = "String")]
    pub time: NaiveTime,

    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    pub payment_mode: PaymentMode,

    /// Customer record this bill was filed under, when one exists.
    pub customer_id: Option<String>,

    /// Customer details as printed.
    pub customer: CustomerSnapshot,

    /// Billed rows in entry order.
    pub items: Vec<LineItem>,

    pub tax_rate: TaxRate,

    /// Totals as computed when the bill was saved.
    pub totals: InvoiceTotals,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Recomputes totals from the stored line items.
    pub fn recompute_totals(&self) -> CoreResult<InvoiceTotals> {
        Ok(compute_totals(
            &self.items,
            self.tax_rate,
            self.totals.paid_amount,
        )?)
    }

    /// Adds a payment and refreshes the balance.
    ///
    /// ## Example
    /// ```rust
    /// # use kirana_core::money::Money;
    /// # fn demo(mut invoice: kirana_core::types::Invoice) {
    /// invoice.record_payment(Money::from_rupees(500)).unwrap();
    /// # }
    /// ```
    pub fn record_payment(&mut self, amount: Money) -> CoreResult<()> {
        if amount.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "payment amount".to_string(),
            }
            .into());
        }

        let paid = self
            .totals
            .paid_amount
            .checked_add(amount)
            .ok_or_else(|| ValidationError::overflow("paid amount"))?;
        self.totals = self.totals.with_paid_amount(paid);
        Ok(())
    }

    /// Total units across all rows.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// List-view projection.
    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary {
            id: self.id.clone(),
            invoice_number: self.invoice_number.clone(),
            date: self.date,
            customer_name: self.customer.name.clone(),
            customer_phone: self.customer.phone.clone(),
            item_count: self.items.len(),
            grand_total: self.totals.grand_total,
            paid_amount: self.totals.paid_amount,
            balance: self.totals.balance,
            payment_mode: self.payment_mode,
        }
    }
}

/// One row of the invoice history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceSummary {
    pub id: String,
    #[ts(as = "String")]
    pub invoice_number: InvoiceNumber,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub customer_name: String,
    pub customer_phone: String,
    pub item_count: usize,
    pub grand_total: Money,
    pub paid_amount: Money,
    pub balance: Money,
    pub payment_mode: PaymentMode,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_invoice() -> Invoice {
        let items = vec![LineItem::new("Samsung LED TV 43\"", 1, Money::from_rupees(32000))];
        let rate = TaxRate::from_percent_u32(18);
        let totals = compute_totals(&items, rate, Money::from_rupees(10000)).unwrap();

        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: InvoiceNumber::from("2401150001".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            due_date: None,
            payment_mode: PaymentMode::Upi,
            customer_id: None,
            customer: CustomerSnapshot {
                name: "Ravi Kumar".to_string(),
                phone: "9876543210".to_string(),
                address: "Gandhi Nagar".to_string(),
                gstin: None,
            },
            items,
            tax_rate: rate,
            totals,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_item_defaults() {
        let item = LineItem::new("Fan", 2, Money::from_rupees(1500));
        assert_eq!(item.brand, "General");
        assert_eq!(item.discount_percent, Decimal::ZERO);
        assert_eq!(item.amount(), Money::from_rupees(3000));
        assert!(uuid::Uuid::parse_str(&item.id).is_ok());
    }

    #[test]
    fn test_line_item_discount() {
        let item = LineItem::new("Iron", 4, Money::from_rupees(250)).with_discount(dec!(12.5));
        assert_eq!(item.base_amount(), Money::from_rupees(1000));
        assert_eq!(item.amount(), Money::from_rupees(875));
        assert_eq!(item.discount_amount(), Money::from_rupees(125));
    }

    #[test]
    fn test_line_item_brand_defaults_when_missing_from_json() {
        let json = r#"{"id":"x","description":"Kettle","quantity":1,"unitPrice":"899"}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.brand, "General");
        assert_eq!(item.unit_price, Money::from_rupees(899));
    }

    #[test]
    fn test_payment_mode_parse_and_labels() {
        assert_eq!("cash".parse::<PaymentMode>().unwrap(), PaymentMode::Cash);
        assert_eq!("Net Banking".parse::<PaymentMode>().unwrap(), PaymentMode::NetBanking);
        assert!("cheque".parse::<PaymentMode>().is_err());
        assert_eq!(PaymentMode::default(), PaymentMode::Cash);
        assert_eq!(
            serde_json::to_string(&PaymentMode::NetBanking).unwrap(),
            "\"NET BANKING\""
        );
    }

    #[test]
    fn test_customer_from_snapshot() {
        let snapshot = CustomerSnapshot {
            name: "Asha".to_string(),
            phone: "9000000001".to_string(),
            address: "Ward 4".to_string(),
            gstin: None,
        };
        let now = Utc::now();
        let mut customer = Customer::from_snapshot(&snapshot, now);
        assert_eq!(customer.customer_type, CustomerType::Retail);
        assert_eq!(customer.status, RecordStatus::Active);

        let patch = CustomerPatch {
            name: "Asha Devi".to_string(),
            address: "Ward 5".to_string(),
            gstin: Some("29ABCDE1234F1Z5".to_string()),
        };
        customer.apply(&patch, now);
        assert_eq!(customer.name, "Asha Devi");
        assert_eq!(customer.phone, "9000000001");
    }

    #[test]
    fn test_product_low_stock_and_value() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Ceiling Fan".to_string(),
            brand: "Usha".to_string(),
            category: "Fans".to_string(),
            description: String::new(),
            price: Money::from_rupees(2200),
            gst: dec!(18),
            stock: 3,
            min_stock: 3,
            unit: "pcs".to_string(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(product.is_low_stock());
        assert_eq!(product.stock_value(), Money::from_rupees(6600));
    }

    #[test]
    fn test_stock_change_from_delta() {
        assert_eq!(StockChange::from_delta(-2), StockChange::Out);
        assert_eq!(StockChange::from_delta(5), StockChange::In);
        assert_eq!("out".parse::<StockChange>().unwrap(), StockChange::Out);
    }

    #[test]
    fn test_record_payment_updates_balance() {
        let mut invoice = sample_invoice();
        assert_eq!(invoice.totals.balance, Money::from_rupees(27760));

        invoice.record_payment(Money::from_rupees(27760)).unwrap();
        assert_eq!(invoice.totals.paid_amount, Money::from_rupees(37760));
        assert!(invoice.totals.balance.is_zero());
        assert_eq!(invoice.recompute_totals().unwrap(), invoice.totals);
    }

    #[test]
    fn test_record_payment_rejects_negative() {
        let mut invoice = sample_invoice();
        assert!(invoice.record_payment(Money::from_rupees(-1)).is_err());
    }

    #[test]
    fn test_summary_projection() {
        let invoice = sample_invoice();
        let summary = invoice.summary();
        assert_eq!(summary.invoice_number.as_str(), "2401150001");
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.grand_total, Money::from_rupees(37760));
    }
}
