//! # Repository Module
//!
//! Store traits and their SQLite implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stores Are Injected, Not Global                      │
//! │                                                                         │
//! │  Counter app startup                                                   │
//! │       │                                                                 │
//! │       ├── Database::new(config) ──► SqliteInvoiceRepository            │
//! │       │                             SqliteCustomerRepository           │
//! │       │                             SqliteProductRepository            │
//! │       │                                                                 │
//! │       └── InMemoryStore::new()  ──► same traits, for tests / demo      │
//! │                                                                         │
//! │  Commands only see:                                                    │
//! │    Arc<dyn InvoiceStore>  Arc<dyn CustomerStore>  Arc<dyn ProductStore>│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SqliteInvoiceRepository`] - Invoices and their line items
//! - [`SqliteCustomerRepository`] - Customers keyed by phone
//! - [`SqliteProductRepository`] - Catalog and stock movements

pub mod customer;
pub mod invoice;
pub mod product;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

use kirana_core::{Customer, CustomerPatch, Invoice, Money, Product, StockLog};

use crate::error::{DbError, DbResult};

pub use customer::SqliteCustomerRepository;
pub use invoice::SqliteInvoiceRepository;
pub use product::SqliteProductRepository;

// =============================================================================
// Store Traits
// =============================================================================

/// Saved invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persists an invoice with its line items, all or nothing.
    async fn create_invoice(&self, invoice: &Invoice) -> DbResult<()>;

    /// All invoices, newest first.
    async fn list_invoices(&self) -> DbResult<Vec<Invoice>>;

    /// Invoice numbers starting with `prefix` (empty prefix lists all).
    async fn list_invoice_numbers(&self, prefix: &str) -> DbResult<Vec<String>>;

    /// Looks an invoice up by its number.
    async fn get_invoice(&self, invoice_number: &str) -> DbResult<Option<Invoice>>;

    /// Invoices billed to a phone number, newest first.
    async fn list_by_customer(&self, phone: &str) -> DbResult<Vec<Invoice>>;

    /// Adds a payment to an invoice and returns the updated invoice.
    async fn record_payment(&self, invoice_number: &str, amount: Money) -> DbResult<Invoice>;
}

/// Customer records.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>>;

    async fn get(&self, id: &str) -> DbResult<Option<Customer>>;

    /// All customers, by name.
    async fn list(&self) -> DbResult<Vec<Customer>>;

    async fn create(&self, customer: &Customer) -> DbResult<()>;

    /// Applies a patch and returns the updated customer.
    async fn update(&self, id: &str, patch: &CustomerPatch) -> DbResult<Customer>;
}

/// Product catalog and stock movements.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Active products, by name.
    async fn list(&self) -> DbResult<Vec<Product>>;

    async fn get(&self, id: &str) -> DbResult<Option<Product>>;

    /// Active product whose name matches, ignoring case and surrounding space.
    async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>>;

    async fn insert(&self, product: &Product) -> DbResult<()>;

    async fn update(&self, product: &Product) -> DbResult<()>;

    /// Applies a stock delta and appends the matching log entry.
    async fn adjust_stock(&self, adjustment: &StockAdjustment) -> DbResult<StockLog>;

    /// Marks a product inactive. History keeps referring to it.
    async fn soft_delete(&self, id: &str) -> DbResult<()>;

    /// Stock movements, newest first, optionally for one product.
    async fn stock_logs(&self, product_id: Option<&str>) -> DbResult<Vec<StockLog>>;
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// A requested stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: String,
    /// Negative for sales, positive for restocking.
    pub delta: i64,
    pub reason: String,
    pub remarks: Option<String>,
    pub updated_by: String,
}

impl StockAdjustment {
    /// Stock leaving through a saved invoice.
    pub fn sale(product_id: impl Into<String>, quantity: i64, invoice_number: &str) -> Self {
        Self {
            product_id: product_id.into(),
            delta: -quantity,
            reason: "Sale".to_string(),
            remarks: Some(format!("Invoice {}", invoice_number)),
            updated_by: "billing".to_string(),
        }
    }
}

// =============================================================================
// Column Helpers
// =============================================================================

/// Parses a decimal TEXT column.
pub(crate) fn parse_decimal(entity: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| DbError::corrupt(entity, format!("'{}' is not a decimal: {}", value, e)))
}

/// Parses a money TEXT column.
pub(crate) fn parse_money(entity: &str, value: &str) -> DbResult<Money> {
    parse_decimal(entity, value).map(Money::from_decimal)
}

/// Parses a label column into a core enum.
pub(crate) fn parse_label<T>(entity: &str, value: &str) -> DbResult<T>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|e: T::Err| DbError::corrupt(entity, e))
}
