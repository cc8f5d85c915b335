//! # kirana-core: Pure Billing Logic for Kirana Billing
//!
//! This crate is the **single source of truth** for invoice math. Every
//! screen and renderer calls into it; none of them re-derive tax, rounding
//! or words on their own.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Kirana Billing Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Counter App (apps/counter)                      │   │
//! │  │    Draft bill ──► Save ──► Print / Export renderers             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kirana-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │  │  money   │ │ calculator │ │  words   │ │     document     │ │   │
//! │  │  │  Money   │ │ GST, round │ │ Lakh,    │ │ pages, figures,  │ │   │
//! │  │  │  TaxRate │ │ off, bal.  │ │ Crore    │ │ amount in words  │ │   │
//! │  │  └──────────┘ └────────────┘ └──────────┘ └──────────────────┘ │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │  │ paginate │ │ numbering  │ │ reports  │ │    validation    │ │   │
//! │  │  └──────────┘ └────────────┘ └──────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                kirana-db (Storage Layer)                        │   │
//! │  │        Repository traits, SQLite and in-memory stores           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` and `TaxRate`
//! - [`types`] - Domain types (LineItem, Invoice, Customer, Product, ...)
//! - [`calculator`] - Invoice totals (subtotal, GST split, round off, balance)
//! - [`words`] - Amount in words on the Indian scale
//! - [`paginate`] - Fixed-size pages of line items for print layout
//! - [`numbering`] - Daily sequential invoice numbers
//! - [`document`] - Canonical renderer input
//! - [`reports`] - Sales and stock aggregation
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kirana_core::calculator::compute_totals;
//! use kirana_core::money::{Money, TaxRate};
//! use kirana_core::types::LineItem;
//!
//! let tv = LineItem::new("TV", 1, Money::from_rupees(32000));
//! let totals = compute_totals(&[tv], TaxRate::from_percent_u32(18), Money::zero()).unwrap();
//!
//! assert_eq!(totals.grand_total, Money::from_rupees(37760));
//! assert_eq!(totals.sgst, Money::from_rupees(2880));
//! assert_eq!(
//!     totals.amount_in_words(),
//!     "Thirty Seven Thousand Seven Hundred Sixty Rupees Only"
//! );
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod document;
pub mod error;
pub mod money;
pub mod numbering;
pub mod paginate;
pub mod reports;
pub mod types;
pub mod validation;
pub mod words;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{compute_totals, InvoiceTotals};
pub use document::InvoiceDocument;
pub use error::{CoreError, CoreResult, NumberingError, ValidationError};
pub use money::{Money, TaxRate};
pub use numbering::InvoiceNumber;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single invoice.
///
/// ## Business Reason
/// Ten pages of ten rows is the longest bill the counter has ever printed.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches typing 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Highest unit price accepted, in rupees (one hundred crore).
///
/// A full bill at this price (100 rows of 9 999 units, 100% GST) stays far
/// inside the decimal range.
pub const MAX_UNIT_PRICE_RUPEES: i64 = 1_00_00_00_000;

/// GST slabs offered by the billing screen.
///
/// The calculator accepts any non-negative rate; this list only feeds
/// input collection.
pub const GST_SLABS: [u32; 3] = [0, 12, 18];
