//! # Invoice Document Model
//!
//! The one structure every renderer reads. It is built from a saved
//! invoice and the company details, checked, and carries every number
//! already formatted so no view layer re-derives arithmetic.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  company      name, tagline, address, GSTIN, bank, UPI, terms           │
//! │  meta         invoice no., date dd/mm/yyyy, time, due date, mode        │
//! │  customer     name, phone "XXXXX XXXXX", address, GSTIN                 │
//! │  rows         S.No. description brand qty rate disc% amount             │
//! │  pages        rows split by page size; summary on the last page         │
//! │  tax          rate %, SGST %, CGST %                                    │
//! │  figures      subtotal … balance, all "0.00" strings                    │
//! │  words        "… Rupees Only"                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calculator::InvoiceTotals;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::TaxRate;
use crate::paginate::paginate;
use crate::types::{CompanyDetails, Invoice, LineItem};
use crate::validation::{format_phone, validate_line_item};
use crate::MAX_LINE_ITEMS;

/// Printed where an optional field is absent.
pub const EMPTY_FIELD: &str = "-";

// =============================================================================
// Document Parts
// =============================================================================

/// Invoice header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentMeta {
    pub invoice_number: String,
    pub is_provisional: bool,
    /// `dd/mm/yyyy`
    pub date: String,
    /// `hh:mm AM`
    pub time: String,
    /// `dd/mm/yyyy` or `-`
    pub due_date: String,
    pub payment_mode: String,
}

/// Bill-to block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentCustomer {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub gstin: String,
}

/// One printed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentRow {
    /// 1-based, continuous across pages.
    pub serial: usize,
    pub description: String,
    pub brand: String,
    pub quantity: i64,
    pub unit_price: String,
    pub discount_percent: String,
    pub amount: String,
}

impl DocumentRow {
    fn from_item(serial: usize, item: &LineItem) -> Self {
        Self {
            serial,
            description: item.description.trim().to_string(),
            brand: item.brand.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_fixed(),
            discount_percent: item.discount_percent.normalize().to_string(),
            amount: item.amount().to_fixed(),
        }
    }
}

/// One printed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentPage {
    /// 1-based.
    pub number: usize,
    pub total_pages: usize,
    pub rows: Vec<DocumentRow>,
    /// The totals block and footer print only here.
    pub is_last: bool,
}

/// GST rates as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxBreakdown {
    pub rate: String,
    pub sgst_rate: String,
    pub cgst_rate: String,
}

impl TaxBreakdown {
    fn from_rate(rate: TaxRate) -> Self {
        let half = rate.half_percent().normalize().to_string();
        Self {
            rate: rate.to_string(),
            sgst_rate: half.clone(),
            cgst_rate: half,
        }
    }
}

/// Totals formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CurrencyFigures {
    pub subtotal: String,
    pub tax_amount: String,
    pub sgst: String,
    pub cgst: String,
    pub round_off: String,
    pub grand_total: String,
    pub paid_amount: String,
    pub balance: String,
}

impl CurrencyFigures {
    fn from_totals(totals: &InvoiceTotals) -> Self {
        Self {
            subtotal: totals.subtotal.to_fixed(),
            tax_amount: totals.tax_amount.to_fixed(),
            sgst: totals.sgst.to_fixed(),
            cgst: totals.cgst.to_fixed(),
            round_off: totals.round_off.to_fixed(),
            grand_total: totals.grand_total.to_fixed(),
            paid_amount: totals.paid_amount.to_fixed(),
            balance: totals.balance.to_fixed(),
        }
    }
}

// =============================================================================
// Invoice Document
// =============================================================================

/// Canonical renderer input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDocument {
    pub company: CompanyDetails,
    pub meta: DocumentMeta,
    pub customer: DocumentCustomer,
    /// All rows, in order.
    pub rows: Vec<DocumentRow>,
    /// The same rows split for print.
    pub pages: Vec<DocumentPage>,
    pub tax: TaxBreakdown,
    pub figures: CurrencyFigures,
    pub total_quantity: i64,
    /// Grand total in words.
    pub amount_in_words: String,
}

impl InvoiceDocument {
    /// Builds the document for a saved invoice.
    ///
    /// ## Errors
    /// - `Validation` when the company name, invoice number or line items
    ///   are missing, or a line item is invalid
    /// - `TooManyLineItems` past [`MAX_LINE_ITEMS`]
    /// - `TotalsMismatch` when the stored totals disagree with the items
    pub fn build(
        company: &CompanyDetails,
        invoice: &Invoice,
        page_size: NonZeroUsize,
    ) -> CoreResult<Self> {
        if company.name.trim().is_empty() {
            return Err(ValidationError::required("company name").into());
        }
        if invoice.invoice_number.as_str().trim().is_empty() {
            return Err(ValidationError::required("invoice number").into());
        }
        if invoice.items.is_empty() {
            return Err(ValidationError::required("line items").into());
        }
        if invoice.items.len() > MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLineItems {
                max: MAX_LINE_ITEMS,
            });
        }
        for item in &invoice.items {
            validate_line_item(item)?;
        }

        if invoice.recompute_totals()? != invoice.totals {
            return Err(CoreError::TotalsMismatch {
                invoice_number: invoice.invoice_number.to_string(),
            });
        }

        let rows: Vec<DocumentRow> = invoice
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| DocumentRow::from_item(i + 1, item))
            .collect();

        let chunks = paginate(&rows, page_size);
        let total_pages = chunks.len();
        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, rows)| DocumentPage {
                number: i + 1,
                total_pages,
                rows,
                is_last: i + 1 == total_pages,
            })
            .collect();

        let customer = &invoice.customer;

        Ok(Self {
            company: company.clone(),
            meta: DocumentMeta {
                invoice_number: invoice.invoice_number.to_string(),
                is_provisional: invoice.invoice_number.is_provisional(),
                date: invoice.date.format("%d/%m/%Y").to_string(),
                time: invoice.time.format("%I:%M %p").to_string(),
                due_date: invoice
                    .due_date
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| EMPTY_FIELD.to_string()),
                payment_mode: invoice.payment_mode.to_string(),
            },
            customer: DocumentCustomer {
                name: customer.name.trim().to_string(),
                phone: format_phone(&customer.phone),
                address: customer.address.trim().to_string(),
                gstin: customer
                    .gstin
                    .clone()
                    .filter(|g| !g.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_FIELD.to_string()),
            },
            rows,
            pages,
            tax: TaxBreakdown::from_rate(invoice.tax_rate),
            figures: CurrencyFigures::from_totals(&invoice.totals),
            total_quantity: invoice.total_quantity(),
            amount_in_words: invoice.totals.amount_in_words(),
        })
    }

    /// Page holding the totals block.
    pub fn last_page(&self) -> Option<&DocumentPage> {
        self.pages.last()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
