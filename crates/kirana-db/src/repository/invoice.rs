//! # Invoice Repository
//!
//! SQLite storage for saved invoices.
//!
//! ## Tables
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │ invoices                     │ 1    n │ invoice_items                │
//! │  invoice_number (UNIQUE)     │───────►│  invoice_id, position        │
//! │  customer snapshot columns   │        │  description, brand, qty     │
//! │  totals as decimal TEXT      │        │  unit_price, discount_percent│
//! └──────────────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! An invoice and its rows are written in one transaction; a failed row
//! insert leaves no half-saved bill behind.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use kirana_core::{
    CustomerSnapshot, Invoice, InvoiceNumber, InvoiceTotals, LineItem, Money, TaxRate,
};

use super::{parse_decimal, parse_label, parse_money, InvoiceStore};
use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, invoice_date, invoice_time, due_date, payment_mode,
    customer_id, customer_name, customer_phone, customer_address, customer_gstin,
    tax_rate, subtotal, tax_amount, sgst, cgst, grand_total, round_off,
    paid_amount, balance, created_at
"#;

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    invoice_date: NaiveDate,
    invoice_time: NaiveTime,
    due_date: Option<NaiveDate>,
    payment_mode: String,
    customer_id: Option<String>,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    customer_gstin: Option<String>,
    tax_rate: String,
    subtotal: String,
    tax_amount: String,
    sgst: String,
    cgst: String,
    grand_total: String,
    round_off: String,
    paid_amount: String,
    balance: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    description: String,
    brand: String,
    quantity: i64,
    unit_price: String,
    discount_percent: String,
}

impl ItemRow {
    fn into_line_item(self) -> DbResult<LineItem> {
        Ok(LineItem {
            id: self.id,
            description: self.description,
            brand: self.brand,
            quantity: self.quantity,
            unit_price: parse_money("invoice item", &self.unit_price)?,
            discount_percent: parse_decimal("invoice item", &self.discount_percent)?,
        })
    }
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<LineItem>) -> DbResult<Invoice> {
        let money = |value: &str| parse_money("invoice", value);
        let tax_rate = TaxRate::from_percent(parse_decimal("invoice", &self.tax_rate)?);

        Ok(Invoice {
            id: self.id,
            invoice_number: InvoiceNumber::from(self.invoice_number),
            date: self.invoice_date,
            time: self.invoice_time,
            due_date: self.due_date,
            payment_mode: parse_label("invoice", &self.payment_mode)?,
            customer_id: self.customer_id,
            customer: CustomerSnapshot {
                name: self.customer_name,
                phone: self.customer_phone,
                address: self.customer_address,
                gstin: self.customer_gstin,
            },
            items,
            tax_rate,
            totals: InvoiceTotals {
                tax_rate,
                subtotal: money(&self.subtotal)?,
                tax_amount: money(&self.tax_amount)?,
                sgst: money(&self.sgst)?,
                cgst: money(&self.cgst)?,
                grand_total: money(&self.grand_total)?,
                round_off: money(&self.round_off)?,
                paid_amount: money(&self.paid_amount)?,
                balance: money(&self.balance)?,
            },
            created_at: self.created_at,
        })
    }
}

fn text(money: Money) -> String {
    money.amount().to_string()
}

// =============================================================================
// Repository
// =============================================================================

/// SQLite-backed [`InvoiceStore`].
#[derive(Debug, Clone)]
pub struct SqliteInvoiceRepository {
    pool: SqlitePool,
}

impl SqliteInvoiceRepository {
    /// Creates a new SqliteInvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteInvoiceRepository { pool }
    }

    async fn load_items(&self, invoice_id: &str) -> DbResult<Vec<LineItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, description, brand, quantity, unit_price, discount_percent
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY position
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_line_item).collect()
    }

    async fn hydrate(&self, rows: Vec<InvoiceRow>) -> DbResult<Vec<Invoice>> {
        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(&row.id).await?;
            invoices.push(row.into_invoice(items)?);
        }
        Ok(invoices)
    }
}

#[async_trait]
impl InvoiceStore for SqliteInvoiceRepository {
    async fn create_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(
            invoice_number = %invoice.invoice_number,
            items = invoice.items.len(),
            "Inserting invoice"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let totals = &invoice.totals;
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, invoice_date, invoice_time, due_date, payment_mode,
                customer_id, customer_name, customer_phone, customer_address, customer_gstin,
                tax_rate, subtotal, tax_amount, sgst, cgst, grand_total, round_off,
                paid_amount, balance, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                ?19, ?20, ?21
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(invoice.invoice_number.as_str())
        .bind(invoice.date)
        .bind(invoice.time)
        .bind(invoice.due_date)
        .bind(invoice.payment_mode.as_str())
        .bind(&invoice.customer_id)
        .bind(&invoice.customer.name)
        .bind(&invoice.customer.phone)
        .bind(&invoice.customer.address)
        .bind(&invoice.customer.gstin)
        .bind(invoice.tax_rate.percent().to_string())
        .bind(text(totals.subtotal))
        .bind(text(totals.tax_amount))
        .bind(text(totals.sgst))
        .bind(text(totals.cgst))
        .bind(text(totals.grand_total))
        .bind(text(totals.round_off))
        .bind(text(totals.paid_amount))
        .bind(text(totals.balance))
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, invoice.invoice_number.as_str())
            }
            other => other,
        })?;

        for (position, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, position, description, brand,
                    quantity, unit_price, discount_percent
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&invoice.id)
            .bind(position as i64)
            .bind(&item.description)
            .bind(&item.brand)
            .bind(item.quantity)
            .bind(text(item.unit_price))
            .bind(item.discount_percent.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(invoice_number = %invoice.invoice_number, "Invoice saved");
        Ok(())
    }

    async fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices ORDER BY created_at DESC, invoice_number DESC",
            INVOICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed invoices");
        self.hydrate(rows).await
    }

    async fn list_invoice_numbers(&self, prefix: &str) -> DbResult<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM invoices WHERE substr(invoice_number, 1, length(?1)) = ?1",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    async fn get_invoice(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices WHERE invoice_number = ?1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(&row.id).await?;
                Ok(Some(row.into_invoice(items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_customer(&self, phone: &str) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices WHERE customer_phone = ?1 ORDER BY created_at DESC",
            INVOICE_COLUMNS
        ))
        .bind(phone)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn record_payment(&self, invoice_number: &str, amount: Money) -> DbResult<Invoice> {
        debug!(invoice_number = %invoice_number, amount = %amount, "Recording payment");

        let mut invoice = self
            .get_invoice(invoice_number)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_number))?;

        invoice
            .record_payment(amount)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        sqlx::query(
            "UPDATE invoices SET paid_amount = ?2, balance = ?3 WHERE invoice_number = ?1",
        )
        .bind(invoice_number)
        .bind(text(invoice.totals.paid_amount))
        .bind(text(invoice.totals.balance))
        .execute(&self.pool)
        .await?;

        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
