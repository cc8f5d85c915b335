//! # Invoice Commands
//!
//! Saving the draft as an invoice, printing, exporting, and invoice history.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    save_invoice                                         │
//! │                                                                         │
//! │  1. draft.checkout()            ──► VALIDATION_ERROR, nothing written  │
//! │  2. allocate number             ──► read failure: reject or INV<ms>    │
//! │  3. upsert customer by phone    ──► PERSISTENCE_ERROR, nothing saved   │
//! │     (commits on its own; the invoice row references it)                │
//! │  4. create_invoice              ──► PERSISTENCE_ERROR, nothing printed │
//! │     the customer from step 3 stays; a retry updates it in place        │
//! │  5. clear draft                                                        │
//! │  6. deduct stock (best effort, failures only logged)                   │
//! │  7. action = print / export:                                           │
//! │        renderer.render(doc) ──► RenderJob                              │
//! │        job.ready().await     ◄── one-shot readiness signal             │
//! │        spooler.submit(doc)       only after the signal                 │
//! │     failure here is reported as renderError; the invoice stays saved   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kirana_core::numbering::{self, InvoiceNumber};
use kirana_core::validation::normalize_phone;
use kirana_core::{
    Customer, CustomerSnapshot, Invoice, InvoiceDocument, InvoiceSummary, Money, NumberingError,
    ValidationError,
};
use kirana_db::StockAdjustment;

use crate::error::ApiError;
use crate::render::{
    render_and_spool, ExportFormat, HtmlPrintRenderer, PrintSpooler, Renderer, SpoolReceipt,
};
use crate::state::{AppState, Draft, NumberingFallback};

/// What to do with the invoice once it is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SaveAction {
    /// Persist only.
    #[default]
    Save,
    /// Persist, then send the print layout to the printer spool.
    Print,
    /// Persist, then write an export file.
    Export {
        #[serde(default)]
        format: ExportFormat,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveInvoiceArgs {
    pub action: SaveAction,
}

/// Result of a save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub invoice: Invoice,
    /// Set when the number came from the provisional fallback.
    pub provisional: bool,
    /// Where the print or export output went.
    pub spooled: Option<SpoolReceipt>,
    /// Rendering or spooling failure. The invoice is saved regardless.
    pub render_error: Option<ApiError>,
    /// Stock movements that could not be recorded.
    pub stock_warnings: Vec<String>,
}

/// Number the next save would get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextInvoiceNumber {
    pub invoice_number: String,
    pub provisional: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceNumberArgs {
    pub invoice_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInvoiceArgs {
    pub invoice_number: String,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInvoicesArgs {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentArgs {
    pub invoice_number: String,
    pub amount: Money,
}

// =============================================================================
// Numbering
// =============================================================================

/// Allocates from today's stored numbers, or falls back per configuration.
async fn allocate_number(app: &AppState, now: DateTime<Local>) -> Result<InvoiceNumber, ApiError> {
    let today = now.date_naive();
    let prefix = numbering::day_prefix(today);

    match app.db.invoices().list_invoice_numbers(&prefix).await {
        Ok(existing) => Ok(numbering::allocate(&existing, today)),
        Err(e) => match app.config.numbering_fallback {
            NumberingFallback::Reject => Err(NumberingError::SourceUnavailable {
                reason: e.to_string(),
            }
            .into()),
            NumberingFallback::Provisional => {
                let number = numbering::provisional(now.with_timezone(&Utc));
                warn!(
                    invoice_number = %number,
                    error = %e,
                    "Invoice numbers unreadable, issuing provisional number"
                );
                Ok(number)
            }
        },
    }
}

/// Peeks at the number the next save would get.
pub async fn next_invoice_number(app: &AppState) -> Result<NextInvoiceNumber, ApiError> {
    let number = allocate_number(app, Local::now()).await?;
    Ok(NextInvoiceNumber {
        provisional: number.is_provisional(),
        invoice_number: number.into(),
    })
}

// =============================================================================
// Save
// =============================================================================

/// Finds the customer by phone and refreshes their details, or creates one.
async fn upsert_customer(
    app: &AppState,
    snapshot: &CustomerSnapshot,
    now: DateTime<Utc>,
) -> Result<String, ApiError> {
    let customers = app.db.customers();

    match customers.find_by_phone(&snapshot.phone).await? {
        Some(existing) => {
            let updated = customers
                .update(&existing.id, &Customer::patch_from(snapshot))
                .await?;
            debug!(customer_id = %updated.id, "Customer updated");
            Ok(updated.id)
        }
        None => {
            let customer = Customer::from_snapshot(snapshot, now);
            customers.create(&customer).await?;
            debug!(customer_id = %customer.id, "Customer created");
            Ok(customer.id)
        }
    }
}

/// Takes sold units out of stock for rows that name a catalog product.
async fn deduct_stock(app: &AppState, invoice: &Invoice) -> Vec<String> {
    let products = app.db.products();
    let number = invoice.invoice_number.as_str();
    let mut warnings = Vec::new();

    for item in &invoice.items {
        let product = match products.find_by_name(&item.description).await {
            Ok(Some(product)) => product,
            Ok(None) => continue,
            Err(e) => {
                warn!(description = %item.description, error = %e, "Product lookup failed");
                warnings.push(format!("{}: {}", item.description, e));
                continue;
            }
        };

        let adjustment = StockAdjustment::sale(product.id.as_str(), item.quantity, number);
        match products.adjust_stock(&adjustment).await {
            Ok(log) => debug!(
                product_id = %product.id,
                new_stock = log.new_stock,
                "Stock deducted"
            ),
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "Stock deduction failed");
                warnings.push(format!("{}: {}", item.description, e));
            }
        }
    }

    warnings
}

fn document_for(app: &AppState, invoice: &Invoice) -> Result<InvoiceDocument, ApiError> {
    Ok(InvoiceDocument::build(
        &app.config.company,
        invoice,
        app.config.page_size,
    )?)
}

/// Renders and spools; the invoice is already saved so failure is reported,
/// not raised.
async fn deliver(
    app: &AppState,
    invoice: &Invoice,
    renderer: &dyn Renderer,
    spooler: &dyn PrintSpooler,
) -> (Option<SpoolReceipt>, Option<ApiError>) {
    let result = async {
        let document = document_for(app, invoice)?;
        Ok::<_, ApiError>(render_and_spool(renderer, spooler, &document).await?)
    }
    .await;

    match result {
        Ok(receipt) => (Some(receipt), None),
        Err(e) => {
            warn!(
                invoice_number = %invoice.invoice_number,
                renderer = renderer.name(),
                "Invoice saved but not rendered: {}",
                e.message
            );
            (None, Some(e))
        }
    }
}

/// Saves the draft as an invoice and optionally prints or exports it.
pub async fn save_invoice(app: &AppState, args: SaveInvoiceArgs) -> Result<SaveOutcome, ApiError> {
    let checked = app.draft.with_draft(Draft::checkout)?;
    let now = Local::now();

    let number = allocate_number(app, now).await?;
    let customer_id = upsert_customer(app, &checked.customer, now.with_timezone(&Utc)).await?;

    let invoice = checked.into_invoice(number, Some(customer_id), now);
    app.db.invoices().create_invoice(&invoice).await?;

    info!(
        invoice_number = %invoice.invoice_number,
        items = invoice.items.len(),
        grand_total = %invoice.totals.grand_total,
        "Invoice saved"
    );

    app.draft.with_draft_mut(Draft::clear);

    let stock_warnings = deduct_stock(app, &invoice).await;

    let (spooled, render_error) = match args.action {
        SaveAction::Save => (None, None),
        SaveAction::Print => {
            deliver(app, &invoice, &HtmlPrintRenderer, app.printer.as_ref()).await
        }
        SaveAction::Export { format } => {
            let renderer = format.renderer(app.config.receipt_width);
            deliver(app, &invoice, renderer.as_ref(), app.exporter.as_ref()).await
        }
    };

    Ok(SaveOutcome {
        provisional: invoice.invoice_number.is_provisional(),
        invoice,
        spooled,
        render_error,
        stock_warnings,
    })
}

/// Document model for the draft as it would print, numbered with the
/// next number. Nothing is saved.
pub async fn preview_invoice(app: &AppState) -> Result<InvoiceDocument, ApiError> {
    let checked = app.draft.with_draft(Draft::checkout)?;
    let now = Local::now();
    let number = allocate_number(app, now).await?;

    let invoice = checked.into_invoice(number, None, now);
    document_for(app, &invoice)
}

// =============================================================================
// Stored Invoices
// =============================================================================

async fn load_invoice(app: &AppState, invoice_number: &str) -> Result<Invoice, ApiError> {
    app.db
        .invoices()
        .get_invoice(invoice_number.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", invoice_number))
}

/// Prints a stored invoice again.
pub async fn reprint_invoice(
    app: &AppState,
    args: InvoiceNumberArgs,
) -> Result<SpoolReceipt, ApiError> {
    let invoice = load_invoice(app, &args.invoice_number).await?;
    let document = document_for(app, &invoice)?;

    let receipt = render_and_spool(&HtmlPrintRenderer, app.printer.as_ref(), &document).await?;
    info!(invoice_number = %invoice.invoice_number, "Invoice reprinted");
    Ok(receipt)
}

/// Writes a stored invoice to the export directory.
pub async fn export_invoice(
    app: &AppState,
    args: ExportInvoiceArgs,
) -> Result<SpoolReceipt, ApiError> {
    let invoice = load_invoice(app, &args.invoice_number).await?;
    let document = document_for(app, &invoice)?;

    let renderer = args.format.renderer(app.config.receipt_width);
    Ok(render_and_spool(renderer.as_ref(), app.exporter.as_ref(), &document).await?)
}

/// Invoice history, newest first.
pub async fn list_invoices(app: &AppState) -> Result<Vec<InvoiceSummary>, ApiError> {
    let invoices = app.db.invoices().list_invoices().await?;
    Ok(invoices.iter().map(Invoice::summary).collect())
}

pub async fn get_invoice(app: &AppState, args: InvoiceNumberArgs) -> Result<Invoice, ApiError> {
    load_invoice(app, &args.invoice_number).await
}

/// Bills for one phone number, newest first.
pub async fn list_customer_invoices(
    app: &AppState,
    args: CustomerInvoicesArgs,
) -> Result<Vec<InvoiceSummary>, ApiError> {
    let phone = normalize_phone(&args.phone)?;
    let invoices = app.db.invoices().list_by_customer(&phone).await?;
    Ok(invoices.iter().map(Invoice::summary).collect())
}

/// Records money received against an earlier bill.
pub async fn record_payment(app: &AppState, args: RecordPaymentArgs) -> Result<Invoice, ApiError> {
    if !args.amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        }
        .into());
    }

    let invoice = app
        .db
        .invoices()
        .record_payment(args.invoice_number.trim(), args.amount)
        .await?;

    info!(
        invoice_number = %invoice.invoice_number,
        amount = %args.amount,
        balance = %invoice.totals.balance,
        "Payment recorded"
    );
    Ok(invoice)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use kirana_core::{Product, RecordStatus, StockChange, TaxRate};
    use kirana_db::{
        CustomerStore, DbError, DbResult, InMemoryStore, InvoiceStore, ProductStore,
    };

    use crate::error::ErrorCode;
    use crate::render::{RenderError, RenderedDocument};
    use crate::state::{ConfigState, DbState, LineItemInput};

    #[derive(Default)]
    struct CountingSpooler {
        submitted: AtomicUsize,
    }

    #[async_trait]
    impl PrintSpooler for CountingSpooler {
        async fn submit(&self, document: &RenderedDocument) -> Result<SpoolReceipt, RenderError> {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            Ok(SpoolReceipt {
                renderer: document.renderer.to_string(),
                path: document.file_name.clone().into(),
                bytes: document.body.len(),
            })
        }
    }

    struct JammedSpooler;

    #[async_trait]
    impl PrintSpooler for JammedSpooler {
        async fn submit(&self, _document: &RenderedDocument) -> Result<SpoolReceipt, RenderError> {
            Err(RenderError::Spool {
                path: "/dev/lp0".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "paper jam"),
            })
        }
    }

    /// Invoice store whose number listing always fails.
    struct UnreadableNumbers(InMemoryStore);

    #[async_trait]
    impl InvoiceStore for UnreadableNumbers {
        async fn create_invoice(&self, invoice: &Invoice) -> DbResult<()> {
            self.0.create_invoice(invoice).await
        }
        async fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
            self.0.list_invoices().await
        }
        async fn list_invoice_numbers(&self, _prefix: &str) -> DbResult<Vec<String>> {
            Err(DbError::ConnectionFailed("index offline".to_string()))
        }
        async fn get_invoice(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
            self.0.get_invoice(invoice_number).await
        }
        async fn list_by_customer(&self, phone: &str) -> DbResult<Vec<Invoice>> {
            self.0.list_by_customer(phone).await
        }
        async fn record_payment(&self, invoice_number: &str, amount: Money) -> DbResult<Invoice> {
            self.0.record_payment(invoice_number, amount).await
        }
    }

    /// Invoice store that refuses every new invoice.
    struct RefusingInvoices(InMemoryStore);

    #[async_trait]
    impl InvoiceStore for RefusingInvoices {
        async fn create_invoice(&self, _invoice: &Invoice) -> DbResult<()> {
            Err(DbError::TransactionFailed("disk full".to_string()))
        }
        async fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
            self.0.list_invoices().await
        }
        async fn list_invoice_numbers(&self, prefix: &str) -> DbResult<Vec<String>> {
            self.0.list_invoice_numbers(prefix).await
        }
        async fn get_invoice(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
            self.0.get_invoice(invoice_number).await
        }
        async fn list_by_customer(&self, phone: &str) -> DbResult<Vec<Invoice>> {
            self.0.list_by_customer(phone).await
        }
        async fn record_payment(&self, invoice_number: &str, amount: Money) -> DbResult<Invoice> {
            self.0.record_payment(invoice_number, amount).await
        }
    }

    struct Harness {
        app: AppState,
        store: InMemoryStore,
        printer: Arc<CountingSpooler>,
        exporter: Arc<CountingSpooler>,
    }

    fn harness_with(config: ConfigState, store: InMemoryStore, db: DbState) -> Harness {
        let printer = Arc::new(CountingSpooler::default());
        let exporter = Arc::new(CountingSpooler::default());
        let app = AppState::with_spoolers(config, db, printer.clone(), exporter.clone());
        Harness {
            app,
            store,
            printer,
            exporter,
        }
    }

    fn harness() -> Harness {
        let store = InMemoryStore::new();
        harness_with(ConfigState::default(), store.clone(), DbState::in_memory(store))
    }

    fn unreadable_numbers(fallback: NumberingFallback) -> Harness {
        let store = InMemoryStore::new();
        let mut config = ConfigState::default();
        config.numbering_fallback = fallback;
        let db = DbState::new(
            Arc::new(UnreadableNumbers(store.clone())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        harness_with(config, store, db)
    }

    fn fill_tv_draft(app: &AppState) {
        app.draft.with_draft_mut(|draft| {
            draft
                .add_item(LineItemInput {
                    description: "Samsung LED TV 43\"".to_string(),
                    brand: Some("Samsung".to_string()),
                    quantity: 1,
                    unit_price: Money::from_rupees(32000),
                    discount_percent: Decimal::ZERO,
                })
                .unwrap();
            draft.set_customer(CustomerSnapshot {
                name: "Asha Verma".to_string(),
                phone: "98765 43210".to_string(),
                address: "12 MG Road".to_string(),
                gstin: None,
            });
            draft.set_paid_amount(Money::from_rupees(30000)).unwrap();
        });
    }

    fn tv_product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "prod-tv".to_string(),
            name: "samsung led tv 43\"".to_string(),
            brand: "Samsung".to_string(),
            category: "Television".to_string(),
            description: String::new(),
            price: Money::from_rupees(32000),
            gst: Decimal::from(18),
            stock,
            min_stock: 2,
            unit: "pcs".to_string(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn print() -> SaveInvoiceArgs {
        SaveInvoiceArgs {
            action: SaveAction::Print,
        }
    }

    #[tokio::test]
    async fn test_save_and_print_tv_bill() {
        let h = harness();
        fill_tv_draft(&h.app);

        let outcome = save_invoice(&h.app, print()).await.unwrap();
        let today = numbering::day_prefix(Local::now().date_naive());

        assert_eq!(outcome.invoice.invoice_number.as_str(), format!("{}0001", today));
        assert!(!outcome.provisional);
        assert_eq!(outcome.invoice.totals.grand_total, Money::from_rupees(37760));
        assert_eq!(outcome.invoice.totals.balance, Money::from_rupees(7760));
        assert!(outcome.render_error.is_none());
        assert_eq!(outcome.spooled.unwrap().renderer, "html");
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(h.exporter.submitted.load(Ordering::SeqCst), 0);

        // Draft is ready for the next customer.
        assert!(h.app.draft.snapshot().is_empty());

        // Customer was filed under the normalized phone.
        let customer = h.store.find_by_phone("9876543210").await.unwrap().unwrap();
        assert_eq!(outcome.invoice.customer_id.as_deref(), Some(customer.id.as_str()));
    }

    #[tokio::test]
    async fn test_numbers_increase_within_a_day() {
        let h = harness();

        fill_tv_draft(&h.app);
        let first = save_invoice(&h.app, SaveInvoiceArgs::default()).await.unwrap();
        fill_tv_draft(&h.app);
        let second = save_invoice(&h.app, SaveInvoiceArgs::default()).await.unwrap();

        assert_eq!(
            numbering::sequence_of(second.invoice.invoice_number.as_str()),
            numbering::sequence_of(first.invoice.invoice_number.as_str()) + 1
        );
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 0);

        // The second save updated the existing customer rather than adding one.
        assert_eq!(CustomerStore::list(&h.store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_renders_nothing() {
        let h = harness();
        fill_tv_draft(&h.app);
        h.store.set_fail_writes(true);

        let err = save_invoice(&h.app, print()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 0);
        assert!(!h.app.draft.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_refused_invoice_keeps_customer_only() {
        let store = InMemoryStore::new();
        let db = DbState::new(
            Arc::new(RefusingInvoices(store.clone())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        let h = harness_with(ConfigState::default(), store, db);
        fill_tv_draft(&h.app);

        let err = save_invoice(&h.app, print()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 0);
        assert!(h.store.list_invoices().await.unwrap().is_empty());
        assert!(!h.app.draft.snapshot().is_empty());

        // The customer upsert had already committed; retrying reuses it.
        assert!(h.store.find_by_phone("9876543210").await.unwrap().is_some());
        save_invoice(&h.app, print()).await.unwrap_err();
        assert_eq!(CustomerStore::list(&h.store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_storage() {
        let h = harness();

        let err = save_invoice(&h.app, print()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(h.store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_numbers_rejected_by_default() {
        let h = unreadable_numbers(NumberingFallback::Reject);
        fill_tv_draft(&h.app);

        let err = save_invoice(&h.app, print()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert!(h.store.list_invoices().await.unwrap().is_empty());
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_numbers_fall_back_to_provisional() {
        let h = unreadable_numbers(NumberingFallback::Provisional);
        fill_tv_draft(&h.app);

        let outcome = save_invoice(&h.app, print()).await.unwrap();

        assert!(outcome.provisional);
        assert!(outcome.invoice.invoice_number.as_str().starts_with("INV"));
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 1);

        let next = next_invoice_number(&h.app).await.unwrap();
        assert!(next.provisional);
    }

    #[tokio::test]
    async fn test_render_failure_keeps_invoice() {
        let store = InMemoryStore::new();
        let app = AppState::with_spoolers(
            ConfigState::default(),
            DbState::in_memory(store.clone()),
            Arc::new(JammedSpooler),
            Arc::new(JammedSpooler),
        );
        fill_tv_draft(&app);

        let outcome = save_invoice(&app, print()).await.unwrap();

        let render_error = outcome.render_error.unwrap();
        assert_eq!(render_error.code, ErrorCode::RenderingError);
        assert!(outcome.spooled.is_none());

        let stored = store
            .get_invoice(outcome.invoice.invoice_number.as_str())
            .await
            .unwrap();
        assert!(stored.is_some());
        assert!(app.draft.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_export_goes_to_export_spooler() {
        let h = harness();
        fill_tv_draft(&h.app);

        let outcome = save_invoice(
            &h.app,
            SaveInvoiceArgs {
                action: SaveAction::Export {
                    format: ExportFormat::Text,
                },
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.spooled.unwrap().renderer, "text");
        assert_eq!(h.exporter.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(h.printer.submitted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_deducts_matching_stock() {
        let store = InMemoryStore::with_products(vec![tv_product(5)]).await;
        let h = harness_with(
            ConfigState::default(),
            store.clone(),
            DbState::in_memory(store),
        );
        fill_tv_draft(&h.app);

        let outcome = save_invoice(&h.app, SaveInvoiceArgs::default()).await.unwrap();

        assert!(outcome.stock_warnings.is_empty());
        let product = ProductStore::get(&h.store, "prod-tv").await.unwrap().unwrap();
        assert_eq!(product.stock, 4);

        let logs = h.store.stock_logs(Some("prod-tv")).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].change_type, StockChange::Out);
        assert_eq!(
            logs[0].remarks.as_deref(),
            Some(format!("Invoice {}", outcome.invoice.invoice_number).as_str())
        );
    }

    #[tokio::test]
    async fn test_reprint_and_export_stored_invoice() {
        let h = harness();
        fill_tv_draft(&h.app);
        let saved = save_invoice(&h.app, SaveInvoiceArgs::default()).await.unwrap();
        let number = saved.invoice.invoice_number.as_str().to_string();

        let receipt = reprint_invoice(
            &h.app,
            InvoiceNumberArgs {
                invoice_number: number.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(receipt.renderer, "html");

        let receipt = export_invoice(
            &h.app,
            ExportInvoiceArgs {
                invoice_number: number,
                format: ExportFormat::Csv,
            },
        )
        .await
        .unwrap();
        assert!(receipt.path.to_string_lossy().ends_with(".csv"));

        let err = reprint_invoice(
            &h.app,
            InvoiceNumberArgs {
                invoice_number: "2401019999".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_history_and_payments() {
        let h = harness();
        fill_tv_draft(&h.app);
        let saved = save_invoice(&h.app, SaveInvoiceArgs::default()).await.unwrap();
        let number = saved.invoice.invoice_number.as_str().to_string();

        let list = list_invoices(&h.app).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].grand_total, Money::from_rupees(37760));

        let bills = list_customer_invoices(
            &h.app,
            CustomerInvoicesArgs {
                phone: "+91 98765-43210".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(bills.len(), 1);

        let paid = record_payment(
            &h.app,
            RecordPaymentArgs {
                invoice_number: number.clone(),
                amount: Money::from_rupees(7760),
            },
        )
        .await
        .unwrap();
        assert!(paid.totals.balance.is_zero());

        let err = record_payment(
            &h.app,
            RecordPaymentArgs {
                invoice_number: number,
                amount: Money::zero(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_preview_does_not_save() {
        let h = harness();
        fill_tv_draft(&h.app);
        h.app
            .draft
            .with_draft_mut(|d| d.set_tax_rate(TaxRate::from_percent_u32(12)))
            .unwrap();

        let document = preview_invoice(&h.app).await.unwrap();

        assert_eq!(document.tax.sgst_rate, "6");
        assert_eq!(document.pages.len(), 1);
        assert!(h.store.list_invoices().await.unwrap().is_empty());
        assert!(!h.app.draft.snapshot().is_empty());
    }
}
