//! # Report Commands
//!
//! Dashboard figures. Each command loads what it needs and hands it to the
//! pure aggregations in `kirana_core::reports`.

use chrono::NaiveDate;
use serde::Deserialize;

use kirana_core::reports::{self, DailySales, ProductSales, SalesSummary, DEFAULT_REPORT_LIMIT};
use kirana_core::{InvoiceSummary, Product};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitArgs {
    pub limit: Option<usize>,
}

impl LimitArgs {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_REPORT_LIMIT)
    }
}

/// Inclusive date window; either end may be open.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRangeArgs {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Headline numbers: sales, orders, customers, GST collected, stock value.
pub async fn report_summary(app: &AppState) -> Result<SalesSummary, ApiError> {
    let invoices = app.db.invoices().list_invoices().await?;
    let customers = app.db.customers().list().await?;
    let products = app.db.products().list().await?;
    Ok(reports::summary(&invoices, &customers, &products))
}

pub async fn sales_by_date(
    app: &AppState,
    args: DateRangeArgs,
) -> Result<Vec<DailySales>, ApiError> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(ApiError::validation(format!(
                "from ({}) must not be after to ({})",
                from, to
            )));
        }
    }

    let invoices = app.db.invoices().list_invoices().await?;
    Ok(reports::sales_by_date(&invoices, args.from, args.to))
}

pub async fn top_selling_products(
    app: &AppState,
    args: LimitArgs,
) -> Result<Vec<ProductSales>, ApiError> {
    let invoices = app.db.invoices().list_invoices().await?;
    Ok(reports::top_selling_products(&invoices, args.limit()))
}

pub async fn recent_transactions(
    app: &AppState,
    args: LimitArgs,
) -> Result<Vec<InvoiceSummary>, ApiError> {
    let invoices = app.db.invoices().list_invoices().await?;
    Ok(reports::recent_transactions(&invoices, args.limit()))
}

/// Products at or below their reorder level.
pub async fn low_stock(app: &AppState) -> Result<Vec<Product>, ApiError> {
    let products = app.db.products().list().await?;
    Ok(reports::low_stock(&products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::invoice::{save_invoice, SaveInvoiceArgs};
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, DbState, LineItemInput};
    use kirana_core::{CustomerSnapshot, Money};
    use kirana_db::InMemoryStore;
    use rust_decimal::Decimal;

    async fn app_with_bills() -> (AppState, InMemoryStore) {
        let store = InMemoryStore::new();
        let app = AppState::new(ConfigState::default(), DbState::in_memory(store.clone()));

        for (description, qty, rupees, phone) in [
            ("Mixer Grinder", 2, 3_000, "9876543210"),
            ("Ceiling Fan", 1, 2_500, "9123456780"),
        ] {
            app.draft.with_draft_mut(|draft| {
                draft
                    .add_item(LineItemInput {
                        description: description.to_string(),
                        brand: None,
                        quantity: qty,
                        unit_price: Money::from_rupees(rupees),
                        discount_percent: Decimal::ZERO,
                    })
                    .unwrap();
                draft.set_customer(CustomerSnapshot {
                    name: "Walk-in".to_string(),
                    phone: phone.to_string(),
                    ..Default::default()
                });
            });
            save_invoice(&app, SaveInvoiceArgs::default()).await.unwrap();
        }

        (app, store)
    }

    #[tokio::test]
    async fn test_summary_over_saved_bills() {
        let (app, _store) = app_with_bills().await;

        let summary = report_summary(&app).await.unwrap();
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_customers, 2);
        // (6000 + 2500) × 1.18
        assert_eq!(summary.total_sales, Money::from_rupees(10_030));
        assert_eq!(summary.total_gst, Money::from_rupees(1_530));
    }

    #[tokio::test]
    async fn test_top_sellers_and_recent() {
        let (app, _store) = app_with_bills().await;

        let top = top_selling_products(&app, LimitArgs { limit: Some(1) })
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].description, "Mixer Grinder");

        let recent = recent_transactions(&app, LimitArgs::default()).await.unwrap();
        assert_eq!(recent.len(), 2);

        let days = sales_by_date(&app, DateRangeArgs::default()).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].orders, 2);
    }

    #[tokio::test]
    async fn test_sales_by_date_window() {
        let (app, _store) = app_with_bills().await;
        let today = chrono::Local::now().date_naive();
        let window = |from, to| DateRangeArgs { from, to };

        let days = sales_by_date(&app, window(Some(today), Some(today))).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, today);

        let tomorrow = today.succ_opt();
        let days = sales_by_date(&app, window(tomorrow, None)).await.unwrap();
        assert!(days.is_empty());

        let err = sales_by_date(&app, window(tomorrow, Some(today))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_reports_surface_read_failures() {
        let (app, store) = app_with_bills().await;
        store.set_fail_reads(true);

        let err = report_summary(&app).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);
    }
}
