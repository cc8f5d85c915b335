//! # Customer Commands
//!
//! Lookup for the billing screen's customer fields and the customer report.
//!
//! Customer records are written only by the save flow (upsert by phone).

use serde::Deserialize;
use tracing::{debug, warn};

use kirana_core::reports::{self, CustomerStats};
use kirana_core::validation::normalize_phone;
use kirana_core::Customer;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneArgs {
    pub phone: String,
}

/// All customers, by name.
///
/// A store read failure degrades to an empty list so the billing screen
/// stays usable; the failure is logged.
pub async fn list_customers(app: &AppState) -> Result<Vec<Customer>, ApiError> {
    match app.db.customers().list().await {
        Ok(customers) => Ok(customers),
        Err(e) => {
            warn!(error = %e, "Customer list unavailable, showing none");
            Ok(Vec::new())
        }
    }
}

/// Customer filed under a phone number, if any.
///
/// Used to prefill name and address when a known phone is typed.
pub async fn find_customer(app: &AppState, args: PhoneArgs) -> Result<Option<Customer>, ApiError> {
    let phone = normalize_phone(&args.phone)?;
    debug!(phone = %phone, "find_customer command");
    Ok(app.db.customers().find_by_phone(&phone).await?)
}

/// Billing totals for one customer.
pub async fn customer_stats(app: &AppState, args: PhoneArgs) -> Result<CustomerStats, ApiError> {
    let phone = normalize_phone(&args.phone)?;
    let customer = app
        .db
        .customers()
        .find_by_phone(&phone)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &phone))?;

    let invoices = app.db.invoices().list_by_customer(&phone).await?;
    Ok(reports::customer_stats(&customer, &invoices))
}
