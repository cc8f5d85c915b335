//! # Commands Module
//!
//! Every operation the billing screen can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (request routing)
//! ├── draft.rs     ◄─── Draft bill editing
//! ├── invoice.rs   ◄─── Save / print / export, history, payments
//! ├── product.rs   ◄─── Catalog and stock
//! ├── customer.rs  ◄─── Customer lookup and statistics
//! ├── report.rs    ◄─── Dashboard reports
//! └── config.rs    ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Caller (one JSON object per line on stdin)                            │
//! │  ──────                                                                 │
//! │  {"command": "search_products", "args": {"query": "tv"}}               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  dispatch(&AppState, Request)                                          │
//! │         │  args ──► typed struct (serde)   bad args ──► VALIDATION     │
//! │         ▼                                                               │
//! │  async fn search_products(app: &AppState, query, limit)                │
//! │      -> Result<Vec<Product>, ApiError>                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  {"ok": true, "data": [...]}   or   {"ok": false, "error": {...}}      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod customer;
pub mod draft;
pub mod invoice;
pub mod product;
pub mod report;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// One command invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok { ok: bool, data: Value },
    Err { ok: bool, error: ApiError },
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Response::Ok { ok: true, data }
    }

    pub fn error(error: ApiError) -> Self {
        Response::Err { ok: false, error }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}

impl From<Result<Value, ApiError>> for Response {
    fn from(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(error) => Response::error(error),
        }
    }
}

/// Parses command arguments. Missing args count as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T, ApiError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };

    serde_json::from_value(args)
        .map_err(|e| ApiError::validation(format!("Invalid arguments for {}: {}", command, e)))
}

fn reply<T: Serialize>(result: Result<T, ApiError>) -> Result<Value, ApiError> {
    let value = result?;
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Could not serialize response: {}", e)))
}

/// Routes a request to its command.
pub async fn dispatch(app: &AppState, request: Request) -> Response {
    let Request { command, args } = request;
    debug!(command = %command, "Dispatching command");

    let result = route(app, &command, args).await;
    if let Err(error) = &result {
        warn!(command = %command, code = ?error.code, message = %error.message, "Command failed");
    }
    result.into()
}

async fn route(app: &AppState, command: &str, args: Value) -> Result<Value, ApiError> {
    match command {
        // Draft bill
        "get_draft" => reply(draft::get_draft(app)),
        "add_line_item" => reply(draft::add_line_item(app, parse_args(command, args)?)),
        "update_line_item" => reply(draft::update_line_item(app, parse_args(command, args)?)),
        "remove_line_item" => reply(draft::remove_line_item(app, parse_args(command, args)?)),
        "set_tax_rate" => reply(draft::set_tax_rate(app, parse_args(command, args)?)),
        "set_paid_amount" => reply(draft::set_paid_amount(app, parse_args(command, args)?)),
        "set_customer" => reply(draft::set_customer(app, parse_args(command, args)?)),
        "set_payment_mode" => reply(draft::set_payment_mode(app, parse_args(command, args)?)),
        "set_due_date" => reply(draft::set_due_date(app, parse_args(command, args)?)),
        "clear_draft" => reply(draft::clear_draft(app)),

        // Invoices
        "next_invoice_number" => reply(invoice::next_invoice_number(app).await),
        "save_invoice" => reply(invoice::save_invoice(app, parse_args(command, args)?).await),
        "preview_invoice" => reply(invoice::preview_invoice(app).await),
        "reprint_invoice" => {
            reply(invoice::reprint_invoice(app, parse_args(command, args)?).await)
        }
        "export_invoice" => reply(invoice::export_invoice(app, parse_args(command, args)?).await),
        "list_invoices" => reply(invoice::list_invoices(app).await),
        "get_invoice" => reply(invoice::get_invoice(app, parse_args(command, args)?).await),
        "list_customer_invoices" => {
            reply(invoice::list_customer_invoices(app, parse_args(command, args)?).await)
        }
        "record_payment" => reply(invoice::record_payment(app, parse_args(command, args)?).await),

        // Products and stock
        "list_products" => reply(product::list_products(app).await),
        "search_products" => {
            reply(product::search_products(app, parse_args(command, args)?).await)
        }
        "get_product" => reply(product::get_product(app, parse_args(command, args)?).await),
        "add_product" => reply(product::add_product(app, parse_args(command, args)?).await),
        "update_product" => reply(product::update_product(app, parse_args(command, args)?).await),
        "adjust_stock" => reply(product::adjust_stock(app, parse_args(command, args)?).await),
        "stock_history" => reply(product::stock_history(app, parse_args(command, args)?).await),
        "delete_product" => reply(product::delete_product(app, parse_args(command, args)?).await),

        // Customers
        "list_customers" => reply(customer::list_customers(app).await),
        "find_customer" => reply(customer::find_customer(app, parse_args(command, args)?).await),
        "customer_stats" => reply(customer::customer_stats(app, parse_args(command, args)?).await),

        // Reports
        "report_summary" => reply(report::report_summary(app).await),
        "sales_by_date" => reply(report::sales_by_date(app, parse_args(command, args)?).await),
        "top_selling_products" => {
            reply(report::top_selling_products(app, parse_args(command, args)?).await)
        }
        "recent_transactions" => {
            reply(report::recent_transactions(app, parse_args(command, args)?).await)
        }
        "low_stock" => reply(report::low_stock(app).await),

        // Configuration
        "get_config" => reply(config::get_config(app)),

        other => Err(ApiError::not_found("Command", other)),
    }
}
