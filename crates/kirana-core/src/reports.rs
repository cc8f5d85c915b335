//! # Reports
//!
//! Aggregations behind the dashboard and report screens. Pure functions
//! over already-loaded invoices, products and customers.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, Invoice, InvoiceSummary, Product};

/// Rows shown in "top products" and "recent transactions" by default.
pub const DEFAULT_REPORT_LIMIT: usize = 5;

// =============================================================================
// Report Types
// =============================================================================

/// Headline numbers of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub total_sales: Money,
    pub total_orders: usize,
    pub total_customers: usize,
    /// Sum of stored GST amounts.
    pub total_gst: Money,
    /// `Σ price × stock` over the catalog.
    pub stock_value: Money,
    pub outstanding_balance: Money,
}

/// Sales of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub orders: usize,
    pub total: Money,
}

/// Quantity sold of one description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub description: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Billing history of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerStats {
    pub customer_id: String,
    pub name: String,
    pub phone: String,
    pub total_bills: usize,
    pub total_purchases: Money,
    pub total_paid: Money,
    pub total_due: Money,
    /// Bills with a positive balance.
    pub unpaid_bills: usize,
    #[ts(as = "Option<String>")]
    pub last_bill_date: Option<NaiveDate>,
}

// =============================================================================
// Aggregations
// =============================================================================

/// Dashboard headline numbers.
pub fn summary(invoices: &[Invoice], customers: &[Customer], products: &[Product]) -> SalesSummary {
    SalesSummary {
        total_sales: invoices.iter().map(|i| i.totals.grand_total).sum(),
        total_orders: invoices.len(),
        total_customers: customers.len(),
        total_gst: invoices.iter().map(|i| i.totals.tax_amount).sum(),
        stock_value: products.iter().map(Product::stock_value).sum(),
        outstanding_balance: invoices
            .iter()
            .map(|i| i.totals.balance)
            .filter(Money::is_positive)
            .sum(),
    }
}

/// Grand totals per invoice date, oldest first.
///
/// `from` and `to` are inclusive; `None` leaves that side open.
pub fn sales_by_date(
    invoices: &[Invoice],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, (usize, Money)> = BTreeMap::new();

    let in_range = |date: NaiveDate| {
        from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
    };

    for invoice in invoices.iter().filter(|i| in_range(i.date)) {
        let day = days.entry(invoice.date).or_default();
        day.0 += 1;
        day.1 += invoice.totals.grand_total;
    }

    days.into_iter()
        .map(|(date, (orders, total))| DailySales { date, orders, total })
        .collect()
}

/// Best sellers by quantity. Ties are broken alphabetically.
pub fn top_selling_products(invoices: &[Invoice], limit: usize) -> Vec<ProductSales> {
    let mut sold: HashMap<&str, (i64, Money)> = HashMap::new();

    for item in invoices.iter().flat_map(|i| &i.items) {
        let entry = sold.entry(item.description.trim()).or_default();
        entry.0 += item.quantity;
        entry.1 += item.amount();
    }

    let mut ranked: Vec<ProductSales> = sold
        .into_iter()
        .map(|(description, (quantity, revenue))| ProductSales {
            description: description.to_string(),
            quantity,
            revenue,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.description.cmp(&b.description))
    });
    ranked.truncate(limit);
    ranked
}

/// Latest invoices, newest first.
pub fn recent_transactions(invoices: &[Invoice], limit: usize) -> Vec<InvoiceSummary> {
    let mut recent: Vec<&Invoice> = invoices.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.into_iter().take(limit).map(Invoice::summary).collect()
}

/// Products at or below their reorder threshold.
pub fn low_stock(products: &[Product]) -> Vec<Product> {
    products.iter().filter(|p| p.is_low_stock()).cloned().collect()
}

/// Billing history of a customer.
///
/// Invoices are matched on customer id, or on phone for bills saved
/// before the customer record existed.
pub fn customer_stats(customer: &Customer, invoices: &[Invoice]) -> CustomerStats {
    let bills: Vec<&Invoice> = invoices
        .iter()
        .filter(|i| {
            i.customer_id.as_deref() == Some(customer.id.as_str())
                || i.customer.phone == customer.phone
        })
        .collect();

    CustomerStats {
        customer_id: customer.id.clone(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        total_bills: bills.len(),
        total_purchases: bills.iter().map(|i| i.totals.grand_total).sum(),
        total_paid: bills.iter().map(|i| i.totals.paid_amount).sum(),
        total_due: bills
            .iter()
            .map(|i| i.totals.balance)
            .filter(Money::is_positive)
            .sum(),
        unpaid_bills: bills.iter().filter(|i| i.totals.balance.is_positive()).count(),
        last_bill_date: bills.iter().map(|i| i.date).max(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
