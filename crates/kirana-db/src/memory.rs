//! # In-Memory Store
//!
//! One struct implementing every store trait over plain collections.
//! Used by tests and by the counter app when started without a database.
//!
//! ## Fault Injection
//! `fail_reads` / `fail_writes` make every call of that kind return
//! `DbError::ConnectionFailed`, so callers can exercise their degraded
//! paths (provisional numbering, empty customer list, aborted save).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use kirana_core::{
    Customer, CustomerPatch, Invoice, Money, Product, RecordStatus, StockChange, StockLog,
};

use crate::error::{DbError, DbResult};
use crate::repository::{CustomerStore, InvoiceStore, ProductStore, StockAdjustment};

#[derive(Debug, Default)]
struct Tables {
    invoices: Vec<Invoice>,
    customers: Vec<Customer>,
    products: Vec<Product>,
    stock_logs: Vec<StockLog>,
}

/// Store backed by vectors behind a lock. Cloning shares the data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a product catalog.
    pub async fn with_products(products: Vec<Product>) -> Self {
        let store = Self::new();
        store.tables.write().await.products = products;
        store
    }

    /// Makes every read fail until switched back.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> DbResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("store unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn newest_first(mut invoices: Vec<Invoice>) -> Vec<Invoice> {
    invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    invoices
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// =============================================================================
// InvoiceStore
// =============================================================================

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn create_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        if tables
            .invoices
            .iter()
            .any(|i| i.invoice_number == invoice.invoice_number)
        {
            return Err(DbError::duplicate(
                "invoices.invoice_number",
                invoice.invoice_number.as_str(),
            ));
        }

        debug!(invoice_number = %invoice.invoice_number, "Storing invoice in memory");
        tables.invoices.push(invoice.clone());
        Ok(())
    }

    async fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        self.check_read()?;
        Ok(newest_first(self.tables.read().await.invoices.clone()))
    }

    async fn list_invoice_numbers(&self, prefix: &str) -> DbResult<Vec<String>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .iter()
            .map(|i| i.invoice_number.to_string())
            .filter(|n| n.starts_with(prefix))
            .collect())
    }

    async fn get_invoice(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .invoices
            .iter()
            .find(|i| i.invoice_number.as_str() == invoice_number)
            .cloned())
    }

    async fn list_by_customer(&self, phone: &str) -> DbResult<Vec<Invoice>> {
        self.check_read()?;
        let bills = self
            .tables
            .read()
            .await
            .invoices
            .iter()
            .filter(|i| i.customer.phone == phone)
            .cloned()
            .collect();
        Ok(newest_first(bills))
    }

    async fn record_payment(&self, invoice_number: &str, amount: Money) -> DbResult<Invoice> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        let invoice = tables
            .invoices
            .iter_mut()
            .find(|i| i.invoice_number.as_str() == invoice_number)
            .ok_or_else(|| DbError::not_found("Invoice", invoice_number))?;

        invoice
            .record_payment(amount)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        Ok(invoice.clone())
    }
}

// =============================================================================
// CustomerStore
// =============================================================================

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .customers
            .iter()
            .find(|c| c.phone == phone)
            .cloned())
    }

    async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list(&self) -> DbResult<Vec<Customer>> {
        self.check_read()?;
        let mut customers = self.tables.read().await.customers.clone();
        customers.sort_by_key(|c| c.name.to_lowercase());
        Ok(customers)
    }

    async fn create(&self, customer: &Customer) -> DbResult<()> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        if tables.customers.iter().any(|c| c.phone == customer.phone) {
            return Err(DbError::duplicate("customers.phone", &customer.phone));
        }

        tables.customers.push(customer.clone());
        Ok(())
    }

    async fn update(&self, id: &str, patch: &CustomerPatch) -> DbResult<Customer> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        let customer = tables
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        customer.apply(patch, Utc::now());
        Ok(customer.clone())
    }
}

// =============================================================================
// ProductStore
// =============================================================================

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn list(&self) -> DbResult<Vec<Product>> {
        self.check_read()?;
        let mut products: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        products.sort_by_key(|p| p.name.to_lowercase());
        Ok(products)
    }

    async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .products
            .iter()
            .find(|p| p.is_active() && same_name(&p.name, name))
            .cloned())
    }

    async fn insert(&self, product: &Product) -> DbResult<()> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        if tables.products.iter().any(|p| p.id == product.id) {
            return Err(DbError::duplicate("products.id", &product.id));
        }

        tables.products.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> DbResult<()> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        let existing = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| DbError::not_found("Product", &product.id))?;

        *existing = Product {
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(())
    }

    async fn adjust_stock(&self, adjustment: &StockAdjustment) -> DbResult<StockLog> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == adjustment.product_id)
            .ok_or_else(|| DbError::not_found("Product", &adjustment.product_id))?;

        let old_stock = product.stock;
        product.stock += adjustment.delta;
        product.updated_at = now;

        let log = StockLog {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            old_stock,
            new_stock: product.stock,
            change_type: StockChange::from_delta(adjustment.delta),
            quantity: adjustment.delta.abs(),
            reason: adjustment.reason.clone(),
            remarks: adjustment.remarks.clone(),
            updated_by: adjustment.updated_by.clone(),
            date_time: now,
        };

        tables.stock_logs.push(log.clone());
        Ok(log)
    }

    async fn soft_delete(&self, id: &str) -> DbResult<()> {
        self.check_write()?;
        let mut tables = self.tables.write().await;

        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DbError::not_found("Product", id))?;

        product.status = RecordStatus::Inactive;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn stock_logs(&self, product_id: Option<&str>) -> DbResult<Vec<StockLog>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .stock_logs
            .iter()
            .rev()
            .filter(|log| product_id.map_or(true, |id| log.product_id == id))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::CustomerSnapshot;
    use rust_decimal::Decimal;

    fn product(name: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            brand: "General".to_string(),
            category: "General".to_string(),
            description: String::new(),
            price: Money::from_rupees(100),
            gst: Decimal::ZERO,
            stock,
            min_stock: 1,
            unit: "pcs".to_string(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = InMemoryStore::new();
        store.set_fail_reads(true);
        assert!(store.list_invoice_numbers("").await.is_err());
        assert!(CustomerStore::list(&store).await.is_err());

        store.set_fail_reads(false);
        assert!(store.list_invoice_numbers("").await.unwrap().is_empty());

        store.set_fail_writes(true);
        let customer = Customer::from_snapshot(
            &CustomerSnapshot {
                name: "Asha".to_string(),
                phone: "9000000001".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(store.create(&customer).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_adjustment_and_lookup() {
        let fan = product("Ceiling Fan", 5);
        let store = InMemoryStore::with_products(vec![fan.clone()]).await;

        let found = store.find_by_name("ceiling fan").await.unwrap().unwrap();
        assert_eq!(found.id, fan.id);

        let log = store
            .adjust_stock(&StockAdjustment::sale(&fan.id, 2, "2401150001"))
            .await
            .unwrap();
        assert_eq!((log.old_stock, log.new_stock), (5, 3));
        assert_eq!(store.stock_logs(Some(&fan.id)).await.unwrap().len(), 1);

        store.soft_delete(&fan.id).await.unwrap();
        assert!(ProductStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let store = InMemoryStore::new();
        let snapshot = CustomerSnapshot {
            name: "Asha".to_string(),
            phone: "9000000001".to_string(),
            ..Default::default()
        };
        store.create(&Customer::from_snapshot(&snapshot, Utc::now())).await.unwrap();
        let err = store
            .create(&Customer::from_snapshot(&snapshot, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
