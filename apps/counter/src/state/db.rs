//! # Store State
//!
//! The three store traits behind `Arc<dyn ...>`, injected once at startup.
//!
//! ## Thread Safety
//! The SQLite repositories share one `SqlitePool`, which is thread-safe.
//! `InMemoryStore` guards its tables with an async `RwLock`. Commands can
//! run queries concurrently without extra locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! async fn list_products(app: &AppState) -> Result<Vec<Product>, ApiError> {
//!     Ok(app.db.products().list().await?)
//! }
//! ```

use std::sync::Arc;

use kirana_db::{CustomerStore, Database, InMemoryStore, InvoiceStore, ProductStore};

/// Store handles shared by every command.
#[derive(Clone)]
pub struct DbState {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
    products: Arc<dyn ProductStore>,
}

impl DbState {
    /// Wires arbitrary store implementations.
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        DbState {
            invoices,
            customers,
            products,
        }
    }

    /// SQLite repositories over one connection pool.
    pub fn from_database(db: &Database) -> Self {
        DbState::new(
            Arc::new(db.invoices()),
            Arc::new(db.customers()),
            Arc::new(db.products()),
        )
    }

    /// All three stores backed by one in-memory store.
    pub fn in_memory(store: InMemoryStore) -> Self {
        DbState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    pub fn invoices(&self) -> &dyn InvoiceStore {
        self.invoices.as_ref()
    }

    pub fn customers(&self) -> &dyn CustomerStore {
        self.customers.as_ref()
    }

    pub fn products(&self) -> &dyn ProductStore {
        self.products.as_ref()
    }
}

impl std::fmt::Debug for DbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbState").finish_non_exhaustive()
    }
}
