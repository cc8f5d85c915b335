//! # kirana-db: Storage Layer for Kirana Billing
//!
//! Store traits the counter app depends on, with SQLite and in-memory
//! implementations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Kirana Billing Data Flow                           │
//! │                                                                         │
//! │  Counter command (save_invoice)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kirana-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Invoice       │    │ 001_initial  │  │   │
//! │  │   │               │    │ Customer      │    │   _schema    │  │   │
//! │  │   │               │    │ Product       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   InMemoryStore (memory.rs): same traits, no database           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/kirana-billing/kirana.db                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Store traits and SQLite repositories
//! - [`memory`] - In-memory store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kirana_db::{Database, DbConfig, InvoiceStore};
//!
//! let db = Database::new(DbConfig::new("path/to/kirana.db")).await?;
//! let numbers = db.invoices().list_invoice_numbers("240115").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::InMemoryStore;
pub use pool::{Database, DbConfig};

pub use repository::{
    CustomerStore, InvoiceStore, ProductStore, SqliteCustomerRepository,
    SqliteInvoiceRepository, SqliteProductRepository, StockAdjustment,
};
