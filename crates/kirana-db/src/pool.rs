//! # Database Handle
//!
//! One SQLite pool per counter, handed out to the store implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("…/kirana.db")                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config)                                                  │
//! │       ├── open file (create if missing), WAL, foreign keys              │
//! │       ├── pool of up to `max_connections`                               │
//! │       └── apply embedded migrations                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoices() / customers() / products()  ──► store trait objects         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Saving a bill and printing it can overlap with a stock lookup from the
//! screen, so writers wait on `busy_timeout` instead of failing with
//! `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{SqliteCustomerRepository, SqliteInvoiceRepository, SqliteProductRepository};

const MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how the pool behaves.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,

    /// Default: 4. A private in-memory database always uses 1.
    pub max_connections: u32,

    /// How long a writer waits for a lock. Default: 5 seconds.
    pub busy_timeout: Duration,

    /// Default: true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed database; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private in-memory database, gone when the handle is dropped.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            ..DbConfig::new(MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        Ok(options
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Pool handle. Cloning shares the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./kirana.db")).await?;
/// let invoices: Arc<dyn InvoiceStore> = Arc::new(db.invoices());
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let memory = config.is_memory();
        let max_connections = if memory { 1 } else { config.max_connections.max(1) };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.busy_timeout * 2);

        // Closing the only connection would drop an in-memory database.
        if memory {
            pool_options = pool_options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections, memory, "Database pool ready");

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        Ok(db)
    }

    /// Raw pool for queries the stores don't cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn invoices(&self) -> SqliteInvoiceRepository {
        SqliteInvoiceRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> SqliteCustomerRepository {
        SqliteCustomerRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> SqliteProductRepository {
        SqliteProductRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.ping().await);
    }

    #[test]
    fn test_config_defaults() {
        let config = DbConfig::new("/tmp/kirana.db");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
        assert!(!config.is_memory());

        let config = DbConfig::in_memory().run_migrations(false);
        assert!(config.is_memory());
        assert!(!config.run_migrations);
    }

    #[tokio::test]
    async fn test_file_database_is_created_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kirana.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(path.exists());

        let status = migrations::migration_status(db.pool()).await.unwrap();
        assert!(status.is_current());
        db.close().await;
    }

    #[tokio::test]
    async fn test_skipping_migrations_leaves_schema_empty() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let status = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(status.applied, 0);
        assert!(!status.is_current());
    }
}
