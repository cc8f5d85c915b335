//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are embedded at compile time and
//! applied in filename order on connect. Applied files are recorded in
//! `_sqlx_migrations` with their checksum, so an edited migration fails
//! loudly instead of drifting.
//!
//! ## Adding a Migration
//! - Next number, e.g. `002_invoice_notes.sql`
//! - Never edit a file that has shipped
//! - Money columns are decimal TEXT, never REAL

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Tables the billing stores expect after migrating.
pub const TABLES: [&str; 5] = ["customers", "products", "stock_logs", "invoices", "invoice_items"];

/// Embedded vs applied migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.embedded == self.applied
    }
}

/// Applies pending migrations. Running it twice is a no-op.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;

    // Runs even when counts match so checksums of applied files are verified.
    MIGRATOR.run(pool).await?;

    if before.is_current() {
        debug!(applied = before.applied, "Schema up to date");
    } else {
        info!(from = before.applied, to = before.embedded, "Schema migrated");
    }
    Ok(())
}

/// Counts embedded and applied migrations. A fresh database has applied 0.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let tracked: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied: i64 = match tracked {
        Some(_) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(pool)
                .await?
        }
        None => 0,
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_create_billing_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(db.pool())
                .await
                .unwrap();

        for expected in TABLES {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_status_on_fresh_database() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let status = migration_status(db.pool()).await.unwrap();
        assert_eq!(status.applied, 0);
        assert!(status.embedded >= 1);

        run_migrations(db.pool()).await.unwrap();
        assert!(migration_status(db.pool()).await.unwrap().is_current());
    }
}
