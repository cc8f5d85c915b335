//! # Product Repository
//!
//! Catalog storage and stock movements.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  adjust_stock(delta = -2, reason = "Sale")                             │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  UPDATE products SET stock = stock + delta   (old 10 → new 8)          │
//! │  INSERT INTO stock_logs (OUT, quantity 2, old 10, new 8, ...)          │
//! │                                                                         │
//! │  Deltas, never absolute writes: two bills saved back to back           │
//! │  both land.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use kirana_core::{Product, RecordStatus, StockChange, StockLog};

use super::{parse_decimal, parse_label, parse_money, ProductStore, StockAdjustment};
use crate::error::{DbError, DbResult};

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, brand, category, description, price, gst, stock, min_stock,
           unit, status, created_at, updated_at
    FROM products
"#;

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    brand: String,
    category: String,
    description: String,
    price: String,
    gst: String,
    stock: i64,
    min_stock: i64,
    unit: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            id: row.id,
            name: row.name,
            brand: row.brand,
            category: row.category,
            description: row.description,
            price: parse_money("product", &row.price)?,
            gst: parse_decimal("product", &row.gst)?,
            stock: row.stock,
            min_stock: row.min_stock,
            unit: row.unit,
            status: parse_label("product", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StockLogRow {
    id: String,
    product_id: String,
    product_name: String,
    old_stock: i64,
    new_stock: i64,
    change_type: String,
    quantity: i64,
    reason: String,
    remarks: Option<String>,
    updated_by: String,
    date_time: DateTime<Utc>,
}

impl TryFrom<StockLogRow> for StockLog {
    type Error = DbError;

    fn try_from(row: StockLogRow) -> DbResult<Self> {
        Ok(StockLog {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            old_stock: row.old_stock,
            new_stock: row.new_stock,
            change_type: parse_label("stock log", &row.change_type)?,
            quantity: row.quantity,
            reason: row.reason,
            remarks: row.remarks,
            updated_by: row.updated_by,
            date_time: row.date_time,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// SQLite-backed [`ProductStore`].
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    /// Creates a new SqliteProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteProductRepository { pool }
    }

    /// Counts active products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = 'Active'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ProductStore for SqliteProductRepository {
    async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'Active' ORDER BY name COLLATE NOCASE",
            SELECT_PRODUCT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'Active' AND lower(trim(name)) = lower(trim(?1)) LIMIT 1",
            SELECT_PRODUCT
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, brand, category, description, price, gst,
                stock, min_stock, unit, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price.amount().to_string())
        .bind(product.gst.to_string())
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.unit)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                brand = ?3,
                category = ?4,
                description = ?5,
                price = ?6,
                gst = ?7,
                stock = ?8,
                min_stock = ?9,
                unit = ?10,
                status = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price.amount().to_string())
        .bind(product.gst.to_string())
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.unit)
        .bind(product.status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    async fn adjust_stock(&self, adjustment: &StockAdjustment) -> DbResult<StockLog> {
        debug!(
            product_id = %adjustment.product_id,
            delta = adjustment.delta,
            "Adjusting stock"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                .bind(&adjustment.product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (product_name, old_stock) =
            current.ok_or_else(|| DbError::not_found("Product", &adjustment.product_id))?;

        let now = Utc::now();
        let new_stock = old_stock + adjustment.delta;

        sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&adjustment.product_id)
            .bind(adjustment.delta)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let log = StockLog {
            id: Uuid::new_v4().to_string(),
            product_id: adjustment.product_id.clone(),
            product_name,
            old_stock,
            new_stock,
            change_type: StockChange::from_delta(adjustment.delta),
            quantity: adjustment.delta.abs(),
            reason: adjustment.reason.clone(),
            remarks: adjustment.remarks.clone(),
            updated_by: adjustment.updated_by.clone(),
            date_time: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_logs (
                id, product_id, product_name, old_stock, new_stock,
                change_type, quantity, reason, remarks, updated_by, date_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&log.id)
        .bind(&log.product_id)
        .bind(&log.product_name)
        .bind(log.old_stock)
        .bind(log.new_stock)
        .bind(log.change_type.as_str())
        .bind(log.quantity)
        .bind(&log.reason)
        .bind(&log.remarks)
        .bind(&log.updated_by)
        .bind(log.date_time)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(log)
    }

    async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(RecordStatus::Inactive.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    async fn stock_logs(&self, product_id: Option<&str>) -> DbResult<Vec<StockLog>> {
        let rows: Vec<StockLogRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, product_name, old_stock, new_stock, change_type,
                   quantity, reason, remarks, updated_by, date_time
            FROM stock_logs
            WHERE ?1 IS NULL OR product_id = ?1
            ORDER BY date_time DESC, rowid DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockLog::try_from).collect()
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
