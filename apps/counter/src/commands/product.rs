//! # Product Commands
//!
//! Catalog maintenance and stock movements.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  User types "led tv"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoke('search_products', { query: 'led tv', limit: 20 })             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Every word must appear in name, brand or category (any case)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Return Vec<Product>, by name                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never edited directly: opening stock and every later change go
//! through `adjust_stock`, so the stock log explains every number.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use kirana_core::validation::{
    validate_product_name, validate_search_query, validate_tax_rate, validate_unit_price,
};
use kirana_core::{Money, Product, RecordStatus, StockLog, TaxRate, ValidationError};
use kirana_db::repository::product::generate_product_id;
use kirana_db::StockAdjustment;

use crate::error::ApiError;
use crate::state::AppState;

/// Default and maximum result counts for search.
const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

/// Who the counter records as the author of manual stock changes.
const COUNTER_USER: &str = "counter";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdArgs {
    pub id: String,
}

/// A new catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// GST percentage, e.g. `18`.
    #[serde(default)]
    pub gst: Decimal,
    /// Opening stock, logged as an `IN` movement.
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductArgs {
    pub product: NewProduct,
}

/// Edits to catalog fields. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub gst: Option<Decimal>,
    pub min_stock: Option<i64>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductArgs {
    pub id: String,
    pub update: ProductUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockArgs {
    pub product_id: String,
    /// Positive to restock, negative to write off.
    pub delta: i64,
    pub reason: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockHistoryArgs {
    pub product_id: Option<String>,
}

fn validate_gst(gst: Decimal) -> Result<(), ApiError> {
    validate_tax_rate(TaxRate::from_percent(gst))?;
    Ok(())
}

fn validate_min_stock(min_stock: i64) -> Result<(), ApiError> {
    if min_stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "minimum stock".to_string(),
        }
        .into());
    }
    Ok(())
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

async fn load_product(app: &AppState, id: &str) -> Result<Product, ApiError> {
    app.db
        .products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Active products, by name.
pub async fn list_products(app: &AppState) -> Result<Vec<Product>, ApiError> {
    Ok(app.db.products().list().await?)
}

/// Matches every query word against name, brand and category.
pub async fn search_products(
    app: &AppState,
    args: SearchProductsArgs,
) -> Result<Vec<Product>, ApiError> {
    let start = Instant::now();
    let query = validate_search_query(&args.query)?.to_lowercase();
    let limit = args
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let words: Vec<&str> = query.split_whitespace().collect();
    let products: Vec<Product> = app
        .db
        .products()
        .list()
        .await?
        .into_iter()
        .filter(|p| {
            let haystack = format!("{} {} {}", p.name, p.brand, p.category).to_lowercase();
            words.iter().all(|word| haystack.contains(word))
        })
        .take(limit)
        .collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = products.len(),
        query = %query,
        "search_products complete"
    );
    Ok(products)
}

pub async fn get_product(app: &AppState, args: ProductIdArgs) -> Result<Product, ApiError> {
    debug!(id = %args.id, "get_product command");
    load_product(app, &args.id).await
}

/// Adds a product. Opening stock is recorded as a stock movement.
pub async fn add_product(app: &AppState, args: AddProductArgs) -> Result<Product, ApiError> {
    let input = args.product;

    validate_product_name(&input.name)?;
    validate_unit_price(input.price)?;
    validate_gst(input.gst)?;
    validate_min_stock(input.min_stock)?;
    if input.stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        }
        .into());
    }

    let products = app.db.products();
    let name = input.name.trim().to_string();
    if products.find_by_name(&name).await?.is_some() {
        return Err(ApiError::validation(format!(
            "A product named '{}' already exists",
            name
        )));
    }

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        name,
        brand: non_empty_or(&input.brand, "General"),
        category: non_empty_or(&input.category, "General"),
        description: input.description.trim().to_string(),
        price: input.price,
        gst: input.gst,
        stock: 0,
        min_stock: input.min_stock,
        unit: non_empty_or(input.unit.as_deref().unwrap_or_default(), "pcs"),
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    products.insert(&product).await?;

    if input.stock > 0 {
        products
            .adjust_stock(&StockAdjustment {
                product_id: product.id.clone(),
                delta: input.stock,
                reason: "Opening stock".to_string(),
                remarks: None,
                updated_by: COUNTER_USER.to_string(),
            })
            .await?;
    }

    info!(product_id = %product.id, name = %product.name, "Product added");
    load_product(app, &product.id).await
}

/// Edits catalog fields. Stock goes through [`adjust_stock`].
pub async fn update_product(app: &AppState, args: UpdateProductArgs) -> Result<Product, ApiError> {
    let mut product = load_product(app, &args.id).await?;
    let update = args.update;

    if let Some(name) = update.name {
        validate_product_name(&name)?;
        let name = name.trim().to_string();
        if let Some(other) = app.db.products().find_by_name(&name).await? {
            if other.id != product.id {
                return Err(ApiError::validation(format!(
                    "A product named '{}' already exists",
                    name
                )));
            }
        }
        product.name = name;
    }
    if let Some(brand) = update.brand {
        product.brand = non_empty_or(&brand, "General");
    }
    if let Some(category) = update.category {
        product.category = non_empty_or(&category, "General");
    }
    if let Some(description) = update.description {
        product.description = description.trim().to_string();
    }
    if let Some(price) = update.price {
        validate_unit_price(price)?;
        product.price = price;
    }
    if let Some(gst) = update.gst {
        validate_gst(gst)?;
        product.gst = gst;
    }
    if let Some(min_stock) = update.min_stock {
        validate_min_stock(min_stock)?;
        product.min_stock = min_stock;
    }
    if let Some(unit) = update.unit {
        product.unit = non_empty_or(&unit, "pcs");
    }

    app.db.products().update(&product).await?;
    info!(product_id = %product.id, "Product updated");
    load_product(app, &product.id).await
}

/// Restocks or writes off units and returns the log entry.
pub async fn adjust_stock(app: &AppState, args: AdjustStockArgs) -> Result<StockLog, ApiError> {
    if args.delta == 0 {
        return Err(ApiError::validation("Stock change must not be zero"));
    }
    if args.reason.trim().is_empty() {
        return Err(ValidationError::required("reason").into());
    }

    let log = app
        .db
        .products()
        .adjust_stock(&StockAdjustment {
            product_id: args.product_id,
            delta: args.delta,
            reason: args.reason.trim().to_string(),
            remarks: args.remarks.filter(|r| !r.trim().is_empty()),
            updated_by: COUNTER_USER.to_string(),
        })
        .await?;

    info!(
        product_id = %log.product_id,
        old_stock = log.old_stock,
        new_stock = log.new_stock,
        "Stock adjusted"
    );
    Ok(log)
}

/// Stock movements, newest first.
pub async fn stock_history(app: &AppState, args: StockHistoryArgs) -> Result<Vec<StockLog>, ApiError> {
    Ok(app
        .db
        .products()
        .stock_logs(args.product_id.as_deref())
        .await?)
}

/// Removes a product from the catalog. Past invoices keep its name.
pub async fn delete_product(app: &AppState, args: ProductIdArgs) -> Result<(), ApiError> {
    app.db.products().soft_delete(&args.id).await?;
    info!(product_id = %args.id, "Product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, DbState};
    use kirana_core::StockChange;
    use kirana_db::InMemoryStore;
    use rust_decimal_macros::dec;

    fn app() -> AppState {
        AppState::new(ConfigState::default(), DbState::in_memory(InMemoryStore::new()))
    }

    fn laptop() -> AddProductArgs {
        AddProductArgs {
            product: NewProduct {
                name: " HP Laptop i5 ".to_string(),
                brand: "HP".to_string(),
                category: "Computers".to_string(),
                description: String::new(),
                price: Money::from_rupees(45000),
                gst: dec!(18),
                stock: 4,
                min_stock: 2,
                unit: None,
            },
        }
    }

    #[tokio::test]
    async fn test_add_product_logs_opening_stock() {
        let app = app();
        let product = add_product(&app, laptop()).await.unwrap();

        assert_eq!(product.name, "HP Laptop i5");
        assert_eq!(product.stock, 4);
        assert_eq!(product.unit, "pcs");

        let logs = stock_history(
            &app,
            StockHistoryArgs {
                product_id: Some(product.id.clone()),
            },
        )
        .await
        .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].reason, "Opening stock");
        assert_eq!(logs[0].change_type, StockChange::In);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let app = app();
        add_product(&app, laptop()).await.unwrap();

        let mut again = laptop();
        again.product.name = "hp laptop I5".to_string();
        let err = add_product(&app, again).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_invalid_products_rejected() {
        let app = app();

        let mut nameless = laptop();
        nameless.product.name = "  ".to_string();
        assert!(add_product(&app, nameless).await.is_err());

        let mut negative = laptop();
        negative.product.price = Money::from_rupees(-5);
        assert!(add_product(&app, negative).await.is_err());

        let mut below_zero = laptop();
        below_zero.product.stock = -1;
        assert!(add_product(&app, below_zero).await.is_err());

        assert!(list_products(&app).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_every_word() {
        let app = app();
        add_product(&app, laptop()).await.unwrap();

        let mut tv = laptop();
        tv.product.name = "Samsung LED TV 43\"".to_string();
        tv.product.brand = "Samsung".to_string();
        tv.product.category = "Television".to_string();
        add_product(&app, tv).await.unwrap();

        let found = search_products(
            &app,
            SearchProductsArgs {
                query: "samsung tv".to_string(),
                limit: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].brand, "Samsung");

        let everything = search_products(
            &app,
            SearchProductsArgs {
                query: "".to_string(),
                limit: Some(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(everything.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_adjust() {
        let app = app();
        let product = add_product(&app, laptop()).await.unwrap();

        let updated = update_product(
            &app,
            UpdateProductArgs {
                id: product.id.clone(),
                update: ProductUpdate {
                    price: Some(Money::from_rupees(43000)),
                    min_stock: Some(5),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, Money::from_rupees(43000));
        assert!(updated.is_low_stock());

        let log = adjust_stock(
            &app,
            AdjustStockArgs {
                product_id: product.id.clone(),
                delta: -1,
                reason: "Damaged".to_string(),
                remarks: Some("  ".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(log.new_stock, 3);
        assert_eq!(log.change_type, StockChange::Out);
        assert_eq!(log.remarks, None);

        let err = adjust_stock(
            &app,
            AdjustStockArgs {
                product_id: product.id,
                delta: 0,
                reason: "Count".to_string(),
                remarks: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_hides_product() {
        let app = app();
        let product = add_product(&app, laptop()).await.unwrap();

        delete_product(
            &app,
            ProductIdArgs {
                id: product.id.clone(),
            },
        )
        .await
        .unwrap();
        assert!(list_products(&app).await.unwrap().is_empty());

        let err = delete_product(
            &app,
            ProductIdArgs {
                id: "missing".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
