//! # Seed Data Generator
//!
//! Populates the database with a small electronics catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p kirana-db --bin seed
//!
//! # Specify database path
//! cargo run -p kirana-db --bin seed -- --db ./data/kirana.db
//! ```
//!
//! Each product gets an opening stock log so the stock history screen has
//! something to show.

use std::env;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use kirana_core::{Money, Product, RecordStatus};
use kirana_db::repository::product::generate_product_id;
use kirana_db::{Database, DbConfig, ProductStore, StockAdjustment};

/// (name, brand, category, price in rupees, gst %, opening stock, min stock)
const CATALOG: &[(&str, &str, &str, i64, u32, i64, i64)] = &[
    ("Samsung LED TV 43\"", "Samsung", "Television", 32_000, 18, 8, 2),
    ("LG Smart TV 55\"", "LG", "Television", 54_500, 18, 4, 1),
    ("iPhone 15 Pro", "Apple", "Mobile", 129_000, 18, 5, 2),
    ("Redmi Note 13", "Xiaomi", "Mobile", 17_999, 18, 12, 3),
    ("HP Laptop i5", "HP", "Laptop", 45_000, 18, 6, 2),
    ("Dell Inspiron 15", "Dell", "Laptop", 52_990, 18, 3, 1),
    ("Boat Airdopes 141", "Boat", "Audio", 1_299, 18, 40, 10),
    ("Sony Bluetooth Speaker", "Sony", "Audio", 4_990, 18, 9, 3),
    ("Philips Mixer Grinder", "Philips", "Appliance", 3_450, 12, 7, 2),
    ("Prestige Induction Cooktop", "Prestige", "Appliance", 2_799, 12, 1, 2),
    ("USB-C Charging Cable", "Generic", "Accessories", 199, 0, 60, 15),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kirana_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kirana Billing Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kirana_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kirana Billing Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let products = db.products();
    let existing = products.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0;
    for entry in CATALOG {
        let product = catalog_product(entry);

        if let Err(e) = products.insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }

        let opening = StockAdjustment {
            product_id: product.id.clone(),
            delta: entry.5,
            reason: "Opening stock".to_string(),
            remarks: None,
            updated_by: "seed".to_string(),
        };
        products.adjust_stock(&opening).await?;

        generated += 1;
    }

    println!("✓ Inserted {} products", generated);

    let low: Vec<Product> = products
        .list()
        .await?
        .into_iter()
        .filter(Product::is_low_stock)
        .collect();
    println!("  Low stock: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds a product with zero stock; the opening stock goes through a
/// stock adjustment so it is logged.
fn catalog_product(entry: &(&str, &str, &str, i64, u32, i64, i64)) -> Product {
    let (name, brand, category, price, gst, _, min_stock) = *entry;
    let now = Utc::now();

    Product {
        id: generate_product_id(),
        name: name.to_string(),
        brand: brand.to_string(),
        category: category.to_string(),
        description: String::new(),
        price: Money::from_rupees(price),
        gst: Decimal::from(gst),
        stock: 0,
        min_stock,
        unit: "pcs".to_string(),
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}
