//! # Seed Data Generator
//!
//! Populates the database with products, orders and links for development.
//!
//! ## Usage
//! ```bash
//! # 60 products, 25 orders (default), database from PRODUCTSTORE_DB_PATH
//! cargo run -p productstore-db --bin seed
//!
//! # Custom amounts
//! cargo run -p productstore-db --bin seed -- --products 500 --orders 200
//!
//! # Specify database path
//! cargo run -p productstore-db --bin seed -- --db ./data/productstore.db
//! ```
//!
//! ## Generated Data
//! - Products named `{base} {size}` with prices from $0.99 up
//! - Orders, every third one without a user
//! - Each order gets 1 to 5 products, picked deterministically from its index
//!
//! A JSON summary is printed when seeding finishes.

use std::env;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use productstore_core::{EntityGraph, Money, NewOrder, NewProduct, ProductId, UserId};
use productstore_db::{Database, DbConfig};

/// Base product names.
const NAMES: &[&str] = &[
    "Widget", "Gadget", "Sprocket", "Gear", "Bolt", "Nut", "Washer", "Spring", "Lever", "Pulley",
    "Hinge", "Bracket",
];

/// Size variants with price addon in cents.
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 150), ("Large", 300), ("XL", 500), ("Bulk", 1200)];

#[derive(Debug, Serialize)]
struct SeedSummary {
    database: String,
    products: i64,
    orders: i64,
    links: i64,
    elapsed_ms: u128,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = DbConfig::from_env()?;
    let mut product_count: usize = 60;
    let mut order_count: usize = 25;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if let Some(value) = args.get(i + 1) {
                    product_count = value.parse()?;
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if let Some(value) = args.get(i + 1) {
                    order_count = value.parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    config.database_path = value.into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Product Store Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: 60)");
                println!("  -o, --orders <N>    Number of orders to generate (default: 25)");
                println!("  -d, --db <PATH>     Database file path (default: PRODUCTSTORE_DB_PATH)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let database = config.database_path.display().to_string();
    let db = Database::new(config).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = Instant::now();

    info!(count = product_count, "Generating products");
    let mut product_ids = Vec::with_capacity(product_count);
    for seed in 0..product_count {
        let product = db.products().create(&generate_product(seed)).await?;
        product_ids.push(product.id);
    }

    info!(count = order_count, "Generating orders");
    let mut graph = EntityGraph::new();
    for seed in 0..order_count {
        let user_id = (seed % 3 != 0).then(|| UserId::new((seed % 7 + 1) as i64));
        let order = db.orders().create(&NewOrder { user_id }).await?;

        let picked = pick_products(&product_ids, seed);
        db.associations()
            .synchronize_order(&mut graph, order.id, picked)
            .await?;
    }

    let summary = SeedSummary {
        database,
        products: db.products().count().await?,
        orders: db.orders().count().await?,
        links: db.associations().count_links().await?,
        elapsed_ms: start.elapsed().as_millis(),
    };

    info!("Seed complete");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Generates a single product from its index.
fn generate_product(seed: usize) -> NewProduct {
    let name = NAMES[seed % NAMES.len()];
    let (size, addon) = SIZES[(seed / NAMES.len()) % SIZES.len()];

    // $0.99 - $8.98 + size addon
    let base = 99 + ((seed * 37) % 800) as i64;

    NewProduct::new(format!("{name} {size}"), Money::from_cents(base + addon))
}

/// Picks 1 to 5 products for an order.
fn pick_products(products: &[ProductId], seed: usize) -> Vec<ProductId> {
    if products.is_empty() {
        return Vec::new();
    }

    let wanted = 1 + seed % 5;
    (0..wanted)
        .map(|k| products[(seed * 13 + k * 7) % products.len()])
        .collect()
}
