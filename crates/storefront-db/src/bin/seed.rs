//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by STOREFRONT_DB_PATH (default ./storefront.db)
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path and stock per size
//! cargo run -p storefront-db --bin seed -- --db ./data/shop.db --stock 25
//!
//! # More logging
//! RUST_LOG=debug cargo run -p storefront-db --bin seed
//! ```
//!
//! Each product gets every size of its size chart with the same starting
//! stock, so `total_quantity = sizes × stock`.

use std::env;
use std::time::Instant;

use serde::Serialize;
use storefront_db::{Database, DbConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_STOCK: i64 = 20;

const APPAREL_SIZES: &[&str] = &["S", "M", "L", "XL"];
const SHOE_SIZES: &[&str] = &["39", "40", "41", "42", "43"];
const ONE_SIZE: &[&str] = &["One Size"];

/// (name, price, image, size chart)
const PRODUCTS: &[(&str, i64, &str, &[&str])] = &[
    ("Linen Shirt", 350_000, "https://cdn.storefront.local/linen-shirt.jpg", APPAREL_SIZES),
    ("Oxford Shirt", 420_000, "https://cdn.storefront.local/oxford-shirt.jpg", APPAREL_SIZES),
    ("Cotton Tee", 150_000, "https://cdn.storefront.local/cotton-tee.jpg", APPAREL_SIZES),
    ("Chino Pants", 480_000, "https://cdn.storefront.local/chino-pants.jpg", APPAREL_SIZES),
    ("Denim Jacket", 890_000, "https://cdn.storefront.local/denim-jacket.jpg", APPAREL_SIZES),
    ("Wool Coat", 1_650_000, "https://cdn.storefront.local/wool-coat.jpg", APPAREL_SIZES),
    ("Canvas Sneakers", 690_000, "https://cdn.storefront.local/canvas-sneakers.jpg", SHOE_SIZES),
    ("Leather Loafers", 1_250_000, "https://cdn.storefront.local/leather-loafers.jpg", SHOE_SIZES),
    ("Canvas Tote", 120_000, "https://cdn.storefront.local/canvas-tote.jpg", ONE_SIZE),
    ("Wool Scarf", 260_000, "https://cdn.storefront.local/wool-scarf.jpg", ONE_SIZE),
];

#[derive(Debug, Serialize)]
struct SeedSummary {
    database: String,
    products: usize,
    sizes: usize,
    units: i64,
    elapsed_ms: u128,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn")),
        )
        .init();

    let mut config = DbConfig::from_env()?;
    let mut stock = DEFAULT_STOCK;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.database_path = path.into();
                    i += 1;
                }
            }
            "--stock" | "-s" => {
                if let Some(raw) = args.get(i + 1) {
                    stock = raw.parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: $STOREFRONT_DB_PATH)");
                println!("  -s, --stock <N>     Starting stock per size (default: {DEFAULT_STOCK})");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let database = config.database_path.display().to_string();
    let db = Database::new(config).await?;

    let catalog = db.catalog();
    let existing = catalog.count_products().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    let start = Instant::now();
    let mut products = 0;
    let mut sizes = 0;
    let mut units = 0;

    for (name, price, image_url, chart) in PRODUCTS {
        let product = match catalog.insert_product(name, *price, image_url).await {
            Ok(product) => product,
            Err(e) => {
                error!(name = %name, error = %e, "Failed to insert product");
                continue;
            }
        };
        products += 1;

        for size_name in chart.iter() {
            catalog.add_size(&product.id, size_name, stock).await?;
            sizes += 1;
            units += stock;
        }
    }

    let summary = SeedSummary {
        database,
        products,
        sizes,
        units,
        elapsed_ms: start.elapsed().as_millis(),
    };

    info!(products, sizes, units, "Seed complete");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}
