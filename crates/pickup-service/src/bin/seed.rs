//! # Seed Data Generator
//!
//! Runs every lifecycle operation once per city and prints the resulting
//! report, for development against a real or in-memory store.
//!
//! ## Usage
//! ```bash
//! # Against DATABASE_URL (see ServiceConfig for the other variables)
//! cargo run -p pickup-service --bin seed
//!
//! # Without PostgreSQL
//! cargo run -p pickup-service --bin seed -- --memory
//!
//! # More products per reception
//! cargo run -p pickup-service --bin seed -- --products 12
//! ```
//!
//! ## Generated Data
//! For each city a point is opened and a reception started. Products cycle
//! through every product type; the last one is removed again. Receptions in
//! every city but the last are closed, so the report shows both statuses.

use std::env;

use pickup_core::{City, ProductType, ReportQuery, MAX_PAGE_SIZE};
use pickup_db::{Database, MemoryGateway, StorageGateway};
use pickup_service::telemetry::init_tracing;
use pickup_service::{LifecycleOrchestrator, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut memory = false;
    let mut products_per_reception: usize = 5;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--memory" | "-m" => memory = true,
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    products_per_reception = args[i + 1].parse().unwrap_or(5);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pickup Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --memory         Use the in-memory gateway instead of PostgreSQL");
                println!("  -p, --products <N>   Products per reception (default: 5)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = ServiceConfig::load()?;
    init_tracing(&config.log);

    if memory {
        let orchestrator = LifecycleOrchestrator::from_config(MemoryGateway::new(), &config);
        seed(&orchestrator, products_per_reception).await?;
    } else {
        let db = Database::new(config.db_config()).await?;
        let orchestrator = LifecycleOrchestrator::from_config(db.clone(), &config);
        let result = seed(&orchestrator, products_per_reception).await;
        db.close().await;
        result?;
    }

    Ok(())
}

async fn seed<G: StorageGateway>(
    orchestrator: &LifecycleOrchestrator<G>,
    products_per_reception: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let cities = City::ALL;

    for (index, city) in cities.into_iter().enumerate() {
        let point = orchestrator.open_point(city).await?;
        orchestrator.start_reception(point.id).await?;

        for n in 0..products_per_reception {
            let product_type = ProductType::ALL[n % ProductType::ALL.len()];
            orchestrator.append_product(point.id, product_type).await?;
        }
        if products_per_reception > 0 {
            orchestrator.remove_last_product(point.id).await?;
        }

        if index + 1 < cities.len() {
            orchestrator.close_active_reception(point.id).await?;
        }
    }

    let report = orchestrator
        .get_report(&ReportQuery::until_now().with_page_size(MAX_PAGE_SIZE))
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
