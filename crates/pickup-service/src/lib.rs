//! # pickup-service: Lifecycle Orchestrator for Pickup
//!
//! Every business rule of the pickup backend lives here: at most one
//! reception in progress per point, LIFO product removal, and the paginated
//! point → reception → product report.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller (transport, auth, encoding) ── validated ids and enums         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                pickup-service (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   LifecycleOrchestrator<G: StorageGateway>                     │   │
//! │  │     one transaction per operation, commit/rollback decisions   │   │
//! │  │                                                                 │   │
//! │  │   ServiceConfig (env) · RetryPolicy · init_tracing             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pickup-db: Database (PostgreSQL) or MemoryGateway                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pickup_db::Database;
//! use pickup_service::{LifecycleOrchestrator, ServiceConfig};
//!
//! let config = ServiceConfig::load()?;
//! pickup_service::telemetry::init_tracing(&config.log);
//!
//! let db = Database::new(config.db_config()).await?;
//! let orchestrator = LifecycleOrchestrator::from_config(db.clone(), &config);
//! // ... serve requests ...
//! db.close().await;
//! ```

pub mod config;
pub mod orchestrator;
pub mod retry;
pub mod telemetry;

pub use config::{ConfigError, LogConfig, ServiceConfig};
pub use orchestrator::LifecycleOrchestrator;
pub use retry::RetryPolicy;
