//! # Storage Gateway
//!
//! The seam between the lifecycle orchestrator and the relational store.
//!
//! ## Call Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Orchestrator Operation                           │
//! │                                                                         │
//! │  open_transaction(isolation) ──► Tx                                    │
//! │       │                                                                 │
//! │       ├── get_point(&mut Tx, id)                                       │
//! │       ├── get_active_reception(&mut Tx, point)   ← FOR UPDATE          │
//! │       ├── create_product(&mut Tx, reception, type)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit(Tx)  or  rollback(Tx)    ← decided by the orchestrator         │
//! │                                                                         │
//! │  create_point(city) is the only call outside a transaction.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations own no business rules and keep no rows between calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pickup_core::{City, Point, Product, ProductType, Reception};
use uuid::Uuid;

use crate::error::DbResult;

// =============================================================================
// Isolation Level
// =============================================================================

/// Transaction isolation level, applied as the first statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    /// Strongest level; conflicting transactions fail with a serialization
    /// error instead of both committing.
    Serializable,
}

impl IsolationLevel {
    /// The `SET TRANSACTION` statement for this level.
    pub const fn set_statement(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

// =============================================================================
// Row Lock
// =============================================================================

/// Row lock taken by report reads.
///
/// ## Trade-off
/// ```text
/// None   │ report never waits on writers, may see a page mid-mutation
/// Share  │ blocks writers on scanned rows, reports do not block each other
/// Update │ blocks writers and other locking readers on scanned rows
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLock {
    None,
    #[default]
    Share,
    Update,
}

impl RowLock {
    /// SQL suffix appended to a SELECT.
    pub const fn clause(&self) -> &'static str {
        match self {
            RowLock::None => "",
            RowLock::Share => " FOR SHARE",
            RowLock::Update => " FOR UPDATE",
        }
    }
}

impl std::str::FromStr for RowLock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RowLock::None),
            "share" => Ok(RowLock::Share),
            "update" => Ok(RowLock::Update),
            other => Err(format!("unknown row lock mode: {other}")),
        }
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Atomic, parameterized data operations with explicit transactions.
///
/// ## Not-found Signalling
/// | Method | No matching row |
/// |---|---|
/// | `get_point` | `Err(DbError::PointNotFound)` |
/// | `get_active_reception` | `Ok(None)` |
/// | `close_active_reception` | `Ok(None)` |
/// | `delete_last_product` | `Err(DbError::NoProductToDelete)` |
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Transaction handle; every scoped call borrows it mutably.
    type Tx: Send;

    /// Begins a transaction at the given isolation level.
    async fn open_transaction(&self, isolation: IsolationLevel) -> DbResult<Self::Tx>;

    /// Commits. A failed commit means nothing in the transaction persisted.
    async fn commit(&self, tx: Self::Tx) -> DbResult<()>;

    /// Rolls back. Failures are logged, never returned.
    async fn rollback(&self, tx: Self::Tx);

    /// Inserts a point with a fresh id and the current time.
    async fn create_point(&self, city: City) -> DbResult<Point>;

    async fn get_point(&self, tx: &mut Self::Tx, id: Uuid) -> DbResult<Point>;

    /// The in-progress reception of a point, locked until the transaction ends.
    async fn get_active_reception(
        &self,
        tx: &mut Self::Tx,
        point_id: Uuid,
    ) -> DbResult<Option<Reception>>;

    /// Closes the in-progress reception in one update-and-return statement.
    async fn close_active_reception(
        &self,
        tx: &mut Self::Tx,
        point_id: Uuid,
    ) -> DbResult<Option<Reception>>;

    async fn create_reception(&self, tx: &mut Self::Tx, point_id: Uuid) -> DbResult<Reception>;

    async fn create_product(
        &self,
        tx: &mut Self::Tx,
        reception_id: Uuid,
        product_type: ProductType,
    ) -> DbResult<Product>;

    /// Deletes the most recently received product of the reception.
    async fn delete_last_product(&self, tx: &mut Self::Tx, reception_id: Uuid) -> DbResult<()>;

    /// A page of receptions started within `[start, end]`, newest first.
    async fn list_receptions_in_window(
        &self,
        tx: &mut Self::Tx,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: i64,
        limit: i64,
        lock: RowLock,
    ) -> DbResult<Vec<Reception>>;

    /// All products of a reception, oldest first.
    async fn list_products(
        &self,
        tx: &mut Self::Tx,
        reception_id: Uuid,
        lock: RowLock,
    ) -> DbResult<Vec<Product>>;
}
