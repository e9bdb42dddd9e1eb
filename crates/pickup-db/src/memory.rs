//! # In-Memory Gateway
//!
//! A [`StorageGateway`] that keeps rows in process memory.
//!
//! ## Transaction Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    MemoryGateway                                        │
//! │                                                                         │
//! │  open_transaction ──► lock(state)           (waits for other Tx)       │
//! │                       staged = state.clone()                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reads / writes hit `staged` only                                      │
//! │       │                                                                 │
//! │       ├── commit   ──► *state = staged; unlock                         │
//! │       └── rollback ──► drop(staged); unlock                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transactions run one at a time, which is stronger than any isolation
//! level requested, so row locks are implied. Used by the orchestrator's
//! tests and for running without PostgreSQL.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::gateway::{IsolationLevel, RowLock, StorageGateway};
use pickup_core::{City, Point, Product, ProductType, Reception, ReceptionStatus};

// =============================================================================
// State
// =============================================================================

/// Committed rows, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    points: Vec<Point>,
    receptions: Vec<Reception>,
    products: Vec<Product>,
}

impl MemoryState {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn receptions(&self) -> &[Reception] {
        &self.receptions
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of in-progress receptions for a point.
    pub fn active_receptions(&self, point_id: Uuid) -> usize {
        self.receptions
            .iter()
            .filter(|r| r.point_id == point_id && r.is_active())
            .count()
    }

    /// Products of a reception, in insertion order.
    pub fn products_of(&self, reception_id: Uuid) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.reception_id == reception_id)
            .collect()
    }

    fn active_reception_mut(&mut self, point_id: Uuid) -> Option<&mut Reception> {
        self.receptions
            .iter_mut()
            .find(|r| r.point_id == point_id && r.is_active())
    }
}

// =============================================================================
// Fault Injection
// =============================================================================

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    fail_commits: AtomicBool,
    serialization_failures: AtomicUsize,
}

// =============================================================================
// Gateway
// =============================================================================

/// In-process storage gateway. Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

/// Transaction handle for [`MemoryGateway`].
pub struct MemoryTx {
    committed: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    isolation: IsolationLevel,
}

impl MemoryGateway {
    pub fn new() -> Self {
        MemoryGateway::default()
    }

    /// Copy of the committed rows.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Inserts a point as-is, bypassing id and timestamp generation.
    pub async fn seed_point(&self, point: Point) {
        self.state.lock().await.points.push(point);
    }

    /// Inserts a reception as-is, bypassing id and timestamp generation.
    pub async fn seed_reception(&self, reception: Reception) {
        self.state.lock().await.receptions.push(reception);
    }

    /// Makes every new transaction and point insert fail as a lost connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every write statement fail.
    pub fn fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every commit fail; the staged writes are discarded.
    pub fn fail_commits(&self, fail: bool) {
        self.faults.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// The next `count` serializable commits fail with a serialization error.
    pub fn inject_serialization_failures(&self, count: usize) {
        self.faults
            .serialization_failures
            .store(count, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("memory gateway offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, statement: &str) -> DbResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed(format!("{statement} rejected")));
        }
        Ok(())
    }

    fn take_serialization_failure(&self) -> bool {
        self.faults
            .serialization_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    type Tx = MemoryTx;

    async fn open_transaction(&self, isolation: IsolationLevel) -> DbResult<Self::Tx> {
        self.check_available()?;

        let committed = Arc::clone(&self.state).lock_owned().await;
        let staged = committed.clone();

        debug!(?isolation, "Memory transaction opened");
        Ok(MemoryTx {
            committed,
            staged,
            isolation,
        })
    }

    async fn commit(&self, tx: Self::Tx) -> DbResult<()> {
        if self.faults.fail_commits.load(Ordering::SeqCst) {
            return Err(DbError::TransactionFailed("commit rejected".to_string()));
        }
        if tx.isolation == IsolationLevel::Serializable && self.take_serialization_failure() {
            return Err(DbError::SerializationFailure(
                "could not serialize access due to concurrent update".to_string(),
            ));
        }

        let MemoryTx {
            mut committed,
            staged,
            ..
        } = tx;
        *committed = staged;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            warn!("Rollback while memory gateway offline; staged writes dropped");
        }
        drop(tx);
    }

    async fn create_point(&self, city: City) -> DbResult<Point> {
        self.check_available()?;
        self.check_writable("INSERT points")?;

        let point = Point {
            id: Uuid::new_v4(),
            registered_at: Utc::now(),
            city,
        };
        self.state.lock().await.points.push(point.clone());
        Ok(point)
    }

    async fn get_point(&self, tx: &mut Self::Tx, id: Uuid) -> DbResult<Point> {
        tx.staged
            .points
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DbError::PointNotFound(id))
    }

    async fn get_active_reception(
        &self,
        tx: &mut Self::Tx,
        point_id: Uuid,
    ) -> DbResult<Option<Reception>> {
        Ok(tx.staged.active_reception_mut(point_id).cloned())
    }

    async fn close_active_reception(
        &self,
        tx: &mut Self::Tx,
        point_id: Uuid,
    ) -> DbResult<Option<Reception>> {
        self.check_writable("UPDATE receptions")?;

        Ok(tx.staged.active_reception_mut(point_id).map(|r| {
            r.status = ReceptionStatus::Closed;
            r.clone()
        }))
    }

    async fn create_reception(&self, tx: &mut Self::Tx, point_id: Uuid) -> DbResult<Reception> {
        self.check_writable("INSERT receptions")?;

        if tx.staged.active_receptions(point_id) > 0 {
            return Err(DbError::UniqueViolation {
                constraint: "uq_receptions_one_active_per_point".to_string(),
            });
        }

        let reception = Reception {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            point_id,
            status: ReceptionStatus::InProgress,
        };
        tx.staged.receptions.push(reception.clone());
        Ok(reception)
    }

    async fn create_product(
        &self,
        tx: &mut Self::Tx,
        reception_id: Uuid,
        product_type: ProductType,
    ) -> DbResult<Product> {
        self.check_writable("INSERT products")?;

        if !tx.staged.receptions.iter().any(|r| r.id == reception_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("reception {reception_id} does not exist"),
            });
        }

        let product = Product {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            product_type,
            reception_id,
        };
        tx.staged.products.push(product.clone());
        Ok(product)
    }

    async fn delete_last_product(&self, tx: &mut Self::Tx, reception_id: Uuid) -> DbResult<()> {
        self.check_writable("DELETE products")?;

        // Later insertion wins a timestamp tie.
        let last = tx
            .staged
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .max_by_key(|(index, p)| (p.received_at, *index))
            .map(|(index, _)| index);

        match last {
            Some(index) => {
                tx.staged.products.remove(index);
                Ok(())
            }
            None => Err(DbError::NoProductToDelete(reception_id)),
        }
    }

    async fn list_receptions_in_window(
        &self,
        tx: &mut Self::Tx,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: i64,
        limit: i64,
        _lock: RowLock,
    ) -> DbResult<Vec<Reception>> {
        let mut receptions: Vec<Reception> = tx
            .staged
            .receptions
            .iter()
            .filter(|r| r.started_at >= start && r.started_at <= end)
            .cloned()
            .collect();
        receptions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(receptions.into_iter().skip(offset).take(limit).collect())
    }

    async fn list_products(
        &self,
        tx: &mut Self::Tx,
        reception_id: Uuid,
        _lock: RowLock,
    ) -> DbResult<Vec<Product>> {
        let mut products: Vec<Product> = tx
            .staged
            .products
            .iter()
            .filter(|p| p.reception_id == reception_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.received_at);
        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let gateway = MemoryGateway::new();
        let point = gateway.create_point(City::Kazan).await.unwrap();

        let mut tx = gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await
            .unwrap();
        gateway.create_reception(&mut tx, point.id).await.unwrap();
        gateway.rollback(tx).await;

        assert!(gateway.snapshot().await.receptions().is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let gateway = MemoryGateway::new();
        let point = gateway.create_point(City::Moscow).await.unwrap();

        let mut tx = gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await
            .unwrap();
        let reception = gateway.create_reception(&mut tx, point.id).await.unwrap();
        gateway.commit(tx).await.unwrap();

        let state = gateway.snapshot().await;
        assert_eq!(state.receptions(), &[reception]);
        assert_eq!(state.active_receptions(point.id), 1);
    }

    #[tokio::test]
    async fn test_get_point_not_found() {
        let gateway = MemoryGateway::new();
        let mut tx = gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await
            .unwrap();

        let missing = Uuid::new_v4();
        let err = gateway.get_point(&mut tx, missing).await.unwrap_err();
        assert!(matches!(err, DbError::PointNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_delete_last_product_is_lifo() {
        let gateway = MemoryGateway::new();
        let point = gateway.create_point(City::Moscow).await.unwrap();
        let mut tx = gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await
            .unwrap();
        let reception = gateway.create_reception(&mut tx, point.id).await.unwrap();

        let first = gateway
            .create_product(&mut tx, reception.id, ProductType::Shoes)
            .await
            .unwrap();
        gateway
            .create_product(&mut tx, reception.id, ProductType::Clothes)
            .await
            .unwrap();

        gateway.delete_last_product(&mut tx, reception.id).await.unwrap();
        let remaining = gateway
            .list_products(&mut tx, reception.id, RowLock::None)
            .await
            .unwrap();
        assert_eq!(remaining, vec![first]);

        gateway.delete_last_product(&mut tx, reception.id).await.unwrap();
        let err = gateway
            .delete_last_product(&mut tx, reception.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NoProductToDelete(_)));
    }

    #[tokio::test]
    async fn test_second_active_reception_violates_unique_index() {
        let gateway = MemoryGateway::new();
        let point = gateway.create_point(City::Moscow).await.unwrap();
        let mut tx = gateway
            .open_transaction(IsolationLevel::Serializable)
            .await
            .unwrap();

        gateway.create_reception(&mut tx, point.id).await.unwrap();
        let err = gateway.create_reception(&mut tx, point.id).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_blocks_new_transactions() {
        let gateway = MemoryGateway::new();
        gateway.set_unavailable(true);

        let err = gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await
            .err()
            .unwrap();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_injected_serialization_failures_are_consumed() {
        let gateway = MemoryGateway::new();
        gateway.inject_serialization_failures(1);

        let tx = gateway
            .open_transaction(IsolationLevel::Serializable)
            .await
            .unwrap();
        assert!(gateway.commit(tx).await.unwrap_err().is_serialization_conflict());

        let tx = gateway
            .open_transaction(IsolationLevel::Serializable)
            .await
            .unwrap();
        assert!(gateway.commit(tx).await.is_ok());
    }
}
