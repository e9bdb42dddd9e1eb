//! # Lifecycle Orchestrator
//!
//! Point, reception and product state transitions composed out of
//! [`StorageGateway`] calls inside one transaction per operation.
//!
//! ## Isolation per Operation
//! ```text
//! ┌──────────────────────────┬────────────────┬──────────────────────────────┐
//! │ Operation                │ Isolation      │ Coordination                 │
//! ├──────────────────────────┼────────────────┼──────────────────────────────┤
//! │ open_point               │ (no tx)        │ single insert                │
//! │ start_reception          │ SERIALIZABLE   │ conflict detection + retry   │
//! │ close_active_reception   │ READ COMMITTED │ UPDATE … RETURNING           │
//! │ append_product           │ READ COMMITTED │ FOR UPDATE on active row     │
//! │ remove_last_product      │ READ COMMITTED │ FOR UPDATE on active row     │
//! │ get_report               │ READ COMMITTED │ configurable row lock        │
//! └──────────────────────────┴────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Settling a Transaction
//! ```text
//!   steps ──► Ok(value) ──────────► commit ──► failed? ──► storage error
//!     │
//!     ├────► Err(rule outcome that still commits) ──► commit, log failure
//!     │
//!     └────► Err(anything else) ──► rollback
//! ```
//! A commit or rollback problem after a failure is already decided is logged
//! and never replaces that failure.

use std::collections::HashMap;

use pickup_core::{
    City, CoreError, CoreResult, Point, PointReport, Product, ProductType, Reception,
    ReceptionReport, ReportQuery,
};
use pickup_db::{DbError, IsolationLevel, RowLock, StorageGateway};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::retry::RetryPolicy;

// =============================================================================
// Internal Failure
// =============================================================================

/// Failure of an operation before translation for the caller.
///
/// Storage detail stays here until it is logged.
#[derive(Debug)]
enum Failure {
    Rule(CoreError),
    Store(DbError),
}

impl Failure {
    fn is_serialization_conflict(&self) -> bool {
        matches!(self, Failure::Store(e) if e.is_serialization_conflict())
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        Failure::Rule(err)
    }
}

/// Not-found signals from the gateway are business outcomes.
impl From<DbError> for Failure {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PointNotFound(id) => Failure::Rule(CoreError::PointNotFound(id)),
            DbError::NoProductToDelete(id) => Failure::Rule(CoreError::NoProductToDelete(id)),
            other => Failure::Store(other),
        }
    }
}

/// Translates a failure into the caller-facing error, logging storage detail.
fn finish<T>(operation: &'static str, outcome: Result<T, Failure>) -> CoreResult<T> {
    match outcome {
        Ok(value) => Ok(value),
        Err(Failure::Rule(err)) => {
            debug!(operation, error = %err, "Operation refused");
            Err(err)
        }
        Err(Failure::Store(err)) if err.is_unavailable() => {
            error!(operation, error = %err, "Storage unavailable");
            Err(CoreError::StorageUnavailable)
        }
        Err(Failure::Store(err)) => {
            error!(operation, error = %err, "Storage failure");
            Err(CoreError::Storage)
        }
    }
}

fn commit_on_success_only(_: &CoreError) -> bool {
    false
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Enforces the reception lifecycle over an injected storage gateway.
///
/// Holds no mutable state; share it across tasks behind an `Arc`.
///
/// ## Example
/// ```rust,ignore
/// let orchestrator = LifecycleOrchestrator::new(MemoryGateway::new());
///
/// let point = orchestrator.open_point(City::Kazan).await?;
/// orchestrator.start_reception(point.id).await?;
/// orchestrator.append_product(point.id, ProductType::Shoes).await?;
/// orchestrator.close_active_reception(point.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LifecycleOrchestrator<G> {
    gateway: G,
    report_lock: RowLock,
    retry: RetryPolicy,
}

impl<G: StorageGateway> LifecycleOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        LifecycleOrchestrator {
            gateway,
            report_lock: RowLock::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Row lock taken on receptions and products read by [`Self::get_report`].
    pub fn with_report_locking(mut self, lock: RowLock) -> Self {
        self.report_lock = lock;
        self
    }

    /// Retries for [`Self::start_reception`] after serialization failures.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn from_config(gateway: G, config: &ServiceConfig) -> Self {
        LifecycleOrchestrator::new(gateway)
            .with_report_locking(config.report_locking)
            .with_retry_policy(config.retry_policy())
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // =========================================================================
    // Points
    // =========================================================================

    /// Registers a new point. Single insert, no transaction.
    #[instrument(skip(self))]
    pub async fn open_point(&self, city: City) -> CoreResult<Point> {
        let outcome = self.gateway.create_point(city).await.map_err(Failure::Store);
        let point = finish("open_point", outcome)?;

        info!(point_id = %point.id, %city, "Point opened");
        Ok(point)
    }

    /// Parses a city name, then opens the point.
    ///
    /// ## Returns
    /// * `Err(CoreError::InvalidCity)` - name is not a supported city
    pub async fn open_point_named(&self, city: &str) -> CoreResult<Point> {
        let city: City = city.parse()?;
        self.open_point(city).await
    }

    // =========================================================================
    // Receptions
    // =========================================================================

    /// Starts a reception at a point that has none in progress.
    ///
    /// Runs SERIALIZABLE so two concurrent callers cannot both observe "no
    /// active reception". The loser of a serialization race is retried from
    /// scratch per the retry policy and then sees the winner's reception.
    ///
    /// ## Returns
    /// * `Err(PointNotFound)` - no such point
    /// * `Err(ReceptionAlreadyActive)` - a reception is already in progress
    #[instrument(skip(self))]
    pub async fn start_reception(&self, point_id: Uuid) -> CoreResult<Reception> {
        let mut attempt = 0;
        loop {
            let outcome = self.start_reception_once(point_id).await;

            match outcome {
                Err(ref failure)
                    if failure.is_serialization_conflict() && attempt < self.retry.max_retries =>
                {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        point_id = %point_id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Serialization conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                outcome => {
                    let reception = finish("start_reception", outcome)?;
                    info!(point_id = %point_id, reception_id = %reception.id, "Reception started");
                    return Ok(reception);
                }
            }
        }
    }

    async fn start_reception_once(&self, point_id: Uuid) -> Result<Reception, Failure> {
        let mut tx = self
            .gateway
            .open_transaction(IsolationLevel::Serializable)
            .await?;
        let outcome = self.start_reception_steps(&mut tx, point_id).await;
        self.settle(tx, outcome, commit_on_success_only).await
    }

    async fn start_reception_steps(
        &self,
        tx: &mut G::Tx,
        point_id: Uuid,
    ) -> Result<Reception, Failure> {
        self.gateway.get_point(tx, point_id).await?;

        if self.gateway.get_active_reception(tx, point_id).await?.is_some() {
            return Err(CoreError::ReceptionAlreadyActive(point_id).into());
        }

        match self.gateway.create_reception(tx, point_id).await {
            Ok(reception) => Ok(reception),
            // A concurrent start won the one-active-per-point index.
            Err(DbError::UniqueViolation { .. }) => {
                Err(CoreError::ReceptionAlreadyActive(point_id).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Closes the reception in progress at a point.
    ///
    /// ## Returns
    /// * `Err(PointNotFound)` - no such point
    /// * `Err(NoActiveReception)` - nothing to close (the empty work commits)
    #[instrument(skip(self))]
    pub async fn close_active_reception(&self, point_id: Uuid) -> CoreResult<Reception> {
        let outcome = self.close_active_reception_tx(point_id).await;
        let reception = finish("close_active_reception", outcome)?;

        info!(point_id = %point_id, reception_id = %reception.id, "Reception closed");
        Ok(reception)
    }

    async fn close_active_reception_tx(&self, point_id: Uuid) -> Result<Reception, Failure> {
        let mut tx = self
            .gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await?;
        let outcome = self.close_active_reception_steps(&mut tx, point_id).await;
        self.settle(tx, outcome, |err| matches!(err, CoreError::NoActiveReception(_)))
            .await
    }

    async fn close_active_reception_steps(
        &self,
        tx: &mut G::Tx,
        point_id: Uuid,
    ) -> Result<Reception, Failure> {
        self.gateway.get_point(tx, point_id).await?;
        self.gateway
            .close_active_reception(tx, point_id)
            .await?
            .ok_or(Failure::Rule(CoreError::NoActiveReception(point_id)))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Accepts a product into the point's reception in progress.
    #[instrument(skip(self))]
    pub async fn append_product(
        &self,
        point_id: Uuid,
        product_type: ProductType,
    ) -> CoreResult<Product> {
        let outcome = self.append_product_tx(point_id, product_type).await;
        let product = finish("append_product", outcome)?;

        debug!(
            product_id = %product.id,
            reception_id = %product.reception_id,
            "Product appended"
        );
        Ok(product)
    }

    async fn append_product_tx(
        &self,
        point_id: Uuid,
        product_type: ProductType,
    ) -> Result<Product, Failure> {
        let mut tx = self
            .gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await?;
        let outcome = self.append_product_steps(&mut tx, point_id, product_type).await;
        self.settle(tx, outcome, commit_on_success_only).await
    }

    async fn append_product_steps(
        &self,
        tx: &mut G::Tx,
        point_id: Uuid,
        product_type: ProductType,
    ) -> Result<Product, Failure> {
        let reception = self.locked_active_reception(tx, point_id).await?;
        let product = self
            .gateway
            .create_product(tx, reception.id, product_type)
            .await?;
        Ok(product)
    }

    /// Removes the most recently received product of the point's reception
    /// in progress.
    ///
    /// ## Returns
    /// * `Err(NoActiveReception)` - no reception in progress
    /// * `Err(NoProductToDelete)` - reception is empty (the transaction
    ///   still commits)
    #[instrument(skip(self))]
    pub async fn remove_last_product(&self, point_id: Uuid) -> CoreResult<()> {
        let outcome = self.remove_last_product_tx(point_id).await;
        finish("remove_last_product", outcome)?;

        debug!(point_id = %point_id, "Last product removed");
        Ok(())
    }

    async fn remove_last_product_tx(&self, point_id: Uuid) -> Result<(), Failure> {
        let mut tx = self
            .gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await?;
        let outcome = self.remove_last_product_steps(&mut tx, point_id).await;
        self.settle(tx, outcome, |err| {
            matches!(
                err,
                CoreError::NoProductToDelete(_) | CoreError::NoActiveReception(_)
            )
        })
        .await
    }

    async fn remove_last_product_steps(
        &self,
        tx: &mut G::Tx,
        point_id: Uuid,
    ) -> Result<(), Failure> {
        let reception = self.locked_active_reception(tx, point_id).await?;
        self.gateway.delete_last_product(tx, reception.id).await?;
        Ok(())
    }

    /// Verifies the point, then fetches and locks its reception in progress.
    async fn locked_active_reception(
        &self,
        tx: &mut G::Tx,
        point_id: Uuid,
    ) -> Result<Reception, Failure> {
        self.gateway.get_point(tx, point_id).await?;
        self.gateway
            .get_active_reception(tx, point_id)
            .await?
            .ok_or(Failure::Rule(CoreError::NoActiveReception(point_id)))
    }

    // =========================================================================
    // Report
    // =========================================================================

    /// One page of receptions started within the query window, newest
    /// first, grouped by point in the order points first appear.
    ///
    /// The window and pagination are validated before any transaction
    /// opens. An empty page is `Ok(vec![])`.
    #[instrument(skip(self))]
    pub async fn get_report(&self, query: &ReportQuery) -> CoreResult<Vec<PointReport>> {
        query.validate()?;

        let outcome = self.get_report_tx(query).await;
        let report = finish("get_report", outcome)?;

        debug!(points = report.len(), "Report assembled");
        Ok(report)
    }

    async fn get_report_tx(&self, query: &ReportQuery) -> Result<Vec<PointReport>, Failure> {
        let mut tx = self
            .gateway
            .open_transaction(IsolationLevel::ReadCommitted)
            .await?;
        let outcome = self.collect_report(&mut tx, query).await;
        self.settle(tx, outcome, commit_on_success_only).await
    }

    async fn collect_report(
        &self,
        tx: &mut G::Tx,
        query: &ReportQuery,
    ) -> Result<Vec<PointReport>, Failure> {
        let receptions = self
            .gateway
            .list_receptions_in_window(
                tx,
                query.start,
                query.end,
                query.offset(),
                query.limit(),
                self.report_lock,
            )
            .await?;

        let mut groups: Vec<PointReport> = Vec::new();
        // point id → position in `groups`; lives for this call only
        let mut seen: HashMap<Uuid, usize> = HashMap::new();

        for reception in receptions {
            let products = self
                .gateway
                .list_products(tx, reception.id, self.report_lock)
                .await?;

            let slot = match seen.get(&reception.point_id) {
                Some(&slot) => slot,
                None => {
                    // Foreign keys guarantee the point; a miss is an integrity fault.
                    let point = self
                        .gateway
                        .get_point(tx, reception.point_id)
                        .await
                        .map_err(Failure::Store)?;
                    groups.push(PointReport {
                        point,
                        receptions: Vec::new(),
                    });
                    seen.insert(reception.point_id, groups.len() - 1);
                    groups.len() - 1
                }
            };

            groups[slot].receptions.push(ReceptionReport {
                reception,
                products,
            });
        }

        Ok(groups)
    }

    // =========================================================================
    // Transaction Settlement
    // =========================================================================

    /// Commits or rolls back according to the outcome.
    async fn settle<T>(
        &self,
        tx: G::Tx,
        outcome: Result<T, Failure>,
        commit_on: fn(&CoreError) -> bool,
    ) -> Result<T, Failure> {
        match outcome {
            Ok(value) => {
                self.gateway.commit(tx).await.map_err(Failure::Store)?;
                Ok(value)
            }
            Err(Failure::Rule(err)) if commit_on(&err) => {
                if let Err(commit_err) = self.gateway.commit(tx).await {
                    warn!(error = %commit_err, outcome = %err, "Commit failed after refusal");
                }
                Err(Failure::Rule(err))
            }
            Err(failure) => {
                self.gateway.rollback(tx).await;
                Err(failure)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use pickup_core::ReceptionStatus;
    use pickup_db::MemoryGateway;
    use std::sync::Arc;

    fn orchestrator() -> LifecycleOrchestrator<MemoryGateway> {
        LifecycleOrchestrator::new(MemoryGateway::new())
            .with_retry_policy(RetryPolicy::default().with_initial_delay(std::time::Duration::ZERO))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::default() + Duration::seconds(secs)
    }

    async fn seed_reception(
        gateway: &MemoryGateway,
        point_id: Uuid,
        secs: i64,
        status: ReceptionStatus,
    ) -> Reception {
        let reception = Reception {
            id: Uuid::new_v4(),
            started_at: at(secs),
            point_id,
            status,
        };
        gateway.seed_reception(reception.clone()).await;
        reception
    }

    // -------------------------------------------------------------------------
    // Points
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_open_point_named() {
        let orch = orchestrator();

        let point = orch.open_point_named("Казань").await.unwrap();
        assert_eq!(point.city, City::Kazan);

        let err = orch.open_point_named("Новосибирск").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidCity(_)));
        assert_eq!(orch.gateway().snapshot().await.points().len(), 1);
    }

    #[tokio::test]
    async fn test_open_point_when_store_offline() {
        let orch = orchestrator();
        orch.gateway().set_unavailable(true);

        let err = orch.open_point(City::Moscow).await.unwrap_err();
        assert!(matches!(err, CoreError::StorageUnavailable));
    }

    // -------------------------------------------------------------------------
    // Receptions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_reception_unknown_point() {
        let orch = orchestrator();
        let missing = Uuid::new_v4();

        let err = orch.start_reception(missing).await.unwrap_err();
        assert!(matches!(err, CoreError::PointNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_at_most_one_active_reception() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();

        orch.start_reception(point.id).await.unwrap();
        let err = orch.start_reception(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::ReceptionAlreadyActive(_)));

        orch.close_active_reception(point.id).await.unwrap();
        orch.start_reception(point.id).await.unwrap();
        orch.close_active_reception(point.id).await.unwrap();
        orch.start_reception(point.id).await.unwrap();

        let state = orch.gateway().snapshot().await;
        assert_eq!(state.active_receptions(point.id), 1);
        assert_eq!(state.receptions().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_yield_one_winner() {
        let orch = Arc::new(orchestrator());
        let point = orch.open_point(City::SaintPetersburg).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let orch = Arc::clone(&orch);
                tokio::spawn(async move { orch.start_reception(point.id).await })
            })
            .collect();

        let mut started = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => started += 1,
                Err(CoreError::ReceptionAlreadyActive(_)) => refused += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(started, 1);
        assert_eq!(refused, 15);
        assert_eq!(orch.gateway().snapshot().await.active_receptions(point.id), 1);
    }

    #[tokio::test]
    async fn test_serialization_conflicts_are_retried() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();
        orch.gateway().inject_serialization_failures(2);

        let reception = orch.start_reception(point.id).await.unwrap();
        assert!(reception.is_active());
    }

    #[tokio::test]
    async fn test_serialization_conflict_without_retries_is_storage_error() {
        let orch = orchestrator().with_retry_policy(RetryPolicy::none());
        let point = orch.open_point(City::Moscow).await.unwrap();
        orch.gateway().inject_serialization_failures(1);

        let err = orch.start_reception(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage));
        assert_eq!(orch.gateway().snapshot().await.active_receptions(point.id), 0);
    }

    #[tokio::test]
    async fn test_close_twice() {
        let orch = orchestrator();
        let point = orch.open_point(City::Kazan).await.unwrap();
        let started = orch.start_reception(point.id).await.unwrap();

        let closed = orch.close_active_reception(point.id).await.unwrap();
        assert_eq!(closed.id, started.id);
        assert_eq!(closed.status, ReceptionStatus::Closed);

        let err = orch.close_active_reception(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoActiveReception(_)));
    }

    #[tokio::test]
    async fn test_failed_commit_surfaces_storage_error() {
        let orch = orchestrator();
        let point = orch.open_point(City::Kazan).await.unwrap();
        orch.start_reception(point.id).await.unwrap();

        orch.gateway().fail_commits(true);
        let err = orch.close_active_reception(point.id).await.unwrap_err();
        assert!(err.is_storage());

        orch.gateway().fail_commits(false);
        assert_eq!(orch.gateway().snapshot().await.active_receptions(point.id), 1);
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_products_removed_last_in_first_out() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();
        let reception = orch.start_reception(point.id).await.unwrap();

        let p1 = orch.append_product(point.id, ProductType::Electronics).await.unwrap();
        let p2 = orch.append_product(point.id, ProductType::Clothes).await.unwrap();
        orch.append_product(point.id, ProductType::Shoes).await.unwrap();

        let remaining = |state: &pickup_db::MemoryState| -> Vec<Uuid> {
            state.products_of(reception.id).iter().map(|p| p.id).collect()
        };

        orch.remove_last_product(point.id).await.unwrap();
        assert_eq!(remaining(&orch.gateway().snapshot().await), vec![p1.id, p2.id]);

        orch.remove_last_product(point.id).await.unwrap();
        assert_eq!(remaining(&orch.gateway().snapshot().await), vec![p1.id]);

        orch.remove_last_product(point.id).await.unwrap();
        assert!(remaining(&orch.gateway().snapshot().await).is_empty());

        let err = orch.remove_last_product(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoProductToDelete(id) if id == reception.id));
    }

    #[tokio::test]
    async fn test_no_active_reception_guards() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();
        orch.start_reception(point.id).await.unwrap();
        orch.append_product(point.id, ProductType::Shoes).await.unwrap();
        orch.close_active_reception(point.id).await.unwrap();
        let before = orch.gateway().snapshot().await;

        let err = orch.append_product(point.id, ProductType::Clothes).await.unwrap_err();
        assert!(matches!(err, CoreError::NoActiveReception(_)));

        let err = orch.remove_last_product(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoActiveReception(_)));

        let err = orch.close_active_reception(point.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoActiveReception(_)));

        let after = orch.gateway().snapshot().await;
        assert_eq!(after.receptions(), before.receptions());
        assert_eq!(after.products(), before.products());
    }

    #[tokio::test]
    async fn test_append_to_unknown_point() {
        let orch = orchestrator();
        let err = orch
            .append_product(Uuid::new_v4(), ProductType::Shoes)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PointNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();
        orch.start_reception(point.id).await.unwrap();

        orch.gateway().fail_writes(true);
        let err = orch.append_product(point.id, ProductType::Shoes).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage));

        orch.gateway().fail_writes(false);
        assert!(orch.gateway().snapshot().await.products().is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_hides_driver_detail() {
        let orch = orchestrator();
        let point = orch.open_point(City::Moscow).await.unwrap();
        orch.start_reception(point.id).await.unwrap();

        orch.gateway().fail_writes(true);
        let err = orch.remove_last_product(point.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Storage failure");
    }

    // -------------------------------------------------------------------------
    // Report
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_report_groups_by_point_newest_first() {
        let orch = orchestrator();
        let gateway = orch.gateway().clone();
        let a = orch.open_point(City::Moscow).await.unwrap();
        let b = orch.open_point(City::Kazan).await.unwrap();

        let r1 = seed_reception(&gateway, a.id, 10, ReceptionStatus::Closed).await;
        let r2 = seed_reception(&gateway, a.id, 20, ReceptionStatus::InProgress).await;
        let r3 = seed_reception(&gateway, b.id, 15, ReceptionStatus::InProgress).await;
        orch.append_product(b.id, ProductType::Clothes).await.unwrap();

        let report = orch
            .get_report(&ReportQuery::new(at(0), at(100)))
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].point.id, a.id);
        assert_eq!(report[1].point.id, b.id);

        let a_receptions: Vec<Uuid> = report[0].receptions.iter().map(|r| r.reception.id).collect();
        assert_eq!(a_receptions, vec![r2.id, r1.id]);

        assert_eq!(report[1].receptions.len(), 1);
        assert_eq!(report[1].receptions[0].reception.id, r3.id);
        assert_eq!(report[1].receptions[0].products.len(), 1);
    }

    #[tokio::test]
    async fn test_report_pages_of_one() {
        let orch = orchestrator();
        let gateway = orch.gateway().clone();
        let a = orch.open_point(City::Moscow).await.unwrap();
        let b = orch.open_point(City::SaintPetersburg).await.unwrap();

        seed_reception(&gateway, a.id, 10, ReceptionStatus::Closed).await;
        seed_reception(&gateway, b.id, 15, ReceptionStatus::Closed).await;
        seed_reception(&gateway, a.id, 20, ReceptionStatus::Closed).await;

        let mut seen = Vec::new();
        for page in 1..=3 {
            let query = ReportQuery::new(at(0), at(100))
                .with_page(page)
                .with_page_size(1);
            let report = orch.get_report(&query).await.unwrap();
            assert_eq!(pickup_core::report::reception_count(&report), 1);
            seen.push(report[0].receptions[0].reception.started_at);
        }
        assert_eq!(seen, vec![at(20), at(15), at(10)]);

        let query = ReportQuery::new(at(0), at(100)).with_page(4).with_page_size(1);
        assert!(orch.get_report(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_window_is_inclusive() {
        let orch = orchestrator();
        let gateway = orch.gateway().clone();
        let a = orch.open_point(City::Moscow).await.unwrap();

        seed_reception(&gateway, a.id, 10, ReceptionStatus::Closed).await;
        seed_reception(&gateway, a.id, 20, ReceptionStatus::Closed).await;
        seed_reception(&gateway, a.id, 30, ReceptionStatus::Closed).await;

        let report = orch
            .get_report(&ReportQuery::new(at(10), at(20)))
            .await
            .unwrap();
        assert_eq!(pickup_core::report::reception_count(&report), 2);
    }

    #[tokio::test]
    async fn test_inverted_window_never_touches_storage() {
        let orch = orchestrator();
        orch.gateway().set_unavailable(true);

        let err = orch
            .get_report(&ReportQuery::new(at(100), at(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTimeRange));
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let orch = orchestrator();
        let err = orch
            .get_report(&ReportQuery::until_now().with_page(0))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_empty_report() {
        let orch = orchestrator().with_report_locking(RowLock::None);
        let report = orch.get_report(&ReportQuery::until_now()).await.unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = ServiceConfig::from_lookup(|var| match var {
            "PICKUP_REPORT_LOCKING" => Some("update".to_string()),
            "PICKUP_START_RETRIES" => Some("7".to_string()),
            _ => None,
        })
        .unwrap();

        let orch = LifecycleOrchestrator::from_config(MemoryGateway::new(), &config);
        assert_eq!(orch.report_lock, RowLock::Update);
        assert_eq!(orch.retry.max_retries, 7);
    }
}
