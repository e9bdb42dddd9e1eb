//! # Reception Repository
//!
//! ## Reception Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Reception Lifecycle                               │
//! │                                                                         │
//! │  1. START                                                              │
//! │     └── find_active() → None   (row lock held if Some)                 │
//! │     └── insert()      → Reception { status: InProgress }               │
//! │                                                                         │
//! │  2. ACCEPT ITEMS (product repository)                                  │
//! │     └── find_active() → Some(reception), locked                        │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close_active() → UPDATE … WHERE status = 'in_progress'         │
//! │                          RETURNING …   (no read-then-write gap)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::gateway::RowLock;
use pickup_core::{Reception, ReceptionStatus};

/// Finds the in-progress reception of a point and locks it (`FOR UPDATE`).
pub async fn find_active(conn: &mut PgConnection, point_id: Uuid) -> DbResult<Option<Reception>> {
    let reception = sqlx::query_as::<_, Reception>(
        r#"
        SELECT id, started_at, point_id, status
        FROM receptions
        WHERE point_id = $1 AND status = $2
        FOR UPDATE
        "#,
    )
    .bind(point_id)
    .bind(ReceptionStatus::InProgress)
    .fetch_optional(conn)
    .await?;

    Ok(reception)
}

/// Closes the in-progress reception of a point, returning it.
///
/// `Ok(None)` when the point had no reception in progress.
pub async fn close_active(conn: &mut PgConnection, point_id: Uuid) -> DbResult<Option<Reception>> {
    debug!(point_id = %point_id, "Closing active reception");

    let reception = sqlx::query_as::<_, Reception>(
        r#"
        UPDATE receptions
        SET status = $1
        WHERE point_id = $2 AND status = $3
        RETURNING id, started_at, point_id, status
        "#,
    )
    .bind(ReceptionStatus::Closed)
    .bind(point_id)
    .bind(ReceptionStatus::InProgress)
    .fetch_optional(conn)
    .await?;

    Ok(reception)
}

/// Inserts a new in-progress reception.
pub async fn insert(conn: &mut PgConnection, point_id: Uuid) -> DbResult<Reception> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    debug!(id = %id, point_id = %point_id, "Inserting reception");

    let reception = sqlx::query_as::<_, Reception>(
        r#"
        INSERT INTO receptions (id, started_at, point_id, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id, started_at, point_id, status
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(point_id)
    .bind(ReceptionStatus::InProgress)
    .fetch_one(conn)
    .await?;

    Ok(reception)
}

/// Lists receptions started within `[start, end]`, newest first.
///
/// Ties on `started_at` are broken by id so pages never overlap.
pub async fn list_in_window(
    conn: &mut PgConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    offset: i64,
    limit: i64,
    lock: RowLock,
) -> DbResult<Vec<Reception>> {
    let sql = format!(
        r#"
        SELECT id, started_at, point_id, status
        FROM receptions
        WHERE started_at BETWEEN $1 AND $2
        ORDER BY started_at DESC, id DESC
        LIMIT $3 OFFSET $4{}
        "#,
        lock.clause()
    );

    let receptions = sqlx::query_as::<_, Reception>(&sql)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;

    debug!(count = receptions.len(), offset, limit, "Window returned receptions");
    Ok(receptions)
}
