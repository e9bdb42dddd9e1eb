//! # Point Repository
//!
//! Points are inserted once and only read afterwards.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pickup_core::{City, Point};

/// Inserts a new point with a generated id and the current time.
pub async fn insert(conn: &mut PgConnection, city: City) -> DbResult<Point> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    debug!(id = %id, city = %city, "Inserting point");

    let point = sqlx::query_as::<_, Point>(
        r#"
        INSERT INTO points (id, registered_at, city)
        VALUES ($1, $2, $3)
        RETURNING id, registered_at, city
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(city)
    .fetch_one(conn)
    .await?;

    Ok(point)
}

/// Gets a point by ID.
///
/// ## Returns
/// * `Err(DbError::PointNotFound)` - no such point
pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> DbResult<Point> {
    let point = sqlx::query_as::<_, Point>(
        r#"
        SELECT id, registered_at, city
        FROM points
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    point.ok_or(DbError::PointNotFound(id))
}
