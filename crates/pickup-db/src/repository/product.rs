//! # Product Repository
//!
//! Products are appended to and removed from the top of a reception's stack.
//!
//! ```text
//!   received_at ▲
//!               │  P3  ◄── delete_last() removes this one
//!               │  P2
//!               │  P1
//! ```

use chrono::Utc;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::gateway::RowLock;
use pickup_core::{Product, ProductType};

/// Inserts a product under a reception.
pub async fn insert(
    conn: &mut PgConnection,
    reception_id: Uuid,
    product_type: ProductType,
) -> DbResult<Product> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    debug!(id = %id, reception_id = %reception_id, product_type = %product_type, "Inserting product");

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, received_at, product_type, reception_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, received_at, product_type, reception_id
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(product_type)
    .bind(reception_id)
    .fetch_one(conn)
    .await?;

    Ok(product)
}

/// Deletes the most recently received product of a reception.
///
/// ## Returns
/// * `Err(DbError::NoProductToDelete)` - zero rows affected
pub async fn delete_last(conn: &mut PgConnection, reception_id: Uuid) -> DbResult<()> {
    debug!(reception_id = %reception_id, "Deleting last product");

    let result = sqlx::query(
        r#"
        DELETE FROM products
        WHERE id = (
            SELECT id
            FROM products
            WHERE reception_id = $1
            ORDER BY received_at DESC
            LIMIT 1
        )
        "#,
    )
    .bind(reception_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NoProductToDelete(reception_id));
    }

    Ok(())
}

/// Lists all products of a reception, oldest first.
pub async fn list_by_reception(
    conn: &mut PgConnection,
    reception_id: Uuid,
    lock: RowLock,
) -> DbResult<Vec<Product>> {
    let sql = format!(
        r#"
        SELECT id, received_at, product_type, reception_id
        FROM products
        WHERE reception_id = $1
        ORDER BY received_at{}
        "#,
        lock.clause()
    );

    let products = sqlx::query_as::<_, Product>(&sql)
        .bind(reception_id)
        .fetch_all(conn)
        .await?;

    Ok(products)
}
