//! Order Sequence State (Singleton)
//!
//! One durable row tracking the highest order identifier ever issued,
//! independent of live rows. It is raised on every save *and* every
//! delete, so deleting the newest order can never cause its number to be
//! reissued after a restart.

use super::RepoResult;
use crate::orders::number;
use sqlx::{SqliteConnection, SqlitePool};

const STATE_KEY: &str = "max_order_id";

/// Stored historical maximum, if any
pub async fn get(pool: &SqlitePool) -> RepoResult<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_issued_id FROM order_sequence_state WHERE key = ?")
            .bind(STATE_KEY)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(id,)| id).filter(|id| !id.is_empty()))
}

/// Raise the stored maximum to `order_id` when it compares greater or
/// equal; malformed identifiers are ignored. Takes a connection so that
/// `save`/`delete` can run it inside their transaction.
pub async fn record_issued(conn: &mut SqliteConnection, order_id: &str) -> RepoResult<()> {
    if number::parse_order_id(order_id).is_none() {
        return Ok(());
    }

    let current: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_issued_id FROM order_sequence_state WHERE key = ?")
            .bind(STATE_KEY)
            .fetch_optional(&mut *conn)
            .await?;
    let current = current.and_then(|(id,)| id).unwrap_or_default();

    if current.is_empty() || number::compare_order_ids(order_id, &current).is_ge() {
        sqlx::query(
            "INSERT OR REPLACE INTO order_sequence_state (key, last_issued_id) VALUES (?, ?)",
        )
        .bind(STATE_KEY)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
