//! Legacy schema compatibility
//!
//! Databases created by earlier releases carry an `orders` table without
//! the newer columns and no migration history, so `CREATE TABLE IF NOT
//! EXISTS` alone leaves them behind. Detect missing columns via
//! `PRAGMA table_info` and add them with safe defaults so old rows keep
//! loading.

use sqlx::{Row, SqlitePool};

/// Columns added to `orders` after its first release
const ORDERS_COLUMNS: &[(&str, &str)] = &[
    ("service_date", "TEXT"),
    ("sent_status", "INTEGER NOT NULL DEFAULT 0"),
    ("additional_notes", "TEXT NOT NULL DEFAULT ''"),
    (
        "include_additional_notes_in_ticket",
        "INTEGER NOT NULL DEFAULT 0",
    ),
];

/// Add any missing `orders` columns with their safe defaults
pub async fn ensure_orders_columns(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let rows = sqlx::query("PRAGMA table_info(orders)")
        .fetch_all(pool)
        .await?;
    let existing: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    for (column, definition) in ORDERS_COLUMNS {
        if existing.iter().any(|name| name == column) {
            continue;
        }
        tracing::info!(column, "Adding missing orders column");
        sqlx::query(&format!("ALTER TABLE orders ADD COLUMN {column} {definition}"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn raw_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn backfills_missing_columns() {
        let pool = raw_pool().await;
        // First-release shape of the orders table
        sqlx::query(
            "CREATE TABLE orders (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                closed_at TEXT NOT NULL,
                name TEXT,
                table_name TEXT,
                status TEXT NOT NULL,
                to_go INTEGER NOT NULL,
                amount_paid REAL NOT NULL,
                total_amount REAL NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        ensure_orders_columns(&pool).await.unwrap();

        let rows = sqlx::query("PRAGMA table_info(orders)")
            .fetch_all(&pool)
            .await
            .unwrap();
        let columns: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
        for (column, _) in ORDERS_COLUMNS {
            assert!(columns.iter().any(|c| c == column), "missing {column}");
        }

        // Idempotent on a second pass
        ensure_orders_columns(&pool).await.unwrap();
    }
}
