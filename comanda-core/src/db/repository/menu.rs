//! Menu Repository (read-only)
//!
//! The core never writes the menu; administration happens outside. Rows
//! feed product names, prices, and note shortcuts into the aggregate.

use super::RepoResult;
use shared::models::MenuItem;
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: i64,
    product_name: String,
    cost: f64,
    shortcuts: String,
    color: String,
    shape: String,
    position: i32,
    product_type: String,
}

/// Active menu rows in board order
pub async fn fetch_active(pool: &SqlitePool) -> RepoResult<Vec<MenuItem>> {
    let rows: Vec<MenuRow> = sqlx::query_as(
        "SELECT id, product_name, cost, shortcuts, color, shape, position, product_type
         FROM menu WHERE is_active = 1 ORDER BY position, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter(|row| !row.product_name.trim().is_empty())
        .map(|row| MenuItem {
            id: row.id,
            product_name: row.product_name.trim().to_string(),
            cost: row.cost,
            shortcuts: parse_shortcuts(&row.shortcuts),
            color: row.color,
            shape: row.shape,
            position: row.position,
            product_type: row.product_type,
            is_active: true,
            is_custom: false,
        })
        .collect())
}

/// Shortcuts are stored either as a JSON array or a comma-separated list
fn parse_shortcuts(raw: &str) -> Vec<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if text.starts_with('[')
        && text.ends_with(']')
        && let Ok(serde_json::Value::Array(items)) = serde_json::from_str(text)
    {
        return items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
    }

    text.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
