//! Dining Table Repository (read-only)

use super::RepoResult;
use sqlx::SqlitePool;

/// Distinct active table names in board order
pub async fn fetch_active_names(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT table_name FROM tables WHERE is_active = 1 ORDER BY position, id")
            .fetch_all(pool)
            .await?;

    let mut names: Vec<String> = Vec::with_capacity(rows.len());
    for (name,) in rows {
        let name = name.trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}
