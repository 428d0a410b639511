//! Repository Module
//!
//! Function-style data access over the shared SQLite pool. Mutations of
//! the order graph always run inside a single transaction; read-only
//! catalog lookups never mutate.

pub mod dining_table;
pub mod menu;
pub mod order;
pub mod sequence_state;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
