//! Shared types for the comanda order core
//!
//! Pure domain crate: the order aggregate (Order → Dish → Product) with
//! invariant-preserving mutators, the status enums, and the read-only
//! catalog reference models. No I/O here; persistence and orchestration
//! live in `comanda-core`.

pub mod models;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};
