//! Status types for orders and dishes

use serde::{Deserialize, Serialize};

/// Order-level status
///
/// The stored strings (`"New"`, `"In progress"`, `"Closed"`) are part of
/// the compatibility contract for reporting consumers reading the
/// database directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OrderStatus {
    #[default]
    New,
    #[serde(rename = "In progress")]
    InProgress,
    Closed,
}

impl OrderStatus {
    /// Database / wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::InProgress => "In progress",
            OrderStatus::Closed => "Closed",
        }
    }

    /// Parse a stored status string.
    ///
    /// `"Sent"` is a legacy order-level value from before dish-level send
    /// tracking and normalizes to `InProgress`. Unrecognized strings fall
    /// back to `New`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "Closed" {
            OrderStatus::Closed
        } else if trimmed == "Sent" || trimmed.eq_ignore_ascii_case("in progress") {
            OrderStatus::InProgress
        } else {
            OrderStatus::New
        }
    }
}

/// Dish-level status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DishStatus {
    #[default]
    New,
    Sent,
}

impl DishStatus {
    /// Database / wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            DishStatus::New => "New",
            DishStatus::Sent => "Sent",
        }
    }

    /// Parse a stored status string; unrecognized values fall back to `New`
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Sent" => DishStatus::Sent,
            _ => DishStatus::New,
        }
    }
}
