//! Order — the root aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dish::Dish;
use super::money;
use super::types::{DishStatus, OrderStatus};

/// A customer ticket aggregating one or more dishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// `O{YYYYMMDD}{seq}`; immutable once assigned
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// First-close timestamp, stamped by the persistence layer. Kept
    /// across reopen/re-close cycles: the first close wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Business/reporting date; defaults to the creation date
    pub service_date: NaiveDate,
    pub name: String,
    pub table: String,
    pub additional_notes: String,
    pub include_additional_notes_in_ticket: bool,
    /// Order-level flag, propagated to dishes without an override
    pub to_go: bool,
    pub status: OrderStatus,
    /// True iff every dish has been sent; an empty order is not sent
    pub sent_status: bool,
    /// Entered independently of the total
    pub amount_paid: f64,
    /// Derived: Σ dish totals, kept in sync by every mutator
    pub total_amount: f64,
    /// Insertion-ordered; `"Dish {N}"` display names derive from position
    pub dishes: Vec<Dish>,
    /// Operator selection, never persisted
    #[serde(skip)]
    pub active_dish_id: Option<String>,
}

impl Order {
    pub fn new(id: impl Into<String>) -> Self {
        let created_at = Utc::now();
        Self {
            id: id.into(),
            created_at,
            closed_at: None,
            service_date: created_at.date_naive(),
            name: String::new(),
            table: String::new(),
            additional_notes: String::new(),
            include_additional_notes_in_ticket: false,
            to_go: false,
            status: OrderStatus::New,
            sent_status: false,
            amount_paid: 0.0,
            total_amount: 0.0,
            dishes: Vec::new(),
            active_dish_id: None,
        }
    }

    // ========== Dish membership ==========

    /// Create a dish with a fresh id, append it, select it, renumber,
    /// and retotal. Returns the new dish id.
    pub fn add_dish(&mut self) -> String {
        let dish_id = Uuid::new_v4().to_string();
        self.dishes.push(Dish::new(dish_id.clone()));
        self.active_dish_id = Some(dish_id.clone());
        self.renumber_dishes();
        self.recompute_total();
        dish_id
    }

    /// Remove a dish by id, renumber the rest, retotal. A removed active
    /// dish clears the selection; re-selecting is the caller's job.
    pub fn remove_dish(&mut self, dish_id: &str) -> bool {
        let before = self.dishes.len();
        self.dishes.retain(|d| d.id != dish_id);
        if self.dishes.len() == before {
            return false;
        }
        if self.active_dish_id.as_deref() == Some(dish_id) {
            self.active_dish_id = None;
        }
        self.renumber_dishes();
        self.recompute_total();
        true
    }

    pub fn dish(&self, dish_id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == dish_id)
    }

    pub fn dish_mut(&mut self, dish_id: &str) -> Option<&mut Dish> {
        self.dishes.iter_mut().find(|d| d.id == dish_id)
    }

    // ========== Selection ==========

    /// Select a dish by id; unknown ids are rejected
    pub fn set_active_dish(&mut self, dish_id: &str) -> bool {
        if self.dish(dish_id).is_some() {
            self.active_dish_id = Some(dish_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn active_dish(&self) -> Option<&Dish> {
        self.active_dish_id.as_deref().and_then(|id| self.dish(id))
    }

    pub fn active_dish_mut(&mut self) -> Option<&mut Dish> {
        let id = self.active_dish_id.clone()?;
        self.dish_mut(&id)
    }

    /// Keep the current dish selection when still valid, else fall back
    /// to the first dish (or none for an empty order)
    pub fn ensure_active_dish(&mut self) {
        let valid = self
            .active_dish_id
            .as_deref()
            .is_some_and(|id| self.dishes.iter().any(|d| d.id == id));
        if !valid {
            self.active_dish_id = self.dishes.first().map(|d| d.id.clone());
        }
    }

    // ========== Derived state ==========

    /// Dense 1..N presentation names reflecting current membership order
    pub fn renumber_dishes(&mut self) {
        for (index, dish) in self.dishes.iter_mut().enumerate() {
            dish.display_name = format!("Dish {}", index + 1);
        }
    }

    /// Recompute Σ dish totals
    pub fn recompute_total(&mut self) {
        let sum = self
            .dishes
            .iter()
            .fold(Decimal::ZERO, |acc, d| acc + money::to_decimal(d.total_amount));
        self.total_amount = money::to_f64(sum);
    }

    /// AND of all dishes being sent; an empty order is not "sent"
    pub fn refresh_sent_status(&mut self) {
        self.sent_status =
            !self.dishes.is_empty() && self.dishes.iter().all(|d| d.status == DishStatus::Sent);
    }

    // ========== To-go propagation ==========

    /// Push the order-level to-go flag onto dishes without an override
    pub fn sync_dishes_to_go(&mut self) {
        let to_go = self.to_go;
        for dish in self.dishes.iter_mut().filter(|d| !d.to_go_overridden) {
            dish.to_go = to_go;
        }
    }

    /// Force the flag onto every dish and clear their overrides
    pub fn apply_to_go_to_all_dishes(&mut self, to_go: bool) {
        for dish in self.dishes.iter_mut() {
            dish.to_go = to_go;
            dish.to_go_overridden = false;
        }
    }

    // ========== Field setters with behavior ==========

    /// Notes are stored trimmed
    pub fn set_additional_notes(&mut self, notes: &str) {
        self.additional_notes = notes.trim().to_string();
    }
}
