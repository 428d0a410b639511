//! OrderService — orchestration between callers and the order core
//!
//! Holds the in-memory working set of orders, the active order/dish
//! selection, the number generator, and a dirty-id set for deferred
//! persistence. Aggregate mutations are synchronous and in-memory;
//! persistence is explicit (`persist_active`, `flush_dirty`) or
//! immediate for terminal actions (close, send, delete).
//!
//! # Selection rules
//!
//! - Selecting an unknown order is rejected.
//! - Selecting an order re-derives its active dish: keep the current one
//!   when still present, else the first dish, else none.
//! - Removing the active dish selects the next remaining dish.
//! - Deleting the active order clears the selection.
//!
//! # Closed-order lock
//!
//! Once closed, an order refuses ordinary mutations unless its id has
//! been unlocked for this session (`unlock_closed`) — an operator
//! override, never persisted.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use chrono_tz::Tz;
use sqlx::SqlitePool;

use shared::models::MenuItem;
use shared::order::{Dish, Order, OrderStatus, ProductDraft};

use crate::db::DbService;
use crate::db::repository::{dining_table, menu, order as order_repo};
use crate::orders::number::OrderNumberGenerator;
use crate::utils::{AppError, AppResult, time};

#[cfg(test)]
mod tests;

/// Fallback offered when the table catalog is empty or unreadable
const DEFAULT_TABLE_NAMES: [&str; 4] = ["Table 1", "Table 2", "Table 3", "Table 4"];

/// Order-level form payload applied in one step
#[derive(Debug, Clone, Default)]
pub struct OrderForm {
    pub name: String,
    pub table: String,
    pub to_go: bool,
    pub amount_paid: f64,
    pub additional_notes: String,
    pub include_additional_notes_in_ticket: bool,
    /// Free-text ISO date; empty or unparsable input keeps the current
    /// value
    pub service_date: String,
}

pub struct OrderService {
    pool: SqlitePool,
    orders: HashMap<String, Order>,
    active_order_id: Option<String>,
    generator: OrderNumberGenerator,
    custom_product_counter: u64,
    /// Closed orders unlocked for this session (operator override)
    unlocked_closed: HashSet<String>,
    /// Orders with unpersisted edits, written out by `flush_dirty`
    dirty: HashSet<String>,
}

impl OrderService {
    /// Create the service and seed the number generator from the store's
    /// historical maximum. The seed lookup is best-effort: failure
    /// degrades to a fresh counter, never to a startup error.
    pub async fn new(db: &DbService, tz: Tz) -> Self {
        let mut generator = OrderNumberGenerator::new(tz);
        match order_repo::latest_issued_id(&db.pool).await {
            Ok(latest) => generator.seed_from(latest.as_deref()),
            Err(err) => {
                tracing::warn!(error = %err, "Order number seed lookup failed, starting fresh")
            }
        }
        Self {
            pool: db.pool.clone(),
            orders: HashMap::new(),
            active_order_id: None,
            generator,
            custom_product_counter: 0,
            unlocked_closed: HashSet::new(),
            dirty: HashSet::new(),
        }
    }

    // ========== Working set and selection ==========

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Working set sorted by creation time
    pub fn orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }

    pub fn active_order(&self) -> Option<&Order> {
        self.active_order_id.as_deref().and_then(|id| self.orders.get(id))
    }

    pub fn active_dish(&self) -> Option<&Dish> {
        self.active_order().and_then(|order| order.active_dish())
    }

    /// Select an order and re-derive its active dish
    pub fn select_order(&mut self, order_id: &str) -> AppResult<()> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
        order.ensure_active_dish();
        self.active_order_id = Some(order_id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.active_order_id = None;
    }

    /// Select a dish within the active order
    pub fn select_dish(&mut self, dish_id: &str) -> AppResult<()> {
        let order = self.active_order_mut()?;
        if !order.set_active_dish(dish_id) {
            return Err(AppError::not_found(format!("Dish {dish_id} not found")));
        }
        Ok(())
    }

    // ========== Order lifecycle ==========

    /// Create a new order under the next identifier and select it
    pub fn create_order(&mut self) -> String {
        let order = Order::new(self.generator.next());
        let order_id = order.id.clone();
        self.orders.insert(order_id.clone(), order);
        self.active_order_id = Some(order_id.clone());
        self.dirty.insert(order_id.clone());
        order_id
    }

    /// Set the working status. `Closed` goes through `close_order`; a
    /// closed order refuses status changes (reopen is the explicit path).
    pub fn set_order_status(&mut self, status: OrderStatus) -> AppResult<()> {
        if status == OrderStatus::Closed {
            return Err(AppError::validation("Use close_order to close an order"));
        }
        let order = self.active_order_mut()?;
        if order.status == OrderStatus::Closed {
            return Err(AppError::business_rule(format!(
                "Order {} is closed",
                order.id
            )));
        }
        order.status = status;
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Close the active order and persist immediately. `closed_at`
    /// stamping (first close wins) happens in the store.
    pub async fn close_order(&mut self) -> AppResult<()> {
        let order = self.active_order_mut()?;
        order.status = OrderStatus::Closed;
        let order_id = order.id.clone();
        self.save_order(&order_id).await
    }

    /// Reopen a closed order back to `New`. Dish statuses and
    /// `sent_status` are left alone; `closed_at` keeps its first-close
    /// value until the next close.
    pub fn reopen_order(&mut self) -> AppResult<()> {
        let order = self.active_order_mut()?;
        if order.status == OrderStatus::Closed {
            order.status = OrderStatus::New;
            let order_id = order.id.clone();
            self.dirty.insert(order_id);
        }
        Ok(())
    }

    /// Apply the order form in one step and re-propagate the to-go flag
    pub fn register_order_form(&mut self, form: &OrderForm) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        order.name = form.name.clone();
        order.table = form.table.clone();
        order.to_go = form.to_go;
        order.set_additional_notes(&form.additional_notes);
        order.include_additional_notes_in_ticket = form.include_additional_notes_in_ticket;
        order.service_date = normalize_service_date(&form.service_date, order.service_date);
        order.amount_paid = form.amount_paid;
        order.sync_dishes_to_go();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    // ========== Dishes ==========

    /// Add a dish to the active order; it inherits the order-level to-go
    /// flag and becomes the active dish
    pub fn add_dish(&mut self) -> AppResult<String> {
        let order = self.active_editable_mut()?;
        let to_go = order.to_go;
        let dish_id = order.add_dish();
        if let Some(dish) = order.dish_mut(&dish_id) {
            dish.set_to_go(to_go, false);
        }
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(dish_id)
    }

    /// Remove a dish; when it was active, the next remaining dish takes
    /// over the selection
    pub fn remove_dish(&mut self, dish_id: &str) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        if !order.remove_dish(dish_id) {
            return Err(AppError::not_found(format!("Dish {dish_id} not found")));
        }
        order.ensure_active_dish();
        order.refresh_sent_status();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Per-dish to-go override; survives later order-level propagation
    pub fn set_dish_to_go(&mut self, dish_id: &str, to_go: bool) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.dish_mut(dish_id) else {
            return Err(AppError::not_found(format!("Dish {dish_id} not found")));
        };
        dish.set_to_go(to_go, true);
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Push a to-go flag onto every dish and clear their overrides
    pub fn apply_to_go_to_all_dishes(&mut self, to_go: bool) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        order.apply_to_go_to_all_dishes(to_go);
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    // ========== Products (on the active dish) ==========

    /// Add a product to the active dish; menu merge rules apply
    pub fn add_product(&mut self, draft: &ProductDraft) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.active_dish_mut() else {
            return Err(AppError::business_rule("No active dish"));
        };
        dish.add_product(draft);
        order.recompute_total();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    pub fn remove_product(&mut self, product_name: &str) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.active_dish_mut() else {
            return Err(AppError::business_rule("No active dish"));
        };
        if !dish.remove_product(product_name) {
            return Err(AppError::not_found(format!(
                "Product {product_name} not found"
            )));
        }
        order.recompute_total();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Set a product's quantity (clamped to ≥ 1)
    pub fn set_product_quantity(&mut self, product_name: &str, quantity: i32) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.active_dish_mut() else {
            return Err(AppError::business_rule("No active dish"));
        };
        if !dish.set_product_quantity(product_name, quantity) {
            return Err(AppError::not_found(format!(
                "Product {product_name} not found"
            )));
        }
        order.recompute_total();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    pub fn set_product_price(&mut self, product_name: &str, price: f64) -> AppResult<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::validation(format!(
                "Price must be a non-negative number, got {price}"
            )));
        }
        let order = self.active_editable_mut()?;
        let Some(dish) = order.active_dish_mut() else {
            return Err(AppError::business_rule("No active dish"));
        };
        if !dish.set_product_price(product_name, price) {
            return Err(AppError::not_found(format!(
                "Product {product_name} not found"
            )));
        }
        order.recompute_total();
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Rename a product in the active dish. Custom products only change
    /// their visible label (the identity key stays generated); menu
    /// products change their key, and a collision with an existing name
    /// is rejected.
    pub fn rename_product(&mut self, old_name: &str, new_name: &str) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.active_dish_mut() else {
            return Err(AppError::business_rule("No active dish"));
        };
        let Some(product) = dish.product_mut(old_name) else {
            return Err(AppError::not_found(format!(
                "Product {old_name} not found"
            )));
        };
        if product.is_custom {
            product.display_name = new_name.to_string();
        } else if !dish.rename_product(old_name, new_name) {
            return Err(AppError::validation(format!(
                "A product named {new_name} already exists"
            )));
        }
        let order_id = order.id.clone();
        self.dirty.insert(order_id);
        Ok(())
    }

    /// Identity key for the next ad-hoc line item, distinct from its
    /// visible label
    pub fn next_custom_product_key(&mut self) -> String {
        self.custom_product_counter += 1;
        format!("producto_libre_{}", self.custom_product_counter)
    }

    // ========== Sending ==========

    /// Send one dish to the kitchen and persist immediately
    pub async fn send_dish(&mut self, dish_id: &str) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        let Some(dish) = order.dish_mut(dish_id) else {
            return Err(AppError::not_found(format!("Dish {dish_id} not found")));
        };
        dish.mark_sent();
        order.refresh_sent_status();
        let order_id = order.id.clone();
        self.save_order(&order_id).await
    }

    /// Send every dish and persist immediately
    pub async fn send_all_dishes(&mut self) -> AppResult<()> {
        let order = self.active_editable_mut()?;
        for dish in order.dishes.iter_mut() {
            dish.mark_sent();
        }
        order.refresh_sent_status();
        let order_id = order.id.clone();
        self.save_order(&order_id).await
    }

    // ========== Persistence ==========

    /// Persist one order from the working set
    pub async fn save_order(&mut self, order_id: &str) -> AppResult<()> {
        let pool = self.pool.clone();
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
        order_repo::save(&pool, order).await?;
        self.dirty.remove(order_id);
        Ok(())
    }

    /// Persist the active order
    pub async fn persist_active(&mut self) -> AppResult<()> {
        let order_id = self
            .active_order_id
            .clone()
            .ok_or_else(|| AppError::business_rule("No active order"))?;
        self.save_order(&order_id).await
    }

    /// Persist every order with unsaved edits. This is the autosave
    /// hook: scheduling and debounce cadence belong to the caller, the
    /// service only guarantees the coalesced writes happen. Returns the
    /// number of orders written.
    pub async fn flush_dirty(&mut self) -> AppResult<usize> {
        let order_ids: Vec<String> = self.dirty.iter().cloned().collect();
        let mut flushed = 0;
        for order_id in order_ids {
            if self.orders.contains_key(&order_id) {
                self.save_order(&order_id).await?;
                flushed += 1;
            } else {
                self.dirty.remove(&order_id);
            }
        }
        Ok(flushed)
    }

    pub fn has_unsaved_edits(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Replace the working set with every open order from the store
    pub async fn load_open_orders(&mut self) -> AppResult<usize> {
        let loaded = order_repo::load_open_orders(&self.pool).await?;
        self.orders = loaded
            .into_iter()
            .map(|order| (order.id.clone(), order))
            .collect();
        self.active_order_id = None;
        self.dirty.clear();
        Ok(self.orders.len())
    }

    /// Load one order from the store into the working set and select it
    pub async fn open_order(&mut self, order_id: &str) -> AppResult<()> {
        let order = order_repo::load_order(&self.pool, order_id).await?;
        let order_id = order.id.clone();
        self.orders.insert(order_id.clone(), order);
        self.select_order(&order_id)
    }

    /// Delete from the store and the working set; deleting the active
    /// order clears the selection. A missing row is not an error (the
    /// order may never have been saved) — the result says whether a row
    /// existed.
    pub async fn delete_order(&mut self, order_id: &str) -> AppResult<bool> {
        let existed = order_repo::delete(&self.pool, order_id).await?;
        self.orders.remove(order_id);
        self.dirty.remove(order_id);
        self.unlocked_closed.remove(order_id);
        if self.active_order_id.as_deref() == Some(order_id) {
            self.active_order_id = None;
        }
        Ok(existed)
    }

    // ========== Closed-order lock ==========

    /// An order is editable unless closed; a closed order only with an
    /// explicit unlock
    pub fn is_editable(&self, order: &Order) -> bool {
        Self::is_editable_with(order, &self.unlocked_closed)
    }

    /// Pure form of the rule with a caller-supplied unlock set
    pub fn is_editable_with(order: &Order, unlocked_closed: &HashSet<String>) -> bool {
        order.status != OrderStatus::Closed || unlocked_closed.contains(&order.id)
    }

    /// Operator override: allow edits on a closed order for this session
    pub fn unlock_closed(&mut self, order_id: &str) {
        self.unlocked_closed.insert(order_id.to_string());
    }

    pub fn relock_closed(&mut self, order_id: &str) {
        self.unlocked_closed.remove(order_id);
    }

    // ========== Catalog lookups (best-effort) ==========

    /// Active menu products plus the trailing custom-product template.
    /// Intentionally lossy: a store failure logs a warning and leaves
    /// only the custom template, so the operator can still add free
    /// lines.
    pub async fn menu_products(&self) -> Vec<MenuItem> {
        let mut products = match menu::fetch_active(&self.pool).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "Menu lookup failed, continuing with empty menu");
                Vec::new()
            }
        };
        products.push(MenuItem::custom_template());
        products
    }

    /// Active table names; falls back to a default set when the catalog
    /// is empty or unreadable
    pub async fn table_names(&self) -> Vec<String> {
        let names = match dining_table::fetch_active_names(&self.pool).await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!(error = %err, "Table lookup failed, using defaults");
                Vec::new()
            }
        };
        if names.is_empty() {
            DEFAULT_TABLE_NAMES.iter().map(|s| s.to_string()).collect()
        } else {
            names
        }
    }

    // ========== Internal ==========

    fn active_order_mut(&mut self) -> AppResult<&mut Order> {
        let order_id = self
            .active_order_id
            .clone()
            .ok_or_else(|| AppError::business_rule("No active order"))?;
        self.orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))
    }

    /// Active order, rejecting mutation on a closed order that has not
    /// been unlocked
    fn active_editable_mut(&mut self) -> AppResult<&mut Order> {
        let order_id = self
            .active_order_id
            .clone()
            .ok_or_else(|| AppError::business_rule("No active order"))?;
        let unlocked = self.unlocked_closed.contains(&order_id);
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
        if order.status == OrderStatus::Closed && !unlocked {
            return Err(AppError::business_rule(format!(
                "Order {order_id} is closed"
            )));
        }
        Ok(order)
    }
}

/// Empty or unparsable input keeps the current service date
fn normalize_service_date(input: &str, current: NaiveDate) -> NaiveDate {
    time::parse_date(input).unwrap_or(current)
}
