//! Dish — a sub-grouping of products within an order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::product::{Product, ProductDraft};
use super::types::DishStatus;

/// One diner's group of line items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub id: String,
    /// Presentation name; the owning order maintains the dense
    /// `"Dish {N}"` sequence
    pub display_name: String,
    pub status: DishStatus,
    /// Times this dish transitioned into `Sent`; re-sending an already
    /// sent dish does not count
    pub sent_count: i32,
    pub to_go: bool,
    /// Set once the operator overrides the order-level to-go flag
    pub to_go_overridden: bool,
    /// Insertion-ordered, unique by product name
    pub products: Vec<Product>,
    /// Derived: Σ price × quantity, kept in sync by every mutator
    pub total_amount: f64,
}

impl Dish {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            status: DishStatus::New,
            sent_count: 0,
            to_go: false,
            to_go_overridden: false,
            products: Vec::new(),
            total_amount: 0.0,
        }
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn product_mut(&mut self, name: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.name == name)
    }

    /// Add a product from the given draft.
    ///
    /// A non-custom draft whose name already exists merges into that
    /// line: quantity +1, and empty notes are backfilled from the draft.
    /// Custom drafts always insert a new line (their keys are generated
    /// unique).
    pub fn add_product(&mut self, draft: &ProductDraft) {
        if !draft.is_custom
            && let Some(existing) = self.product_mut(&draft.name)
        {
            existing.quantity += 1;
            if existing.notes.is_empty() && !draft.notes.is_empty() {
                existing.notes = draft.notes.clone();
            }
        } else {
            self.products.push(Product::from_draft(draft));
        }
        self.recompute_total();
    }

    /// Remove a product by name; returns whether anything was removed
    pub fn remove_product(&mut self, name: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.name != name);
        let removed = self.products.len() != before;
        if removed {
            self.recompute_total();
        }
        removed
    }

    /// Change a product's identity key. Fails (and leaves the dish
    /// untouched) when the source is missing or the target name is
    /// already taken by a different product.
    pub fn rename_product(&mut self, old_name: &str, new_name: &str) -> bool {
        if self.product(old_name).is_none() {
            return false;
        }
        if new_name != old_name && self.product(new_name).is_some() {
            return false;
        }
        if let Some(product) = self.product_mut(old_name) {
            product.name = new_name.to_string();
        }
        true
    }

    /// Set a product's quantity, clamped to a minimum of 1
    pub fn set_product_quantity(&mut self, name: &str, quantity: i32) -> bool {
        match self.product_mut(name) {
            Some(product) => {
                product.quantity = quantity.max(1);
                self.recompute_total();
                true
            }
            None => false,
        }
    }

    pub fn set_product_price(&mut self, name: &str, price: f64) -> bool {
        match self.product_mut(name) {
            Some(product) => {
                product.price = price;
                self.recompute_total();
                true
            }
            None => false,
        }
    }

    /// Transition into `Sent`; `sent_count` only moves on the first
    /// transition out of a non-sent state
    pub fn mark_sent(&mut self) {
        if self.status != DishStatus::Sent {
            self.sent_count += 1;
            self.status = DishStatus::Sent;
        }
    }

    pub fn set_to_go(&mut self, to_go: bool, overridden: bool) {
        self.to_go = to_go;
        if overridden {
            self.to_go_overridden = true;
        }
    }

    /// Recompute Σ price × quantity over the products
    pub fn recompute_total(&mut self) {
        let sum = self
            .products
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc + money::line_total(p.price, p.quantity));
        self.total_amount = money::to_f64(sum);
    }
}
