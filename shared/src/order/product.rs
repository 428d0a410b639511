//! Product line items

use serde::{Deserialize, Serialize};

/// A line item inside a dish
///
/// `name` is the identity key within the dish's product list. For menu
/// products it equals the menu name; for custom products it is a
/// generated key (`producto_libre_{n}`) independent of the visible
/// label, so the label can be edited freely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub name: String,
    /// User-visible label
    pub display_name: String,
    pub price: f64,
    /// Clamped to a minimum of 1 on every update
    pub quantity: i32,
    pub notes: String,
    /// Suggested note phrases copied from the menu item; not persisted
    /// per order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes_shortcuts: Vec<String>,
    /// Custom products bypass the merge-on-add behavior
    #[serde(default)]
    pub is_custom: bool,
}

impl Product {
    pub(crate) fn from_draft(draft: &ProductDraft) -> Self {
        Self {
            name: draft.name.clone(),
            display_name: draft
                .display_name
                .clone()
                .unwrap_or_else(|| draft.name.clone()),
            price: draft.price,
            quantity: 1,
            notes: draft.notes.clone(),
            notes_shortcuts: draft.notes_shortcuts.clone(),
            is_custom: draft.is_custom,
        }
    }
}

/// Payload for adding a product to a dish
///
/// Carries the menu (or custom) product data; [`Dish::add_product`]
/// decides whether it merges into an existing line or inserts a new one.
///
/// [`Dish::add_product`]: super::Dish::add_product
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductDraft {
    pub name: String,
    /// Defaults to `name` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes_shortcuts: Vec<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl ProductDraft {
    /// Menu product draft with the given name and price
    pub fn menu(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }

    /// Custom line item with a generated identity key and a visible label
    pub fn custom(key: impl Into<String>, label: impl Into<String>, price: f64) -> Self {
        Self {
            name: key.into(),
            display_name: Some(label.into()),
            price,
            is_custom: true,
            ..Self::default()
        }
    }
}
