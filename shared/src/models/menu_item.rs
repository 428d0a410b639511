//! Menu Item Model

use serde::{Deserialize, Serialize};

use crate::order::ProductDraft;

/// Menu catalog entry (read-only reference data)
///
/// `shortcuts` are the suggested note phrases offered when the product
/// is added to a dish; `color`/`shape` are button metadata for the
/// ordering surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub product_name: String,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<String>,
    pub color: String,
    pub shape: String,
    pub position: i32,
    pub product_type: String,
    pub is_active: bool,
    /// Synthetic flag for the ad-hoc entry; never stored in the catalog
    #[serde(default)]
    pub is_custom: bool,
}

impl MenuItem {
    /// Draft for adding this menu product to a dish. Custom lines do not
    /// go through here: they need a generated identity key
    /// (`ProductDraft::custom`).
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.product_name.clone(),
            display_name: None,
            price: self.cost,
            notes: String::new(),
            notes_shortcuts: self.shortcuts.clone(),
            is_custom: false,
        }
    }

    /// The "Custom product" entry appended after the menu so the
    /// operator can always add a free line item
    pub fn custom_template() -> Self {
        Self {
            id: 0,
            product_name: "Custom product".to_string(),
            cost: 0.0,
            shortcuts: Vec::new(),
            color: String::new(),
            shape: "Rectangle".to_string(),
            position: 0,
            product_type: "Food".to_string(),
            is_active: true,
            is_custom: true,
        }
    }
}
