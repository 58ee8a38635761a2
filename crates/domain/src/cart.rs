//! Shopping cart owned by a single user.
//!
//! Cart lines reference products by id only; prices are looked up fresh at
//! checkout and frozen into [`crate::OrderItem`]s, never cached here.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// One selection in a cart: a product in a given size/color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Referenced product.
    pub product_id: ProductId,

    /// Requested quantity, at least 1.
    pub quantity: u32,

    /// Size label.
    pub size: String,

    /// Optional color variant.
    pub color: Option<String>,
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Owning user.
    pub user_id: UserId,

    /// Current selections.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Returns true if the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a line, merging with an existing line for the same
    /// product + size + color by incrementing its quantity.
    pub fn add_line(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| {
            l.product_id == line.product_id && l.size == line.size && l.color == line.color
        }) {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }
    }
}
