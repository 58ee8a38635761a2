//! Catalog product referenced by carts and orders.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Product identifier (catalog key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-size stock entry. Stock is unsigned so it can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Size label ("S", "M", "42", ...).
    pub size: String,

    /// Units available for this size.
    pub stock: u32,
}

/// A catalog product with per-size stock and pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,

    /// Display name, used in error messages and order descriptions.
    pub name: String,

    /// Base unit price.
    pub price: Money,

    /// Discounted unit price, if a promotion is active.
    pub discount_price: Option<Money>,

    /// Stock per size.
    pub sizes: Vec<SizeStock>,

    /// Inactive products cannot be ordered.
    pub is_active: bool,

    /// Cumulative units sold across all sizes.
    pub total_sold: u32,
}

impl Product {
    /// The price a buyer pays right now: the discount price when one is set,
    /// the base price otherwise.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }

    /// Returns the available stock for a size, or `None` for unknown sizes.
    pub fn stock_for(&self, size: &str) -> Option<u32> {
        self.sizes.iter().find(|s| s.size == size).map(|s| s.stock)
    }
}
