//! Checkout and ledger error types.

use common::OrderId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors raised by the order ledger and checkout orchestrator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart holds no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Requester is neither the owner nor an admin.
    #[error("you do not have access to this order")]
    Forbidden,

    /// The product is missing from the catalog or marked inactive.
    #[error("product {product_id} is no longer available")]
    ProductUnavailable { product_id: String },

    /// The requested size does not exist on the product.
    #[error("product {product_id} has no size {size}")]
    UnknownSize { product_id: String, size: String },

    /// Not enough units left for the requested size.
    #[error("insufficient stock for product {product_id} size {size}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        size: String,
        requested: u32,
        available: u32,
    },

    /// A domain invariant was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Underlying storage failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
