//! Storage error types.

use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The product does not carry the requested size.
    #[error("product {product_id} has no size {size}")]
    UnknownSize { product_id: String, size: String },

    /// Conditional stock decrement failed: fewer units left than requested.
    #[error("insufficient stock for product {product_id} size {size}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        size: String,
        requested: u32,
        available: u32,
    },

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored document could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored field holds a value outside the domain vocabulary.
    #[error("invalid stored {field} value: {value}")]
    Decode { field: &'static str, value: String },
}
