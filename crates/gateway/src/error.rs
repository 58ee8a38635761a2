//! Gateway error types.

use common::OrderId;
use store::StoreError;
use thiserror::Error;

/// Errors raised by the payment bridge.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Callback signature did not verify. Always fails closed.
    #[error("invalid gateway signature")]
    InvalidSignature,

    /// A required callback parameter is absent.
    #[error("missing gateway parameter: {0}")]
    MissingParam(&'static str),

    /// `vnp_TxnRef` did not parse as an order id.
    #[error("malformed order reference: {0}")]
    BadOrderRef(String),

    /// The callback references an order that does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Signing secret or other configuration is unusable.
    #[error("gateway configuration error: {0}")]
    Configuration(String),

    /// Underlying storage failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
