//! Domain error types.

use thiserror::Error;

use crate::order::{OrderStatus, PaymentStatus};

/// Errors raised by domain entities when an invariant would be violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An order must contain at least one item.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// The requested status change is not a legal edge of the lifecycle.
    #[error("cannot transition order status from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The requested payment-status change is not a legal edge.
    #[error("cannot transition payment status from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Only pending orders may be cancelled by their owner.
    #[error("only pending orders can be cancelled (current status: {status})")]
    NotCancellable { status: OrderStatus },

    /// Item quantity must be at least one.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },
}
