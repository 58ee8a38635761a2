//! Route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod vnpay;

use checkout::{Checkout, OrderLedger};
use gateway::PaymentBridge;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub ledger: OrderLedger,
    pub checkout: Checkout,
    pub bridge: PaymentBridge,
}
