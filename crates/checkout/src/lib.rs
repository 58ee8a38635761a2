//! Order ledger and checkout orchestration.
//!
//! [`OrderLedger`] owns order creation and status transitions;
//! [`Checkout`] is the only path by which a cart becomes an order and
//! enforces stock and pricing correctness at the moment of commitment.

pub mod error;
pub mod ledger;
pub mod orchestrator;
mod stock;

pub use error::CheckoutError;
pub use ledger::OrderLedger;
pub use orchestrator::Checkout;
