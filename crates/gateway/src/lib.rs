//! VNPay payment bridge.
//!
//! Builds outbound signed redirect URLs and verifies + applies inbound
//! signed callbacks (browser return and server-to-server IPN). Both
//! callback entry points share one idempotent reconcile operation, so
//! replays and refreshes can never double-mutate stock.

pub mod bridge;
pub mod config;
pub mod error;
pub mod sign;

pub use bridge::{IpnResponse, PaymentBridge, ReconcileOutcome};
pub use config::VnpayConfig;
pub use error::GatewayError;
