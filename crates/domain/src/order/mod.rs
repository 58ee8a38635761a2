//! Order entity and its lifecycle state machines.

mod entity;
mod status;

pub use entity::{Order, OrderItem, PaymentMethod, ShippingAddress};
pub use status::{OrderStatus, PaymentStatus};
