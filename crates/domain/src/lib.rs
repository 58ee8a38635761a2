//! Domain layer: entities and value objects for the storefront order service.
//!
//! The order lifecycle is modeled with explicit state machines
//! ([`OrderStatus`], [`PaymentStatus`]); illegal transitions are rejected at
//! the type level rather than left to callers.

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine};
pub use error::DomainError;
pub use money::Money;
pub use order::{
    Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
};
pub use product::{Product, ProductId, SizeStock};
