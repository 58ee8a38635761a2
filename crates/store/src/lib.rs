//! Storage layer for the storefront order service.
//!
//! Exposes trait-based stores so the checkout and gateway services can be
//! unit-tested against in-memory fakes and deployed against PostgreSQL.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use error::StoreError;
pub use memory::{MemoryCartStore, MemoryOrderStore, MemoryProductStore};
pub use postgres::{PgCartStore, PgOrderStore, PgProductStore, run_migrations};
pub use repository::{CartStore, OrderFilter, OrderPage, OrderStore, Pagination, ProductStore};

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
