//! Store traits and query types.

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Cart, Order, OrderStatus, Product, ProductId};

use crate::Result;

/// Filter for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Restrict to one owner (customer listings).
    pub user_id: Option<UserId>,

    /// Restrict to one status.
    pub status: Option<OrderStatus>,

    /// 1-based page number. Zero is treated as the first page.
    pub page: u32,

    /// Page size. Zero falls back to the default of 10.
    pub page_size: u32,
}

impl OrderFilter {
    /// Effective 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Effective page size.
    pub fn page_size(&self) -> u32 {
        if self.page_size == 0 { 10 } else { self.page_size }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }
}

/// Pagination metadata returned alongside listings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    /// Builds pagination metadata from a filter and a total row count.
    pub fn new(filter: &OrderFilter, total: u64) -> Self {
        let page_size = filter.page_size();
        Self {
            page: filter.page(),
            page_size,
            total,
            pages: total.div_ceil(u64::from(page_size)),
        }
    }
}

/// One page of orders plus its pagination metadata.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

/// Catalog product storage with atomic stock adjustment.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Loads a product by id.
    async fn find(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts or replaces a product (seeding, admin catalog updates).
    async fn upsert(&self, product: Product) -> Result<()>;

    /// Atomically decrements stock for one size and increments the sold
    /// counter: `stock -= quantity` iff `stock >= quantity`.
    ///
    /// Fails with [`crate::StoreError::InsufficientStock`] when the
    /// conditional check loses, without mutating anything.
    async fn reserve_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()>;

    /// Adds quantity back to a size's stock and subtracts it from the sold
    /// counter (floored at zero). Silently succeeds when the product or
    /// size has since been deleted.
    async fn restore_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()>;
}

/// Per-user cart storage.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads a user's cart, if one exists.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces a user's cart.
    async fn upsert(&self, cart: Cart) -> Result<()>;

    /// Atomically empties a user's cart. No-op if absent.
    async fn clear(&self, user_id: UserId) -> Result<()>;
}

/// Order storage. Orders are never deleted.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a newly created order.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by id.
    async fn find(&self, id: OrderId) -> Result<Option<Order>>;

    /// Replaces a previously inserted order.
    ///
    /// Fails with [`crate::StoreError::NotFound`] for unknown ids.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Lists orders newest-first, filtered and paginated.
    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage>;

    /// Atomic payment-confirmation gate: sets `payment_status = paid` and
    /// `status = confirmed` iff both the order status and the payment
    /// status are still `pending`.
    ///
    /// Returns the updated order when this call won the gate, `Ok(None)`
    /// when the order was already settled or cancelled (idempotent
    /// replay), and [`crate::StoreError::NotFound`] for unknown ids.
    async fn confirm_payment_if_pending(&self, id: OrderId) -> Result<Option<Order>>;

    /// Atomic failure gate: sets `status = cancelled` iff both the order
    /// status and the payment status are still `pending`.
    ///
    /// Same return contract as [`Self::confirm_payment_if_pending`].
    async fn cancel_if_payment_pending(&self, id: OrderId) -> Result<Option<Order>>;
}
