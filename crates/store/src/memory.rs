//! In-memory store implementations for testing.
//!
//! Each store guards its map with a single `RwLock`, which makes the
//! conditional operations (stock decrement, payment gates) atomic in the
//! same way the SQL implementations are.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Cart, Order, OrderStatus, PaymentStatus, Product, ProductId};
use tokio::sync::RwLock;

use crate::repository::{
    CartStore, OrderFilter, OrderPage, OrderStore, Pagination, ProductStore,
};
use crate::{Result, StoreError};

/// In-memory product store.
#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl MemoryProductStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
        Ok(())
    }

    async fn reserve_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id).ok_or_else(|| StoreError::NotFound {
            entity: "product",
            id: id.to_string(),
        })?;

        let entry = product
            .sizes
            .iter_mut()
            .find(|s| s.size == size)
            .ok_or_else(|| StoreError::UnknownSize {
                product_id: id.to_string(),
                size: size.to_string(),
            })?;

        if entry.stock < quantity {
            return Err(StoreError::InsufficientStock {
                product_id: id.to_string(),
                size: size.to_string(),
                requested: quantity,
                available: entry.stock,
            });
        }

        entry.stock -= quantity;
        product.total_sold += quantity;
        Ok(())
    }

    async fn restore_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(id) else {
            // Product deleted since the order was placed; nothing to restore.
            tracing::warn!(product_id = %id, size, quantity, "restore skipped, product gone");
            return Ok(());
        };
        let Some(entry) = product.sizes.iter_mut().find(|s| s.size == size) else {
            tracing::warn!(product_id = %id, size, quantity, "restore skipped, size gone");
            return Ok(());
        };

        entry.stock += quantity;
        product.total_sold = product.total_sold.saturating_sub(quantity);
        Ok(())
    }
}

/// In-memory cart store.
#[derive(Clone, Default)]
pub struct MemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl MemoryCartStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, cart: Cart) -> Result<()> {
        self.carts.write().await.insert(cart.user_id, cart);
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(&user_id) {
            cart.lines.clear();
        }
        Ok(())
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders
            .write()
            .await
            .insert(order.id(), order.clone());
        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn save(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id()) {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order.id().to_string(),
            });
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| filter.user_id.is_none_or(|u| o.user_id() == u))
            .filter(|o| filter.status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();

        // Newest first.
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = matching.len() as u64;
        let page: Vec<Order> = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size() as usize)
            .collect();

        Ok(OrderPage {
            orders: page,
            pagination: Pagination::new(filter, total),
        })
    }

    async fn confirm_payment_if_pending(&self, id: OrderId) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "order",
            id: id.to_string(),
        })?;

        if order.payment_status() != PaymentStatus::Pending
            || order.status() != OrderStatus::Pending
        {
            return Ok(None);
        }

        order
            .transition(Some(OrderStatus::Confirmed), Some(PaymentStatus::Paid))
            .map_err(|e| StoreError::Decode {
                field: "status",
                value: e.to_string(),
            })?;
        Ok(Some(order.clone()))
    }

    async fn cancel_if_payment_pending(&self, id: OrderId) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "order",
            id: id.to_string(),
        })?;

        if order.payment_status() != PaymentStatus::Pending
            || order.status() != OrderStatus::Pending
        {
            return Ok(None);
        }

        order
            .transition(Some(OrderStatus::Cancelled), None)
            .map_err(|e| StoreError::Decode {
                field: "status",
                value: e.to_string(),
            })?;
        Ok(Some(order.clone()))
    }
}
