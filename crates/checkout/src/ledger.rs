//! Order ledger: the single source of truth for order state.

use std::sync::Arc;

use common::{OrderId, UserId};
use domain::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
use store::{OrderFilter, OrderPage, OrderStore, ProductStore};

use crate::error::CheckoutError;
use crate::stock;

/// Owns order creation and status/payment-status transitions.
#[derive(Clone)]
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
}

impl OrderLedger {
    /// Creates a new ledger over the given stores.
    pub fn new(orders: Arc<dyn OrderStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { orders, products }
    }

    /// Persists a new pending order.
    #[tracing::instrument(skip(self, items, shipping_address, note))]
    pub async fn create(
        &self,
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        note: Option<String>,
    ) -> Result<Order, CheckoutError> {
        let order = Order::new(user_id, items, shipping_address, payment_method, note)?;
        self.orders.insert(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), "order created");
        Ok(order)
    }

    /// Loads an order, enforcing that the requester owns it or is an admin.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &self,
        id: OrderId,
        requester: UserId,
        requester_is_admin: bool,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .orders
            .find(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        if !requester_is_admin && order.user_id() != requester {
            return Err(CheckoutError::Forbidden);
        }
        Ok(order)
    }

    /// Lists orders newest-first with pagination.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<OrderPage, CheckoutError> {
        Ok(self.orders.list(filter).await?)
    }

    /// Cancels a pending order on behalf of its owner and restores the
    /// stock it reserved.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId, requester: UserId) -> Result<Order, CheckoutError> {
        let mut order = self
            .orders
            .find(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        if order.user_id() != requester {
            return Err(CheckoutError::Forbidden);
        }

        order.cancel()?;
        self.orders.save(&order).await?;

        // Gateway orders reserve stock only once payment confirms, and a
        // paid order is no longer cancellable here, so a cancellable vnpay
        // order holds nothing to give back.
        if order.payment_method() != PaymentMethod::Vnpay {
            stock::restore_items(&self.products, order.items()).await?;
        }

        tracing::info!(order_id = %id, "order cancelled by owner");
        Ok(order)
    }

    /// Applies an admin status change, validated against the lifecycle
    /// transition tables.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, CheckoutError> {
        let mut order = self
            .orders
            .find(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        order.transition(status, payment_status)?;
        self.orders.save(&order).await?;

        tracing::info!(
            order_id = %id,
            status = %order.status(),
            payment_status = %order.payment_status(),
            "order status updated"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DomainError, Money, Product, ProductId, SizeStock};
    use store::{MemoryOrderStore, MemoryProductStore};

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Nguyen Van A".to_string(),
            phone: "0901234567".to_string(),
            address: "1 Le Loi".to_string(),
            city: "Ho Chi Minh".to_string(),
            district: None,
        }
    }

    fn items() -> Vec<OrderItem> {
        vec![OrderItem::new("P-001", 2, "M", None, Money::new(80_000))]
    }

    async fn ledger_with_product() -> (OrderLedger, Arc<dyn ProductStore>) {
        let products: Arc<dyn ProductStore> = Arc::new(MemoryProductStore::new());
        products
            .upsert(Product {
                id: ProductId::new("P-001"),
                name: "Runner Tee".to_string(),
                price: Money::new(100_000),
                discount_price: Some(Money::new(80_000)),
                sizes: vec![SizeStock {
                    size: "M".to_string(),
                    stock: 3,
                }],
                is_active: true,
                total_sold: 2,
            })
            .await
            .unwrap();

        let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
        (OrderLedger::new(orders, products.clone()), products)
    }

    #[tokio::test]
    async fn create_persists_pending_order() {
        let (ledger, _) = ledger_with_product().await;
        let user = UserId::new();

        let order = ledger
            .create(user, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.total_amount(), Money::new(160_000));

        let fetched = ledger.get(order.id(), user, false).await.unwrap();
        assert_eq!(fetched, order);
    }

    #[tokio::test]
    async fn create_rejects_empty_items() {
        let (ledger, _) = ledger_with_product().await;
        let result = ledger
            .create(UserId::new(), vec![], address(), PaymentMethod::Cod, None)
            .await;
        assert!(matches!(
            result,
            Err(CheckoutError::Domain(DomainError::EmptyOrder))
        ));
    }

    #[tokio::test]
    async fn get_enforces_ownership() {
        let (ledger, _) = ledger_with_product().await;
        let owner = UserId::new();
        let stranger = UserId::new();

        let order = ledger
            .create(owner, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();

        assert!(matches!(
            ledger.get(order.id(), stranger, false).await,
            Err(CheckoutError::Forbidden)
        ));
        // Admin may fetch any order.
        assert!(ledger.get(order.id(), stranger, true).await.is_ok());
    }

    #[tokio::test]
    async fn get_unknown_order_is_not_found() {
        let (ledger, _) = ledger_with_product().await;
        let result = ledger.get(OrderId::new(), UserId::new(), true).await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn cancel_restores_reserved_stock() {
        let (ledger, products) = ledger_with_product().await;
        let user = UserId::new();

        let order = ledger
            .create(user, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();

        let cancelled = ledger.cancel(order.id(), user).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);

        let product = products.find(&ProductId::new("P-001")).await.unwrap().unwrap();
        assert_eq!(product.stock_for("M"), Some(5)); // 3 + 2 restored
        assert_eq!(product.total_sold, 0); // 2 - 2
    }

    #[tokio::test]
    async fn cancel_gateway_order_restores_nothing() {
        let (ledger, products) = ledger_with_product().await;
        let user = UserId::new();

        // A vnpay order reserves no stock at creation.
        let order = ledger
            .create(user, items(), address(), PaymentMethod::Vnpay, None)
            .await
            .unwrap();

        let cancelled = ledger.cancel(order.id(), user).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);

        // Inventory must not grow by quantities that were never held.
        let product = products.find(&ProductId::new("P-001")).await.unwrap().unwrap();
        assert_eq!(product.stock_for("M"), Some(3));
        assert_eq!(product.total_sold, 2);
    }

    #[tokio::test]
    async fn cancel_by_non_owner_is_forbidden() {
        let (ledger, products) = ledger_with_product().await;
        let owner = UserId::new();

        let order = ledger
            .create(owner, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();

        let result = ledger.cancel(order.id(), UserId::new()).await;
        assert!(matches!(result, Err(CheckoutError::Forbidden)));

        // Nothing changed.
        let unchanged = ledger.get(order.id(), owner, false).await.unwrap();
        assert_eq!(unchanged.status(), OrderStatus::Pending);
        let product = products.find(&ProductId::new("P-001")).await.unwrap().unwrap();
        assert_eq!(product.stock_for("M"), Some(3));
    }

    #[tokio::test]
    async fn cancel_non_pending_order_fails_and_changes_nothing() {
        let (ledger, products) = ledger_with_product().await;
        let user = UserId::new();

        let order = ledger
            .create(user, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();
        ledger
            .update_status(order.id(), Some(OrderStatus::Confirmed), None)
            .await
            .unwrap();

        let result = ledger.cancel(order.id(), user).await;
        assert!(matches!(
            result,
            Err(CheckoutError::Domain(DomainError::NotCancellable { .. }))
        ));

        let unchanged = ledger.get(order.id(), user, false).await.unwrap();
        assert_eq!(unchanged.status(), OrderStatus::Confirmed);
        let product = products.find(&ProductId::new("P-001")).await.unwrap().unwrap();
        assert_eq!(product.stock_for("M"), Some(3));
        assert_eq!(product.total_sold, 2);
    }

    #[tokio::test]
    async fn update_status_rejects_illegal_jumps() {
        let (ledger, _) = ledger_with_product().await;

        let order = ledger
            .create(UserId::new(), items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();

        let result = ledger
            .update_status(order.id(), Some(OrderStatus::Delivered), None)
            .await;
        assert!(matches!(
            result,
            Err(CheckoutError::Domain(
                DomainError::InvalidStatusTransition { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (ledger, _) = ledger_with_product().await;
        let user = UserId::new();

        let order = ledger
            .create(user, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();
        ledger
            .create(user, items(), address(), PaymentMethod::Cod, None)
            .await
            .unwrap();
        ledger.cancel(order.id(), user).await.unwrap();

        let page = ledger
            .list(&OrderFilter {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.orders.len(), 1);
        assert_eq!(page.orders[0].id(), order.id());
    }
}
