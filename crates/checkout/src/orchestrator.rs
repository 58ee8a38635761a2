//! Checkout orchestrator: the only path by which a cart becomes an order.

use std::sync::Arc;

use common::UserId;
use domain::{Cart, Order, OrderItem, PaymentMethod, ShippingAddress};
use store::{CartStore, ProductStore};

use crate::error::CheckoutError;
use crate::ledger::OrderLedger;
use crate::stock;

/// Converts carts into orders, enforcing stock and pricing correctness at
/// the moment of commitment.
#[derive(Clone)]
pub struct Checkout {
    ledger: OrderLedger,
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
}

impl Checkout {
    /// Creates a new orchestrator.
    pub fn new(
        ledger: OrderLedger,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            ledger,
            products,
            carts,
        }
    }

    /// Places a direct (cash-on-delivery style) order from the user's cart.
    ///
    /// Validation runs as a read-only pass over fresh product reads before
    /// any stock is touched, then every line is reserved with an atomic
    /// conditional decrement (rolled back as a group if a concurrent
    /// checkout wins a race). The cart is emptied only after the order is
    /// durably created, so a failure at any step leaves the cart intact.
    #[tracing::instrument(skip(self, shipping_address, note))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        note: Option<String>,
    ) -> Result<Order, CheckoutError> {
        let cart = self.load_cart(user_id).await?;
        let items = self.price_cart(&cart).await?;

        stock::reserve_items(&self.products, &items).await?;

        let order = match self
            .ledger
            .create(user_id, items.clone(), shipping_address, payment_method, note)
            .await
        {
            Ok(order) => order,
            Err(err) => {
                // Order creation failed after stock was held: release it.
                stock::restore_items(&self.products, &items).await?;
                return Err(err);
            }
        };

        self.carts.clear(user_id).await?;
        Ok(order)
    }

    /// Creates a gateway-redirect order from the user's cart.
    ///
    /// Availability is validated and prices are frozen, but no stock is
    /// reserved and the cart is left intact: goods are only committed once
    /// the gateway confirms payment.
    #[tracing::instrument(skip(self, shipping_address, note))]
    pub async fn place_gateway_order(
        &self,
        user_id: UserId,
        shipping_address: ShippingAddress,
        note: Option<String>,
    ) -> Result<Order, CheckoutError> {
        let cart = self.load_cart(user_id).await?;
        let items = self.price_cart(&cart).await?;

        self.ledger
            .create(user_id, items, shipping_address, PaymentMethod::Vnpay, note)
            .await
    }

    async fn load_cart(&self, user_id: UserId) -> Result<Cart, CheckoutError> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(cart)
    }

    /// Read-only validation pass: reloads every product fresh (never
    /// trusting a cached cart price), checks availability, and freezes the
    /// effective unit price into order-item snapshots.
    async fn price_cart(&self, cart: &Cart) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut items = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            let product = self
                .products
                .find(&line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CheckoutError::ProductUnavailable {
                    product_id: line.product_id.to_string(),
                })?;

            let available =
                product
                    .stock_for(&line.size)
                    .ok_or_else(|| CheckoutError::UnknownSize {
                        product_id: line.product_id.to_string(),
                        size: line.size.clone(),
                    })?;

            if available < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id.to_string(),
                    size: line.size.clone(),
                    requested: line.quantity,
                    available,
                });
            }

            items.push(OrderItem::new(
                line.product_id.clone(),
                line.quantity,
                line.size.clone(),
                line.color.clone(),
                product.effective_price(),
            ));
        }

        Ok(items)
    }
}
