//! The order entity: a priced, addressed, status-tracked commitment.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::product::ProductId;

use super::status::{OrderStatus, PaymentStatus};

/// How the customer pays for an order. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,

    /// Manual bank transfer.
    BankTransfer,

    /// E-wallet transfer.
    EWallet,

    /// VNPay gateway redirect.
    Vnpay,
}

impl PaymentMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::Vnpay => "vnpay",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "e_wallet" => Ok(PaymentMethod::EWallet),
            "vnpay" => Ok(PaymentMethod::Vnpay),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Delivery address captured with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub district: Option<String>,
}

/// A line item snapshot: the unit price is captured at order time and never
/// recomputed, even if the product's price changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Referenced product.
    pub product_id: ProductId,

    /// Units ordered.
    pub quantity: u32,

    /// Size label.
    pub size: String,

    /// Optional color variant.
    pub color: Option<String>,

    /// Unit price frozen at order time.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new line item.
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: u32,
        size: impl Into<String>,
        color: Option<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            size: size.into(),
            color,
            unit_price,
        }
    }

    /// Returns quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order: the central entity of the storefront.
///
/// Items are immutable after creation, so `total_amount` can never drift
/// from the sum of its items. Orders are never deleted; cancellation is a
/// status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Money,
    shipping_address: ShippingAddress,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order.
    ///
    /// The total is computed here from the item snapshots, so the
    /// "total equals sum of items" invariant holds by construction.
    pub fn new(
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        note: Option<String>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        if let Some(item) = items.iter().find(|i| i.quantity == 0) {
            return Err(DomainError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        let total_amount = items.iter().map(OrderItem::subtotal).sum();
        let now = Utc::now();

        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            total_amount,
            shipping_address,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            note,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates an order from storage. Not for use outside store
    /// implementations; invariants are assumed to have been enforced when
    /// the order was first created.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: ShippingAddress,
        status: OrderStatus,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
        note: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_amount,
            shipping_address,
            status,
            payment_method,
            payment_status,
            note,
            created_at,
            updated_at,
        }
    }

    // Accessors

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Transitions

    /// Applies requested status changes, validating each against its
    /// transition table. Either both changes apply or neither does.
    pub fn transition(
        &mut self,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<(), DomainError> {
        if let Some(next) = status
            && !self.status.can_transition_to(next)
        {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        if let Some(next) = payment_status
            && !self.payment_status.can_transition_to(next)
        {
            return Err(DomainError::InvalidPaymentTransition {
                from: self.payment_status,
                to: next,
            });
        }

        if let Some(next) = status {
            self.status = next;
        }
        if let Some(next) = payment_status {
            self.payment_status = next;
        }
        if status.is_some() || payment_status.is_some() {
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Cancels the order. Only orders still in `pending` may be cancelled
    /// by their owner.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::NotCancellable {
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Nguyen Van A".to_string(),
            phone: "0901234567".to_string(),
            address: "1 Le Loi".to_string(),
            city: "Ho Chi Minh".to_string(),
            district: None,
        }
    }

    fn order_with_items(items: Vec<OrderItem>) -> Order {
        Order::new(UserId::new(), items, address(), PaymentMethod::Cod, None).unwrap()
    }

    #[test]
    fn test_total_is_sum_of_item_subtotals() {
        let order = order_with_items(vec![
            OrderItem::new("P-001", 2, "M", None, Money::new(80_000)),
            OrderItem::new("P-002", 1, "L", Some("black".to_string()), Money::new(120_000)),
        ]);

        assert_eq!(order.total_amount(), Money::new(280_000));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_empty_order_rejected() {
        let result = Order::new(UserId::new(), vec![], address(), PaymentMethod::Cod, None);
        assert_eq!(result.unwrap_err(), DomainError::EmptyOrder);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = Order::new(
            UserId::new(),
            vec![OrderItem::new("P-001", 0, "M", None, Money::new(80_000))],
            address(),
            PaymentMethod::Cod,
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidQuantity { quantity: 0 }
        );
    }

    #[test]
    fn test_legal_transition_chain() {
        let mut order = order_with_items(vec![OrderItem::new(
            "P-001",
            1,
            "M",
            None,
            Money::new(80_000),
        )]);

        order.transition(Some(OrderStatus::Confirmed), None).unwrap();
        order.transition(Some(OrderStatus::Shipping), None).unwrap();
        order.transition(Some(OrderStatus::Delivered), None).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_illegal_transition_rejected_atomically() {
        let mut order = order_with_items(vec![OrderItem::new(
            "P-001",
            1,
            "M",
            None,
            Money::new(80_000),
        )]);

        // Legal payment change paired with an illegal status jump: neither
        // field must change.
        let result = order.transition(Some(OrderStatus::Delivered), Some(PaymentStatus::Paid));
        assert!(matches!(
            result,
            Err(DomainError::InvalidStatusTransition { .. })
        ));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_delivered_is_final() {
        let mut order = order_with_items(vec![OrderItem::new(
            "P-001",
            1,
            "M",
            None,
            Money::new(80_000),
        )]);
        order.transition(Some(OrderStatus::Confirmed), None).unwrap();
        order.transition(Some(OrderStatus::Shipping), None).unwrap();
        order.transition(Some(OrderStatus::Delivered), None).unwrap();

        let result = order.transition(Some(OrderStatus::Pending), None);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_only_while_pending() {
        let mut order = order_with_items(vec![OrderItem::new(
            "P-001",
            1,
            "M",
            None,
            Money::new(80_000),
        )]);
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let mut confirmed = order_with_items(vec![OrderItem::new(
            "P-001",
            1,
            "M",
            None,
            Money::new(80_000),
        )]);
        confirmed
            .transition(Some(OrderStatus::Confirmed), None)
            .unwrap();
        assert!(matches!(
            confirmed.cancel(),
            Err(DomainError::NotCancellable { .. })
        ));
        assert_eq!(confirmed.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let order = order_with_items(vec![OrderItem::new(
            "P-001",
            2,
            "M",
            None,
            Money::new(80_000),
        )]);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
