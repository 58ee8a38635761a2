//! Payment bridge: outbound redirect URLs, inbound callback reconciliation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use common::OrderId;
use domain::Order;
use serde::Serialize;
use store::{CartStore, OrderStore, ProductStore, StoreError};

use crate::config::VnpayConfig;
use crate::error::GatewayError;
use crate::sign;

/// Result of reconciling one gateway callback against the ledger.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// This callback won the confirmation gate: payment recorded, stock
    /// reserved, cart cleared.
    Paid(Order),

    /// Payment failed or was abandoned at the gateway; the order was
    /// cancelled before any stock moved.
    Cancelled(Order),

    /// The order was already settled by an earlier callback. Nothing
    /// was mutated.
    AlreadyProcessed,
}

/// Instant-payment-notification response body. The gateway retries until
/// it receives one of these over HTTP 200, so every outcome (including
/// errors) maps to a response code rather than an error status.
#[derive(Debug, Clone, Serialize)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub rsp_code: &'static str,

    #[serde(rename = "Message")]
    pub message: &'static str,
}

impl IpnResponse {
    const CONFIRM_SUCCESS: Self = Self {
        rsp_code: "00",
        message: "Confirm Success",
    };
    const ORDER_NOT_FOUND: Self = Self {
        rsp_code: "01",
        message: "Order not found",
    };
    const ALREADY_CONFIRMED: Self = Self {
        rsp_code: "02",
        message: "Order already confirmed",
    };
    const INVALID_SIGNATURE: Self = Self {
        rsp_code: "97",
        message: "Invalid signature",
    };
    const INTERNAL_ERROR: Self = Self {
        rsp_code: "99",
        message: "Unknown error",
    };
}

/// Bridges the order ledger to the VNPay gateway.
///
/// Gateway orders reserve no stock at creation; the stock side effects run
/// here, when a verified callback reports the payment result. The browser
/// return and the server-to-server IPN both funnel into [`Self::reconcile`],
/// whose store-level gates make the whole operation idempotent.
#[derive(Clone)]
pub struct PaymentBridge {
    config: VnpayConfig,
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
}

impl PaymentBridge {
    pub fn new(
        config: VnpayConfig,
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            config,
            orders,
            products,
            carts,
        }
    }

    /// Builds the signed redirect URL that sends the customer's browser to
    /// the gateway's payment page.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub fn payment_url(&self, order: &Order, client_ip: &str) -> Result<String, GatewayError> {
        let params = BTreeMap::from([
            ("vnp_Version".to_string(), "2.1.0".to_string()),
            ("vnp_Command".to_string(), "pay".to_string()),
            ("vnp_TmnCode".to_string(), self.config.tmn_code.clone()),
            ("vnp_Locale".to_string(), "vn".to_string()),
            ("vnp_CurrCode".to_string(), "VND".to_string()),
            ("vnp_TxnRef".to_string(), order.id().to_string()),
            (
                "vnp_OrderInfo".to_string(),
                format!("Thanh toan don hang {}", order.id()),
            ),
            ("vnp_OrderType".to_string(), "other".to_string()),
            (
                "vnp_Amount".to_string(),
                order.total_amount().minor_units().to_string(),
            ),
            ("vnp_ReturnUrl".to_string(), self.config.return_url.clone()),
            ("vnp_IpAddr".to_string(), sign::normalize_ip(client_ip)),
            (
                "vnp_CreateDate".to_string(),
                sign::format_create_date(Utc::now()),
            ),
        ]);

        let hash = sign::secure_hash(&params, &self.config.hash_secret)?;
        let query = sign::canonical_query(&params);
        Ok(format!(
            "{}?{}&{}={}",
            self.config.base_url,
            query,
            sign::SECURE_HASH_PARAM,
            hash
        ))
    }

    /// Verifies and applies one gateway callback.
    ///
    /// A response code of `"00"` confirms the payment; anything else is a
    /// failure or abandonment and cancels the order. Both paths run through
    /// the store's atomic gates, so a replayed callback observes
    /// [`ReconcileOutcome::AlreadyProcessed`] and touches nothing.
    #[tracing::instrument(skip(self, params))]
    pub async fn reconcile(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<ReconcileOutcome, GatewayError> {
        sign::verify_signature(params, &self.config.hash_secret)?;

        let txn_ref = params
            .get("vnp_TxnRef")
            .ok_or(GatewayError::MissingParam("vnp_TxnRef"))?;
        let order_id: OrderId = txn_ref
            .parse()
            .map_err(|_| GatewayError::BadOrderRef(txn_ref.clone()))?;
        let response_code = params
            .get("vnp_ResponseCode")
            .ok_or(GatewayError::MissingParam("vnp_ResponseCode"))?;

        if response_code == "00" {
            self.settle_paid(order_id).await
        } else {
            self.settle_failed(order_id, response_code).await
        }
    }

    async fn settle_paid(&self, order_id: OrderId) -> Result<ReconcileOutcome, GatewayError> {
        let won = self
            .orders
            .confirm_payment_if_pending(order_id)
            .await
            .map_err(map_gate_error(order_id))?;

        let Some(order) = won else {
            tracing::info!(%order_id, "callback replay, order already settled");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        };

        // Stock was not reserved when the gateway order was created. The
        // payment is already captured, so a shortage here must not fail the
        // callback; it is flagged for manual follow-up instead.
        for item in order.items() {
            if let Err(e) = self
                .products
                .reserve_stock(&item.product_id, &item.size, item.quantity)
                .await
            {
                tracing::warn!(
                    %order_id,
                    product_id = %item.product_id,
                    size = %item.size,
                    quantity = item.quantity,
                    error = %e,
                    "paid order could not reserve stock, needs manual review"
                );
            }
        }

        self.carts.clear(order.user_id()).await?;

        metrics::counter!("payments_reconciled_total", "outcome" => "paid").increment(1);
        tracing::info!(%order_id, amount = %order.total_amount(), "payment confirmed");
        Ok(ReconcileOutcome::Paid(order))
    }

    async fn settle_failed(
        &self,
        order_id: OrderId,
        response_code: &str,
    ) -> Result<ReconcileOutcome, GatewayError> {
        let won = self
            .orders
            .cancel_if_payment_pending(order_id)
            .await
            .map_err(map_gate_error(order_id))?;

        let Some(order) = won else {
            tracing::info!(%order_id, "callback replay, order already settled");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        };

        metrics::counter!("payments_reconciled_total", "outcome" => "cancelled").increment(1);
        tracing::info!(%order_id, response_code, "payment failed, order cancelled");
        Ok(ReconcileOutcome::Cancelled(order))
    }

    /// Handles a server-to-server IPN callback.
    ///
    /// Never fails: the gateway keeps retrying until it gets a response
    /// body, so every error collapses into a response code.
    pub async fn handle_ipn(&self, params: &HashMap<String, String>) -> IpnResponse {
        match self.reconcile(params).await {
            Ok(ReconcileOutcome::Paid(_) | ReconcileOutcome::Cancelled(_)) => {
                IpnResponse::CONFIRM_SUCCESS
            }
            Ok(ReconcileOutcome::AlreadyProcessed) => IpnResponse::ALREADY_CONFIRMED,
            Err(GatewayError::InvalidSignature) => IpnResponse::INVALID_SIGNATURE,
            Err(GatewayError::OrderNotFound(_) | GatewayError::BadOrderRef(_)) => {
                IpnResponse::ORDER_NOT_FOUND
            }
            Err(e) => {
                tracing::error!(error = %e, "ipn processing failed");
                IpnResponse::INTERNAL_ERROR
            }
        }
    }
}

fn map_gate_error(order_id: OrderId) -> impl FnOnce(StoreError) -> GatewayError {
    move |e| match e {
        StoreError::NotFound { .. } => GatewayError::OrderNotFound(order_id),
        other => GatewayError::Store(other),
    }
}
