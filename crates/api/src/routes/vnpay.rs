//! VNPay gateway endpoints: checkout redirect, browser return, IPN.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use domain::ShippingAddress;
use gateway::{IpnResponse, ReconcileOutcome};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::ApiError;

use super::AppState;
use super::orders::OrderResponse;

#[derive(Deserialize)]
pub struct CreateVnpayOrderRequest {
    pub shipping_address: ShippingAddress,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct VnpayOrderResponse {
    pub order: OrderResponse,
    pub payment_url: String,
}

#[derive(Serialize)]
pub struct ReturnResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderResponse>,
}

/// The caller's network address for the gateway's `vnp_IpAddr` parameter:
/// the `x-forwarded-for` chain when a proxy sits in front, the TCP peer
/// address otherwise.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(ClientIp(forwarded.to_string()));
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        Ok(ClientIp(ip))
    }
}

/// POST /orders/vnpay — create a gateway order and its signed redirect URL.
///
/// No stock moves and the cart stays intact until the gateway confirms
/// payment.
#[tracing::instrument(skip(state, client_ip, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    client_ip: ClientIp,
    Json(req): Json<CreateVnpayOrderRequest>,
) -> Result<(StatusCode, Json<VnpayOrderResponse>), ApiError> {
    let order = state
        .checkout
        .place_gateway_order(identity.user_id, req.shipping_address, req.note)
        .await?;

    let payment_url = state.bridge.payment_url(&order, &client_ip.0)?;

    Ok((
        StatusCode::CREATED,
        Json(VnpayOrderResponse {
            order: OrderResponse::from(&order),
            payment_url,
        }),
    ))
}

/// GET /orders/vnpay/return — the customer's browser landing after payment.
///
/// Shares the reconcile operation with the IPN, so whichever callback
/// arrives first settles the order and a refresh of this page is harmless.
#[tracing::instrument(skip(state, params))]
pub async fn return_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let response = match state.bridge.reconcile(&params).await? {
        ReconcileOutcome::Paid(order) => ReturnResponse {
            status: "paid",
            order: Some(OrderResponse::from(&order)),
        },
        ReconcileOutcome::Cancelled(order) => ReturnResponse {
            status: "cancelled",
            order: Some(OrderResponse::from(&order)),
        },
        ReconcileOutcome::AlreadyProcessed => ReturnResponse {
            status: "already_processed",
            order: None,
        },
    };
    Ok(Json(response))
}

/// GET /orders/vnpay/ipn — server-to-server payment notification.
///
/// Always answers HTTP 200 with a gateway response code; the gateway
/// retries anything else.
#[tracing::instrument(skip(state, params))]
pub async fn ipn(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<IpnResponse>) {
    let response = state.bridge.handle_ipn(&params).await;
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> ClientIp {
        let (mut parts, ()) = req.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn forwarded_header_wins() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 198.51.100.2")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("10.0.0.1:443".parse().unwrap()));

        let ip = extract(req).await;
        assert_eq!(ip.0, "203.0.113.7, 198.51.100.2");
    }

    #[tokio::test]
    async fn falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("203.0.113.9:54321".parse().unwrap()));

        let ip = extract(req).await;
        assert_eq!(ip.0, "203.0.113.9");
    }

    #[tokio::test]
    async fn defaults_to_loopback_without_peer_info() {
        let req = Request::builder().body(()).unwrap();
        let ip = extract(req).await;
        assert_eq!(ip.0, "127.0.0.1");
    }
}
