//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, UserId};
use domain::{Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
use serde::{Deserialize, Serialize};
use store::{OrderFilter, OrderPage, Pagination};

use crate::auth::Identity;
use crate::error::ApiError;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub user_id: Option<uuid::Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub size: String,
    pub color: Option<String>,
    pub unit_price: i64,
    pub subtotal: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: i64,
    pub shipping_address: ShippingAddress,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    size: item.size.clone(),
                    color: item.color.clone(),
                    unit_price: item.unit_price.amount(),
                    subtotal: item.subtotal().amount(),
                })
                .collect(),
            total_amount: order.total_amount().amount(),
            shipping_address: order.shipping_address().clone(),
            status: order.status().to_string(),
            payment_method: order.payment_method().to_string(),
            payment_status: order.payment_status().to_string(),
            note: order.note().map(str::to_string),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: Pagination,
}

impl From<OrderPage> for OrderListResponse {
    fn from(page: OrderPage) -> Self {
        Self {
            orders: page.orders.iter().map(OrderResponse::from).collect(),
            pagination: page.pagination,
        }
    }
}

// -- Handlers --

/// POST /orders — place a direct order from the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let payment_method = match req.payment_method.as_deref() {
        None => PaymentMethod::Cod,
        Some(raw) => raw
            .parse::<PaymentMethod>()
            .map_err(ApiError::BadRequest)?,
    };
    if payment_method == PaymentMethod::Vnpay {
        return Err(ApiError::BadRequest(
            "vnpay orders go through POST /orders/vnpay".to_string(),
        ));
    }

    let order = state
        .checkout
        .place_order(identity.user_id, req.shipping_address, payment_method, req.note)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/my-orders — list the caller's orders, newest first.
#[tracing::instrument(skip(state, query))]
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let filter = OrderFilter {
        user_id: Some(identity.user_id),
        status: parse_status(query.status.as_deref())?,
        page: query.page.unwrap_or(0),
        page_size: query.page_size.unwrap_or(0),
    };

    let page = state.ledger.list(&filter).await?;
    Ok(Json(OrderListResponse::from(page)))
}

/// GET /orders/:id — load one order; owner or admin only.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .ledger
        .get(OrderId::from_uuid(id), identity.user_id, identity.is_admin)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/:id/cancel — cancel a pending order; owner only.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .ledger
        .cancel(OrderId::from_uuid(id), identity.user_id)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/admin/all — list all orders with filters; admin only.
#[tracing::instrument(skip(state, query))]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    identity.require_admin()?;

    let filter = OrderFilter {
        user_id: query.user_id.map(UserId::from_uuid),
        status: parse_status(query.status.as_deref())?,
        page: query.page.unwrap_or(0),
        page_size: query.page_size.unwrap_or(0),
    };

    let page = state.ledger.list(&filter).await?;
    Ok(Json(OrderListResponse::from(page)))
}

/// PUT /orders/:id/status — apply an admin status change.
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    identity.require_admin()?;

    let status = parse_status(req.status.as_deref())?;
    let payment_status = match req.payment_status.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.parse::<PaymentStatus>()
                .map_err(ApiError::BadRequest)?,
        ),
    };
    if status.is_none() && payment_status.is_none() {
        return Err(ApiError::BadRequest(
            "nothing to update: provide status and/or payment_status".to_string(),
        ));
    }

    let order = state
        .ledger
        .update_status(OrderId::from_uuid(id), status, payment_status)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

fn parse_status(raw: Option<&str>) -> Result<Option<OrderStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .parse::<OrderStatus>()
            .map(Some)
            .map_err(ApiError::BadRequest),
    }
}
