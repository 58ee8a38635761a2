//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;
use gateway::GatewayError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed identity headers.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// The request conflicts with the resource's current state.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match &err {
            CheckoutError::EmptyCart
            | CheckoutError::ProductUnavailable { .. }
            | CheckoutError::UnknownSize { .. }
            | CheckoutError::InsufficientStock { .. } => ApiError::BadRequest(err.to_string()),
            CheckoutError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),
            CheckoutError::Forbidden => ApiError::Forbidden(err.to_string()),
            CheckoutError::Domain(domain_err) => match domain_err {
                DomainError::InvalidStatusTransition { .. }
                | DomainError::InvalidPaymentTransition { .. }
                | DomainError::NotCancellable { .. } => ApiError::Conflict(err.to_string()),
                DomainError::EmptyOrder | DomainError::InvalidQuantity { .. } => {
                    ApiError::BadRequest(err.to_string())
                }
            },
            CheckoutError::Store(store_err) => store_error_to_api(store_err, &err),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::InvalidSignature
            | GatewayError::MissingParam(_)
            | GatewayError::BadOrderRef(_) => ApiError::BadRequest(err.to_string()),
            GatewayError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),
            GatewayError::Configuration(_) => ApiError::Internal(err.to_string()),
            GatewayError::Store(store_err) => store_error_to_api(store_err, &err),
        }
    }
}

fn store_error_to_api(store_err: &StoreError, err: &dyn std::fmt::Display) -> ApiError {
    match store_err {
        StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        _ => ApiError::Internal(err.to_string()),
    }
}
