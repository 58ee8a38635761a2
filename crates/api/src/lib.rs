//! HTTP API server with observability for the storefront order service.
//!
//! Provides REST endpoints for checkout, order management, and gateway
//! payment callbacks, with structured logging (tracing) and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{Checkout, OrderLedger};
use gateway::{PaymentBridge, VnpayConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    CartStore, MemoryCartStore, MemoryOrderStore, MemoryProductStore, OrderStore, ProductStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/vnpay", post(routes::vnpay::create))
        .route("/orders/vnpay/return", get(routes::vnpay::return_callback))
        .route("/orders/vnpay/ipn", get(routes::vnpay::ipn))
        .route("/orders/my-orders", get(routes::orders::my_orders))
        .route("/orders/admin/all", get(routes::orders::admin_list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", put(routes::orders::cancel))
        .route("/orders/{id}/status", put(routes::orders::update_status))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires application state over any store implementations.
pub fn create_state(
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    vnpay: VnpayConfig,
) -> Arc<AppState> {
    let ledger = OrderLedger::new(orders.clone(), products.clone());
    let checkout = Checkout::new(ledger.clone(), products.clone(), carts.clone());
    let bridge = PaymentBridge::new(vnpay, orders, products, carts);

    Arc::new(AppState {
        ledger,
        checkout,
        bridge,
    })
}

/// In-memory stores returned alongside the state so tests can seed data.
pub struct MemoryStores {
    pub products: Arc<MemoryProductStore>,
    pub carts: Arc<MemoryCartStore>,
    pub orders: Arc<MemoryOrderStore>,
}

/// Creates application state backed by in-memory stores.
pub fn create_memory_state(vnpay: VnpayConfig) -> (Arc<AppState>, MemoryStores) {
    let products = Arc::new(MemoryProductStore::new());
    let carts = Arc::new(MemoryCartStore::new());
    let orders = Arc::new(MemoryOrderStore::new());

    let state = create_state(
        products.clone(),
        carts.clone(),
        orders.clone(),
        vnpay,
    );

    (
        state,
        MemoryStores {
            products,
            carts,
            orders,
        },
    )
}
