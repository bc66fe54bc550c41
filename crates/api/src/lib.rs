//! HTTP API server for the storefront backend.
//!
//! Exposes the catalog, cart, coupon, and order services over REST with
//! structured logging (tracing) and Prometheus metrics. Authentication is a
//! gateway concern; this layer extracts the forwarded identity and enforces
//! the role policy before handing off to the domain services.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use doc_store::DocStore;
use domain::{CartService, CatalogService, CouponService, InMemoryMediaStore, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::remove::<S>),
        )
        .route(
            "/products/{id}/reviews",
            post(routes::products::add_review::<S>),
        )
        .route(
            "/products/slug/{slug}",
            get(routes::products::get_by_slug::<S>),
        )
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/items", post(routes::cart::upsert_item::<S>))
        .route(
            "/cart/items/{product_id}",
            delete(routes::cart::remove_item::<S>),
        )
        .route(
            "/coupons",
            post(routes::coupons::create::<S>).get(routes::coupons::list::<S>),
        )
        .route("/coupons/apply", post(routes::coupons::apply::<S>))
        .route("/coupons/{id}", delete(routes::coupons::remove::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/me", get(routes::orders::mine::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route("/admin/orders", get(routes::orders::list_all::<S>))
        .route(
            "/admin/orders/{id}",
            put(routes::orders::update_status::<S>).delete(routes::orders::remove::<S>),
        )
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

/// Creates the default application state over the given store.
pub fn create_default_state<S: DocStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone(), InMemoryMediaStore::new()),
        carts: CartService::new(store.clone()),
        coupons: CouponService::new(store.clone()),
        orders: OrderService::new(store),
    })
}
