//! Order endpoints: user checkout and lifecycle, admin management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use doc_store::DocStore;
use domain::{
    Money, NewOrder, NewOrderItem, Order, OrderStatus, OrdersSummary, PaymentInfo, ShippingInfo,
};
use serde::Deserialize;

use crate::auth::{Identity, Role, require_role};
use crate::error::ApiError;

use super::AppState;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<NewOrderItem>,
    pub payment_info: PaymentInfo,
    /// Cents.
    #[serde(default)]
    pub tax_price: Money,
    /// Cents.
    #[serde(default)]
    pub shipping_price: Money,
    pub coupon_code: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// POST /orders — place an order.
#[tracing::instrument(skip(state, identity, req))]
pub async fn create<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .create(
            identity.user_id,
            NewOrder {
                shipping_info: req.shipping_info,
                items: req.order_items,
                payment_info: req.payment_info,
                tax_price: req.tax_price,
                shipping_price: req.shipping_price,
                coupon_code: req.coupon_code,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/me — the caller's order history.
#[tracing::instrument(skip(state, identity))]
pub async fn mine<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.orders.list_for_user(identity.user_id).await?;
    Ok(Json(orders))
}

/// GET /orders/:id — single order details. Owner or admin.
#[tracing::instrument(skip(state, identity))]
pub async fn get<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.orders.get(id).await?;

    if order.user_id != identity.user_id {
        require_role(&identity, &[Role::Admin])?;
    }
    Ok(Json(order))
}

/// PUT /orders/:id/cancel — cancel the caller's own order.
#[tracing::instrument(skip(state, identity))]
pub async fn cancel<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state.orders.cancel(identity.user_id, id).await?;
    Ok(Json(order))
}

/// GET /admin/orders — every order plus the grand total. Admin only.
#[tracing::instrument(skip(state, identity))]
pub async fn list_all<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<OrdersSummary>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let summary = state.orders.list_all().await?;
    Ok(Json(summary))
}

/// PUT /admin/orders/:id — move an order through its lifecycle. Admin only.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update_status<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let id = parse_order_id(&id)?;
    let order = state.orders.update_status(id, req.status).await?;
    Ok(Json(order))
}

/// DELETE /admin/orders/:id — delete an order, restoring stock. Admin only.
#[tracing::instrument(skip(state, identity))]
pub async fn remove<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let id = parse_order_id(&id)?;
    let order = state.orders.delete(id).await?;
    Ok(Json(order))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
