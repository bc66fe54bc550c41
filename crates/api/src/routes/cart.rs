//! Cart endpoints. All of them require an authenticated user.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use doc_store::DocStore;
use domain::Cart;
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::ApiError;

use super::AppState;
use super::products::parse_product_id;

#[derive(Deserialize)]
pub struct UpsertItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// GET /cart — the caller's cart, created on first access.
#[tracing::instrument(skip(state, identity))]
pub async fn get<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.get_or_create(identity.user_id).await?;
    Ok(Json(cart))
}

/// POST /cart/items — add a product or set its quantity.
#[tracing::instrument(skip(state, identity, req))]
pub async fn upsert_item<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<UpsertItemRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .upsert_item(identity.user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart/items/:product_id — drop one product line.
#[tracing::instrument(skip(state, identity))]
pub async fn remove_item<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(product_id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state
        .carts
        .remove_item(identity.user_id, product_id)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart — empty the cart.
#[tracing::instrument(skip(state, identity))]
pub async fn clear<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.clear(identity.user_id).await?;
    Ok(Json(cart))
}
