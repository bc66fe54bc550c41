//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use doc_store::DocStore;
use domain::{Category, Money, NewProduct, Product, ProductPage, ProductQuery, ProductUpdate};
use serde::Deserialize;

use crate::auth::{Identity, Role, require_role};
use crate::error::ApiError;

use super::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub category: Option<Category>,
    /// Minimum price in cents.
    pub min_price: Option<i64>,
    /// Maximum price in cents.
    pub max_price: Option<i64>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

/// GET /products — list products with filtering and pagination. Public.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>, ApiError> {
    let mut query = ProductQuery::new();
    if let Some(keyword) = params.keyword {
        query = query.keyword(keyword);
    }
    if let Some(category) = params.category {
        query = query.category(category);
    }
    if let Some(min) = params.min_price {
        query = query.min_price(Money::from_cents(min));
    }
    if let Some(max) = params.max_price {
        query = query.max_price(Money::from_cents(max));
    }
    if let Some(page) = params.page {
        query = query.page(page);
    }

    let page = state.catalog.list_products(query).await?;
    Ok(Json(page))
}

/// POST /products — create a product. Admin only.
#[tracing::instrument(skip(state, identity, req))]
pub async fn create<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let product = state.catalog.create_product(identity.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/:id — single product details. Public.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state.catalog.get_product(id).await?;
    Ok(Json(product))
}

/// GET /products/slug/:slug — single product details by slug. Public.
#[tracing::instrument(skip(state))]
pub async fn get_by_slug<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.catalog.get_by_slug(&slug).await?;
    Ok(Json(product))
}

/// PUT /products/:id — partial update. Admin only.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let id = parse_product_id(&id)?;
    let product = state.catalog.update_product(id, req).await?;
    Ok(Json(product))
}

/// DELETE /products/:id — delete a product and its images. Admin only.
#[tracing::instrument(skip(state, identity))]
pub async fn remove<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let id = parse_product_id(&id)?;
    let product = state.catalog.delete_product(id).await?;
    Ok(Json(product))
}

/// POST /products/:id/reviews — add or replace the caller's review.
#[tracing::instrument(skip(state, identity, req))]
pub async fn add_review<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state
        .catalog
        .add_review(id, identity.user_id, req.name, req.rating, req.comment)
        .await?;
    Ok(Json(product))
}

pub(super) fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
