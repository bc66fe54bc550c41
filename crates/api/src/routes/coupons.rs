//! Coupon endpoints: admin management plus the user-facing preview.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::CouponId;
use doc_store::DocStore;
use domain::{Coupon, CouponQuote, DiscountRule, Money, NewCoupon};
use serde::Deserialize;

use crate::auth::{Identity, Role, require_role};
use crate::error::ApiError;

use super::AppState;

/// All fields optional so a missing one surfaces as a 400 with the original
/// message rather than a deserialization rejection.
#[derive(Deserialize)]
pub struct CreateCouponRequest {
    pub code: Option<String>,
    pub discount_type: Option<String>,
    /// Percent for `percentage`, cents for `flat`.
    pub discount_value: Option<i64>,
    /// Cents; defaults to zero.
    pub min_cart_value: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ApplyCouponRequest {
    pub coupon_code: Option<String>,
}

/// POST /coupons — create a coupon. Admin only.
#[tracing::instrument(skip(state, identity, req))]
pub async fn create<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let (Some(code), Some(discount_type), Some(discount_value), Some(expiry_date)) = (
        req.code,
        req.discount_type,
        req.discount_value,
        req.expiry_date,
    ) else {
        return Err(ApiError::BadRequest(
            "All required fields must be provided.".to_string(),
        ));
    };

    let rule = match discount_type.as_str() {
        "percentage" => {
            let percent = u32::try_from(discount_value).map_err(|_| {
                ApiError::BadRequest("Discount value cannot be negative.".to_string())
            })?;
            DiscountRule::Percentage(percent)
        }
        "flat" => DiscountRule::Flat(Money::from_cents(discount_value)),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown discount type '{other}'."
            )));
        }
    };

    let coupon = state
        .coupons
        .create(NewCoupon {
            code,
            rule,
            min_cart_value: req.min_cart_value.map(Money::from_cents),
            expiry_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(coupon)))
}

/// GET /coupons — list all coupons. Admin only.
#[tracing::instrument(skip(state, identity))]
pub async fn list<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<Coupon>>, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let coupons = state.coupons.list().await?;
    Ok(Json(coupons))
}

/// DELETE /coupons/:id — delete a coupon. Admin only.
#[tracing::instrument(skip(state, identity))]
pub async fn remove<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let id: CouponId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    state.coupons.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /coupons/apply — preview a coupon against the caller's cart.
///
/// Computes the quote without persisting anything; the order pipeline
/// re-derives the discount on its own at creation time.
#[tracing::instrument(skip(state, identity, req))]
pub async fn apply<S: DocStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<CouponQuote>, ApiError> {
    let Some(code) = req.coupon_code else {
        return Err(ApiError::BadRequest("Coupon code is required.".to_string()));
    };

    let quote = state.coupons.preview(identity.user_id, &code).await?;
    Ok(Json(quote))
}
