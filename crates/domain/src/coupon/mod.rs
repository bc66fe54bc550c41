//! Coupons: discount rules and the preview evaluator.

mod service;

pub use service::CouponService;

use chrono::{DateTime, Utc};
use common::CouponId;
use doc_store::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::money::Money;

/// A coupon's discount rule.
///
/// Serializes with the original wire shape: a `discount_type` tag of
/// `"percentage"` or `"flat"` next to a numeric `discount_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", content = "discount_value", rename_all = "lowercase")]
pub enum DiscountRule {
    /// Percent off the eligible amount.
    Percentage(u32),
    /// Fixed amount off.
    Flat(Money),
}

impl DiscountRule {
    /// Computes the discount this rule grants on `amount`.
    ///
    /// The result is clamped to `amount` so a total can never go negative.
    pub fn discount_for(&self, amount: Money) -> Money {
        let raw = match self {
            DiscountRule::Percentage(percent) => amount.percent(*percent),
            DiscountRule::Flat(value) => *value,
        };
        raw.min(amount)
    }
}

/// A named discount rule with eligibility constraints.
///
/// Immutable once created, except for admin deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Unique code, stored uppercase.
    pub code: String,
    #[serde(flatten)]
    pub rule: DiscountRule,
    /// Minimum cart value required to apply the coupon.
    pub min_cart_value: Money,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Coupon {
    const COLLECTION: &'static str = "coupons";

    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
}

impl Coupon {
    /// Returns true if the expiry date is in the past.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }
}

/// Fields required to create a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub rule: DiscountRule,
    /// Defaults to zero when absent.
    pub min_cart_value: Option<Money>,
    pub expiry_date: DateTime<Utc>,
}

/// Result of previewing a coupon against a cart.
///
/// Nothing is persisted; the discount is re-derived independently at
/// order-creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponQuote {
    pub subtotal: Money,
    pub discount: Money,
    pub total_price: Money,
    pub coupon_code: String,
}

/// Errors that can occur during coupon operations.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Coupon code was missing or empty.
    #[error("Coupon code is required.")]
    CodeRequired,

    /// A coupon with the same (case-insensitive) code exists.
    #[error("A coupon with this code already exists.")]
    CodeExists { code: String },

    /// Flat discounts cannot be negative.
    #[error("Discount value cannot be negative.")]
    NegativeDiscount,

    /// No coupon with this id (admin delete).
    #[error("Coupon not found.")]
    CouponNotFound { id: CouponId },

    /// No coupon with this code.
    #[error("Invalid coupon code.")]
    InvalidCode { code: String },

    /// The coupon has been deactivated.
    #[error("This coupon is not active.")]
    Inactive { code: String },

    /// The coupon's expiry date has passed.
    #[error("This coupon has expired.")]
    Expired { code: String },

    /// The cart subtotal is below the coupon's minimum.
    #[error("Your cart total must be at least {min} to use this coupon.")]
    BelowMinimum { min: Money },

    /// The user's cart is missing or empty.
    #[error("Your cart is empty.")]
    EmptyCart,
}

impl CouponError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CouponError::CodeRequired
            | CouponError::NegativeDiscount
            | CouponError::BelowMinimum { .. } => ErrorKind::InvalidArgument,
            CouponError::CodeExists { .. } => ErrorKind::Conflict,
            CouponError::CouponNotFound { .. }
            | CouponError::InvalidCode { .. }
            | CouponError::EmptyCart => ErrorKind::NotFound,
            CouponError::Inactive { .. } | CouponError::Expired { .. } => ErrorKind::InvalidState,
        }
    }
}
