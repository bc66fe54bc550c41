//! Coupon service: admin management and the preview evaluator.

use chrono::Utc;
use common::{CouponId, UserId};
use doc_store::{DocStore, DocStoreExt};
use serde_json::Value;

use crate::cart::Cart;
use crate::error::DomainError;
use crate::money::Money;

use super::{Coupon, CouponError, CouponQuote, DiscountRule, NewCoupon};

/// Service for managing and evaluating coupons.
#[derive(Clone)]
pub struct CouponService<S> {
    store: S,
}

impl<S: DocStore> CouponService<S> {
    /// Creates a new coupon service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a new coupon. Admin operation.
    ///
    /// The code is normalized to uppercase before storage and uniqueness is
    /// checked case-insensitively.
    #[tracing::instrument(skip(self, new), fields(code = %new.code))]
    pub async fn create(&self, new: NewCoupon) -> Result<Coupon, DomainError> {
        let code = new.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponError::CodeRequired.into());
        }
        if let DiscountRule::Flat(value) = new.rule
            && value.is_negative()
        {
            return Err(CouponError::NegativeDiscount.into());
        }

        let existing = self
            .store
            .find_doc_by::<Coupon>("code", Value::String(code.clone()))
            .await?;
        if existing.is_some() {
            return Err(CouponError::CodeExists { code }.into());
        }

        let now = Utc::now();
        let coupon = Coupon {
            id: CouponId::new(),
            code,
            rule: new.rule,
            min_cart_value: new.min_cart_value.unwrap_or_else(Money::zero),
            expiry_date: new.expiry_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_doc(&coupon).await?;
        Ok(coupon)
    }

    /// Lists all coupons. Admin operation.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        Ok(self.store.list_docs().await?)
    }

    /// Deletes a coupon by id. Admin operation.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CouponId) -> Result<(), DomainError> {
        if !self.store.delete_doc::<Coupon>(id.as_uuid()).await? {
            return Err(CouponError::CouponNotFound { id }.into());
        }
        Ok(())
    }

    /// Previews a coupon against the user's current cart.
    ///
    /// Validates eligibility and computes the discount without persisting
    /// anything; order creation re-derives the discount independently and
    /// never trusts these client-visible numbers.
    #[tracing::instrument(skip(self))]
    pub async fn preview(&self, user_id: UserId, code: &str) -> Result<CouponQuote, DomainError> {
        let cart = self.store.get_doc::<Cart>(user_id.as_uuid()).await?;
        let cart = match cart {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CouponError::EmptyCart.into()),
        };

        let code = code.trim().to_uppercase();
        let coupon = self
            .store
            .find_doc_by::<Coupon>("code", Value::String(code.clone()))
            .await?
            .ok_or(CouponError::InvalidCode { code: code.clone() })?;

        if !coupon.is_active {
            return Err(CouponError::Inactive { code }.into());
        }
        if coupon.is_expired(Utc::now()) {
            return Err(CouponError::Expired { code }.into());
        }
        if cart.subtotal < coupon.min_cart_value {
            return Err(CouponError::BelowMinimum {
                min: coupon.min_cart_value,
            }
            .into());
        }

        let discount = coupon.rule.discount_for(cart.subtotal);
        metrics::counter!("coupons_applied_total").increment(1);

        Ok(CouponQuote {
            subtotal: cart.subtotal,
            discount,
            total_price: cart.subtotal - discount,
            coupon_code: coupon.code,
        })
    }
}
