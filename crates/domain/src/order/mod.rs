//! Orders: immutable purchase snapshots and their lifecycle.

mod service;
mod status;

pub use service::{OrderService, OrdersSummary};
pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{CouponId, OrderId, ProductId, UserId};
use doc_store::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::money::Money;

/// Delivery address captured with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
    pub phone_no: String,
}

/// Payment reference captured with the order.
///
/// Payment execution is an external concern; the status is accepted as
/// given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
}

/// One line of an order.
///
/// Name, price, and image are captured from the catalog at order time and
/// never re-read, so later catalog changes cannot rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    pub image: String,
}

impl OrderItem {
    /// Returns the total price for this line (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// An immutable order snapshot.
///
/// Created only by [`OrderService::create`]; mutated only through status
/// transitions or cancellation; deleted only by the admin escape hatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_info: ShippingInfo,
    pub items: Vec<OrderItem>,
    pub payment_info: PaymentInfo,
    pub items_price: Money,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub total_price: Money,
    pub coupon_applied: Option<CouponId>,
    pub status: OrderStatus,
    pub paid_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
}

/// One requested line of a new order: the product and how many.
///
/// No price field — unit prices are re-read from the catalog at creation
/// time so a tampering client cannot set its own.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Fields required to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_info: ShippingInfo,
    pub items: Vec<NewOrderItem>,
    pub payment_info: PaymentInfo,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub coupon_code: Option<String>,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order creation with no items.
    #[error("Your cart is empty.")]
    NoItems,

    /// A line with quantity zero.
    #[error("Quantity must be at least 1")]
    InvalidQuantity { product_id: ProductId },

    /// The order does not exist.
    #[error("Order not found.")]
    OrderNotFound { id: OrderId },

    /// The caller does not own this order.
    #[error("You are not eligible to cancel this order.")]
    NotOwner,

    /// Cancellation attempted outside the Processing status.
    #[error("Order cannot be cancelled. It is already in the '{status}' state.")]
    CannotCancel { status: OrderStatus },

    /// Status update on an already-delivered order.
    #[error("Order has already been delivered.")]
    AlreadyDelivered,

    /// An illegal status transition.
    #[error("Order cannot move from '{from}' to '{to}'.")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The submitted coupon code matched nothing.
    #[error("Your coupon is invalid.")]
    CouponInvalid,

    /// The coupon expired before the order was placed.
    #[error("Your coupon is expired and can no longer be used.")]
    CouponExpired,

    /// The order total is below the coupon's minimum.
    #[error("You are not eligible to apply this coupon.")]
    CouponBelowMinimum,
}

impl OrderError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::CouponInvalid
            | OrderError::CouponExpired
            | OrderError::CouponBelowMinimum => ErrorKind::InvalidArgument,
            OrderError::OrderNotFound { .. } => ErrorKind::NotFound,
            OrderError::NotOwner => ErrorKind::Forbidden,
            OrderError::CannotCancel { .. }
            | OrderError::AlreadyDelivered
            | OrderError::InvalidTransition { .. } => ErrorKind::InvalidState,
        }
    }
}
