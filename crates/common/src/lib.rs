//! Shared identifier newtypes used across the storefront crates.

pub mod ids;

pub use ids::{CouponId, OrderId, ProductId, UserId};
