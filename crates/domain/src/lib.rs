//! Domain layer for the storefront backend.
//!
//! This crate implements the pricing/consistency core:
//! - Catalog: product records and the shared stock-adjustment primitive
//! - Cart: one mutable basket per user with a cached subtotal
//! - Coupon: discount rules and the preview/apply evaluator
//! - Order: immutable purchase snapshots with a status state machine
//!
//! Every service is generic over a [`doc_store::DocStore`] backend and owns
//! the consistency of its own documents; there are no cross-document
//! transactions (see the store crate docs).

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod error;
pub mod media;
pub mod money;
pub mod order;

pub use cart::{Cart, CartError, CartService};
pub use catalog::{
    CatalogError, CatalogService, Category, NewProduct, Product, ProductImage, ProductPage,
    ProductQuery, ProductUpdate, Review, StockDirection, adjust_stock,
};
pub use coupon::{Coupon, CouponError, CouponQuote, CouponService, DiscountRule, NewCoupon};
pub use error::{DomainError, ErrorKind};
pub use media::{InMemoryMediaStore, MediaError, MediaStore};
pub use money::Money;
pub use order::{
    NewOrder, NewOrderItem, Order, OrderError, OrderItem, OrderService, OrderStatus,
    OrdersSummary, PaymentInfo, ShippingInfo,
};
