//! HTTP route handlers.

pub mod cart;
pub mod coupons;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use doc_store::DocStore;
use domain::{CartService, CatalogService, CouponService, InMemoryMediaStore, OrderService};

/// Shared application state accessible from all handlers.
///
/// The media port is satisfied by the in-memory implementation; a real
/// object-storage client slots in where this is deployed.
pub struct AppState<S: DocStore> {
    pub catalog: CatalogService<S, InMemoryMediaStore>,
    pub carts: CartService<S>,
    pub coupons: CouponService<S>,
    pub orders: OrderService<S>,
}
