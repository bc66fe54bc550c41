//! Shopping cart aggregate: one mutable basket per user.

mod service;

pub use service::CartService;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use doc_store::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::money::Money;

/// A user's shopping cart.
///
/// The document id is the owner's user id, which makes the one-cart-per-user
/// rule a storage-key constraint rather than something the service has to
/// police. `subtotal` is a cached value: it is recomputed from live catalog
/// prices by every mutating operation and is NOT kept in sync by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    /// Quantity per product; a product appears at most once.
    pub items: HashMap<ProductId, u32>,
    /// Sum of price × quantity at last recomputation.
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Cart {
    const COLLECTION: &'static str = "carts";

    fn id(&self) -> Uuid {
        self.user_id.as_uuid()
    }
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn empty(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            items: HashMap::new(),
            subtotal: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the quantity of a product in the cart, if present.
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.items.get(&product_id).copied()
    }
}

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The user has no cart yet.
    #[error("Cart not found.")]
    CartNotFound,

    /// The referenced product does not exist.
    #[error("Product not found.")]
    ProductNotFound { id: ProductId },

    /// Quantity must be at least 1.
    #[error("Quantity must be at least 1")]
    InvalidQuantity { quantity: u32 },
}

impl CartError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::CartNotFound | CartError::ProductNotFound { .. } => ErrorKind::NotFound,
            CartError::InvalidQuantity { .. } => ErrorKind::InvalidArgument,
        }
    }
}
