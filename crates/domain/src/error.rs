//! Domain error types.

use doc_store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::coupon::CouponError;
use crate::media::MediaError;
use crate::order::OrderError;

/// Classification of a failure.
///
/// Every core operation either completes or fails with exactly one kind plus
/// a human-readable message; the API layer maps kinds to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/malformed input or a business-rule violation.
    InvalidArgument,
    /// A referenced entity is absent.
    NotFound,
    /// A uniqueness violation.
    Conflict,
    /// An illegal state transition.
    InvalidState,
    /// The caller is not allowed to act on this entity.
    Forbidden,
    /// An unexpected store or service failure.
    Internal,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An error occurred in the cart aggregate.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An error occurred in the coupon evaluator.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// An error occurred in the order pipeline.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// An error occurred in the media store.
    #[error("Media store error: {0}")]
    Media(#[from] MediaError),

    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Catalog(e) => e.kind(),
            DomainError::Cart(e) => e.kind(),
            DomainError::Coupon(e) => e.kind(),
            DomainError::Order(e) => e.kind(),
            DomainError::Media(_) | DomainError::Store(_) | DomainError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }
}
