//! Cart service.

use chrono::Utc;
use common::{ProductId, UserId};
use doc_store::{DocStore, DocStoreExt};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::money::Money;

use super::{Cart, CartError};

/// Service for managing per-user carts.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: DocStore> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating an empty one on first access.
    ///
    /// Idempotent; has no error path beyond store failures.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, DomainError> {
        if let Some(cart) = self.store.get_doc::<Cart>(user_id.as_uuid()).await? {
            return Ok(cart);
        }

        let cart = Cart::empty(user_id);
        self.store.put_doc(&cart).await?;
        Ok(cart)
    }

    /// Sets the quantity of a product in the cart.
    ///
    /// If the product is already present its quantity is replaced, not
    /// incremented; otherwise a new line is added. The cart must already
    /// exist (it is created by `get_or_create`, which every client calls
    /// first to render the cart).
    #[tracing::instrument(skip(self))]
    pub async fn upsert_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        // Validated before the cart is touched so a bad product id never
        // dirties the document.
        self.ensure_product_exists(product_id).await?;

        let mut cart = self.load_cart(user_id).await?;
        cart.items.insert(product_id, quantity);

        self.recompute_and_save(&mut cart).await?;
        Ok(cart)
    }

    /// Removes a product line from the cart.
    ///
    /// The product must still exist in the catalog even though removal does
    /// not read it; validation is deliberately strict.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, DomainError> {
        self.ensure_product_exists(product_id).await?;

        let mut cart = self.load_cart(user_id).await?;
        cart.items.remove(&product_id);

        self.recompute_and_save(&mut cart).await?;
        Ok(cart)
    }

    /// Empties the cart and zeroes its subtotal.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, DomainError> {
        let mut cart = self.load_cart(user_id).await?;

        cart.items.clear();
        cart.subtotal = Money::zero();
        cart.updated_at = Utc::now();

        self.store.put_doc(&cart).await?;
        Ok(cart)
    }

    async fn ensure_product_exists(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self
            .store
            .get_doc::<Product>(product_id.as_uuid())
            .await?
            .is_none()
        {
            return Err(CartError::ProductNotFound { id: product_id }.into());
        }
        Ok(())
    }

    async fn load_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        self.store
            .get_doc::<Cart>(user_id.as_uuid())
            .await?
            .ok_or_else(|| CartError::CartNotFound.into())
    }

    /// Recomputes the subtotal from current catalog prices and persists.
    ///
    /// Prices are read live for every line, so the subtotal always reflects
    /// the catalog as of now, not as of when items were added. A product
    /// that vanished since being added contributes zero.
    async fn recompute_and_save(&self, cart: &mut Cart) -> Result<(), DomainError> {
        let mut subtotal = Money::zero();
        for (product_id, quantity) in &cart.items {
            let price = self
                .store
                .get_doc::<Product>(product_id.as_uuid())
                .await?
                .map(|p| p.price)
                .unwrap_or_else(Money::zero);
            subtotal += price.multiply(*quantity);
        }

        cart.subtotal = subtotal;
        cart.updated_at = Utc::now();
        self.store.put_doc(cart).await?;
        Ok(())
    }
}
