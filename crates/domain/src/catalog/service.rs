//! Catalog service and the shared stock-adjustment primitive.

use chrono::Utc;
use common::{ProductId, UserId};
use doc_store::{DocStore, DocStoreExt};
use serde_json::Value;

use crate::error::DomainError;
use crate::media::MediaStore;

use super::{
    CatalogError, MAX_NAME_LEN, NewProduct, PRODUCTS_PER_PAGE, Product, ProductPage, ProductQuery,
    ProductUpdate, Review, StockDirection, slugify,
};

/// Loads a product or fails with `ProductNotFound`.
///
/// Shared with the cart and order services, which validate product
/// references without holding a full catalog service.
pub async fn load_product<S: DocStore>(
    store: &S,
    id: ProductId,
) -> Result<Product, DomainError> {
    store
        .get_doc::<Product>(id.as_uuid())
        .await?
        .ok_or_else(|| CatalogError::ProductNotFound { id }.into())
}

/// Adjusts a product's stock by `quantity` in the given direction.
///
/// `Consume` subtracts, `Restore` adds. Fails with `NotFound` if the product
/// no longer exists. No floor check is applied here; callers are responsible
/// for having validated availability beforehand.
pub async fn adjust_stock<S: DocStore>(
    store: &S,
    product_id: ProductId,
    quantity: u32,
    direction: StockDirection,
) -> Result<(), DomainError> {
    let mut product = load_product(store, product_id).await?;

    match direction {
        StockDirection::Consume => product.stock -= quantity as i64,
        StockDirection::Restore => product.stock += quantity as i64,
    }
    product.updated_at = Utc::now();

    store.put_doc(&product).await?;
    Ok(())
}

/// Service for managing catalog products.
#[derive(Clone)]
pub struct CatalogService<S, M> {
    store: S,
    media: M,
}

impl<S: DocStore, M: MediaStore> CatalogService<S, M> {
    /// Creates a new catalog service.
    pub fn new(store: S, media: M) -> Self {
        Self { store, media }
    }

    /// Creates a new product. Admin operation.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(
        &self,
        created_by: UserId,
        new: NewProduct,
    ) -> Result<Product, DomainError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::MissingField { field: "name" }.into());
        }
        if name.len() > MAX_NAME_LEN {
            return Err(CatalogError::NameTooLong.into());
        }
        if new.description.trim().is_empty() {
            return Err(CatalogError::MissingField {
                field: "description",
            }
            .into());
        }
        if new.price.is_negative() {
            return Err(CatalogError::NegativePrice.into());
        }

        let slug = slugify(&name);
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name,
            slug,
            description: new.description,
            price: new.price,
            ratings: 0.0,
            images: new.images,
            category: new.category,
            stock: new.stock,
            num_of_reviews: 0,
            reviews: vec![],
            created_by,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_doc(&product).await?;
        Ok(product)
    }

    /// Applies a partial update to a product. Admin operation.
    ///
    /// A name change re-derives the slug.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        let mut product = load_product(&self.store, id).await?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::MissingField { field: "name" }.into());
            }
            if name.len() > MAX_NAME_LEN {
                return Err(CatalogError::NameTooLong.into());
            }

            let slug = slugify(&name);
            if slug != product.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
            }
            product.name = name;
            product.slug = slug;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(price) = update.price {
            if price.is_negative() {
                return Err(CatalogError::NegativePrice.into());
            }
            product.price = price;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(images) = update.images {
            product.images = images;
        }
        product.updated_at = Utc::now();

        self.store.put_doc(&product).await?;
        Ok(product)
    }

    /// Loads a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        load_product(&self.store, id).await
    }

    /// Loads a product by its unique slug.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Product, DomainError> {
        self.store
            .find_doc_by::<Product>("slug", Value::String(slug.to_string()))
            .await?
            .ok_or_else(|| {
                CatalogError::SlugNotFound {
                    slug: slug.to_string(),
                }
                .into()
            })
    }

    /// Lists products matching the query, paginated.
    #[tracing::instrument(skip(self, query))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, DomainError> {
        let all: Vec<Product> = self.store.list_docs().await?;
        let matching: Vec<Product> = all.into_iter().filter(|p| query.matches(p)).collect();

        let product_count = matching.len();
        let page = query.page.unwrap_or(1).max(1);
        let products = matching
            .into_iter()
            .skip((page - 1) * PRODUCTS_PER_PAGE)
            .take(PRODUCTS_PER_PAGE)
            .collect();

        Ok(ProductPage {
            products,
            product_count,
            page,
            per_page: PRODUCTS_PER_PAGE,
        })
    }

    /// Deletes a product and destroys its stored images. Admin operation.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, DomainError> {
        let product = load_product(&self.store, id).await?;

        for image in &product.images {
            self.media.destroy(&image.public_id).await?;
        }

        self.store.delete_doc::<Product>(id.as_uuid()).await?;
        Ok(product)
    }

    /// Adds or replaces the caller's review on a product.
    ///
    /// A user gets one review per product; reviewing again replaces the
    /// previous one. Recomputes the derived rating aggregates.
    #[tracing::instrument(skip(self, name, comment))]
    pub async fn add_review(
        &self,
        id: ProductId,
        user_id: UserId,
        name: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Result<Product, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(CatalogError::InvalidRating { rating }.into());
        }

        let mut product = load_product(&self.store, id).await?;

        let review = Review {
            user_id,
            name: name.into(),
            rating,
            comment: comment.into(),
        };
        if let Some(existing) = product.reviews.iter_mut().find(|r| r.user_id == user_id) {
            *existing = review;
        } else {
            product.reviews.push(review);
        }
        product.recompute_ratings();
        product.updated_at = Utc::now();

        self.store.put_doc(&product).await?;
        Ok(product)
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        updating: Option<ProductId>,
    ) -> Result<(), DomainError> {
        let existing = self
            .store
            .find_doc_by::<Product>("slug", Value::String(slug.to_string()))
            .await?;

        if let Some(existing) = existing
            && updating != Some(existing.id)
        {
            return Err(CatalogError::SlugExists {
                slug: slug.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use doc_store::InMemoryDocStore;

    use super::*;
    use crate::media::InMemoryMediaStore;
    use crate::money::Money;
    use crate::catalog::{Category, ProductImage};

    fn service() -> CatalogService<InMemoryDocStore, InMemoryMediaStore> {
        CatalogService::new(InMemoryDocStore::new(), InMemoryMediaStore::new())
    }

    fn new_product(name: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: "a fine product".to_string(),
            price: Money::from_cents(price_cents),
            category: Category::Electronics,
            stock,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn create_derives_slug() {
        let service = service();
        let product = service
            .create_product(UserId::new(), new_product("Gaming Laptop", 99900, 5))
            .await
            .unwrap();

        assert_eq!(product.slug, "gaming-laptop");
        assert_eq!(product.stock, 5);
        assert_eq!(product.num_of_reviews, 0);

        let loaded = service.get_by_slug("gaming-laptop").await.unwrap();
        assert_eq!(loaded.id, product.id);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_slug() {
        let service = service();
        service
            .create_product(UserId::new(), new_product("Gaming Laptop", 99900, 5))
            .await
            .unwrap();

        let result = service
            .create_product(UserId::new(), new_product("Gaming Laptop", 50000, 1))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::SlugExists { .. }))
        ));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let service = service();

        let result = service
            .create_product(UserId::new(), new_product("   ", 100, 0))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::MissingField { field: "name" }))
        ));

        let result = service
            .create_product(UserId::new(), new_product(&"x".repeat(101), 100, 0))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::NameTooLong))
        ));

        let result = service
            .create_product(UserId::new(), new_product("Widget", -1, 0))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::NegativePrice))
        ));
    }

    #[tokio::test]
    async fn update_renames_and_reslugs() {
        let service = service();
        let product = service
            .create_product(UserId::new(), new_product("Old Name", 100, 0))
            .await
            .unwrap();

        let updated = service
            .update_product(
                product.id,
                ProductUpdate {
                    name: Some("New Name".to_string()),
                    price: Some(Money::from_cents(200)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.slug, "new-name");
        assert_eq!(updated.price, Money::from_cents(200));

        let result = service.get_by_slug("old-name").await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::SlugNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn update_missing_product_fails() {
        let service = service();
        let result = service
            .update_product(ProductId::new(), ProductUpdate::default())
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::ProductNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let service = service();
        for n in 0..12 {
            service
                .create_product(UserId::new(), new_product(&format!("Widget {n}"), 100, 0))
                .await
                .unwrap();
        }
        service
            .create_product(UserId::new(), new_product("Gadget", 100, 0))
            .await
            .unwrap();

        let page1 = service
            .list_products(ProductQuery::new().keyword("widget"))
            .await
            .unwrap();
        assert_eq!(page1.product_count, 12);
        assert_eq!(page1.products.len(), 10);
        assert_eq!(page1.page, 1);

        let page2 = service
            .list_products(ProductQuery::new().keyword("widget").page(2))
            .await
            .unwrap();
        assert_eq!(page2.products.len(), 2);
    }

    #[tokio::test]
    async fn delete_destroys_images() {
        let store = InMemoryDocStore::new();
        let media = InMemoryMediaStore::new();
        let service = CatalogService::new(store, media.clone());

        let mut new = new_product("Widget", 100, 0);
        new.images = vec![
            ProductImage {
                public_id: "products/a".to_string(),
                url: "https://cdn/a.webp".to_string(),
            },
            ProductImage {
                public_id: "products/b".to_string(),
                url: "https://cdn/b.webp".to_string(),
            },
        ];
        let product = service.create_product(UserId::new(), new).await.unwrap();

        service.delete_product(product.id).await.unwrap();

        assert_eq!(media.destroyed_count(), 2);
        assert!(media.was_destroyed("products/a"));
        assert!(matches!(
            service.get_product(product.id).await,
            Err(DomainError::Catalog(CatalogError::ProductNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn review_replaces_per_user() {
        let service = service();
        let product = service
            .create_product(UserId::new(), new_product("Widget", 100, 0))
            .await
            .unwrap();
        let reviewer = UserId::new();

        let product = service
            .add_review(product.id, reviewer, "Ana", 5, "great")
            .await
            .unwrap();
        assert_eq!(product.num_of_reviews, 1);
        assert_eq!(product.ratings, 5.0);

        let product = service
            .add_review(product.id, reviewer, "Ana", 3, "changed my mind")
            .await
            .unwrap();
        assert_eq!(product.num_of_reviews, 1);
        assert_eq!(product.ratings, 3.0);

        let product = service
            .add_review(product.id, UserId::new(), "Ben", 5, "great")
            .await
            .unwrap();
        assert_eq!(product.num_of_reviews, 2);
        assert_eq!(product.ratings, 4.0);
    }

    #[tokio::test]
    async fn review_rating_must_be_in_range() {
        let service = service();
        let product = service
            .create_product(UserId::new(), new_product("Widget", 100, 0))
            .await
            .unwrap();

        for rating in [0, 6] {
            let result = service
                .add_review(product.id, UserId::new(), "Ana", rating, "x")
                .await;
            assert!(matches!(
                result,
                Err(DomainError::Catalog(CatalogError::InvalidRating { .. }))
            ));
        }
    }

    #[tokio::test]
    async fn adjust_stock_both_directions() {
        let store = InMemoryDocStore::new();
        let service = CatalogService::new(store.clone(), InMemoryMediaStore::new());
        let product = service
            .create_product(UserId::new(), new_product("Widget", 100, 10))
            .await
            .unwrap();

        adjust_stock(&store, product.id, 3, StockDirection::Consume)
            .await
            .unwrap();
        assert_eq!(service.get_product(product.id).await.unwrap().stock, 7);

        adjust_stock(&store, product.id, 3, StockDirection::Restore)
            .await
            .unwrap();
        assert_eq!(service.get_product(product.id).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn adjust_stock_has_no_floor() {
        let store = InMemoryDocStore::new();
        let service = CatalogService::new(store.clone(), InMemoryMediaStore::new());
        let product = service
            .create_product(UserId::new(), new_product("Widget", 100, 1))
            .await
            .unwrap();

        adjust_stock(&store, product.id, 5, StockDirection::Consume)
            .await
            .unwrap();
        assert_eq!(service.get_product(product.id).await.unwrap().stock, -4);
    }

    #[tokio::test]
    async fn adjust_stock_missing_product_fails() {
        let store = InMemoryDocStore::new();
        let result = adjust_stock(&store, ProductId::new(), 1, StockDirection::Consume).await;
        assert!(matches!(
            result,
            Err(DomainError::Catalog(CatalogError::ProductNotFound { .. }))
        ));
    }
}
