//! Product catalog: records, reviews, and the stock primitive.

mod service;

pub use service::{CatalogService, adjust_stock, load_product};

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use doc_store::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::money::Money;

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 100;

/// Page size for product listings.
pub const PRODUCTS_PER_PAGE: usize = 10;

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Cameras,
    Laptops,
    Accessories,
    Headphones,
    Food,
    Books,
    #[serde(rename = "Clothes/Shoes")]
    ClothesShoes,
    #[serde(rename = "Beauty/Health")]
    BeautyHealth,
    Sports,
    Outdoor,
    Home,
}

/// A stored product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Id of the asset in the object store.
    pub public_id: String,
    /// Public URL of the asset.
    pub url: String,
}

/// A customer review on a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// The reviewing user.
    pub user_id: UserId,
    /// Display name of the reviewer.
    pub name: String,
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Free-form comment.
    pub comment: String,
}

/// A catalog product.
///
/// Stock is mutated only through [`adjust_stock`], only by the order
/// pipeline. The `ratings` field is the derived mean of all review ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub ratings: f64,
    pub images: Vec<ProductImage>,
    pub category: Category,
    pub stock: i64,
    pub num_of_reviews: u32,
    pub reviews: Vec<Review>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
}

impl Product {
    /// Recomputes the derived review aggregates.
    pub(crate) fn recompute_ratings(&mut self) {
        self.num_of_reviews = self.reviews.len() as u32;
        self.ratings = if self.reviews.is_empty() {
            0.0
        } else {
            let total: u32 = self.reviews.iter().map(|r| r.rating as u32).sum();
            total as f64 / self.reviews.len() as f64
        };
    }
}

/// Fields required to create a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// Partial update of a product.
///
/// Stock is deliberately absent: it belongs to the order pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<Category>,
    pub images: Option<Vec<ProductImage>>,
}

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring match on the name.
    pub keyword: Option<String>,
    /// Filter by category.
    pub category: Option<Category>,
    /// Minimum price (inclusive).
    pub min_price: Option<Money>,
    /// Maximum price (inclusive).
    pub max_price: Option<Money>,
    /// 1-based page number.
    pub page: Option<usize>,
}

impl ProductQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by a name keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Filters by category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Filters to products at or above this price.
    pub fn min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    /// Filters to products at or below this price.
    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Selects a 1-based result page.
    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub(crate) fn matches(&self, product: &Product) -> bool {
        if let Some(ref keyword) = self.keyword
            && !product
                .name
                .to_lowercase()
                .contains(&keyword.to_lowercase())
        {
            return false;
        }
        if let Some(category) = self.category
            && product.category != category
        {
            return false;
        }
        if let Some(min) = self.min_price
            && product.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price > max
        {
            return false;
        }
        true
    }
}

/// One page of product listing results.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub product_count: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// Subtract from stock (order placed).
    Consume,
    /// Add back to stock (order cancelled or deleted).
    Restore,
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product does not exist.
    #[error("Product not found.")]
    ProductNotFound { id: ProductId },

    /// No product owns this slug.
    #[error("Product not found.")]
    SlugNotFound { slug: String },

    /// A required field was missing or empty.
    #[error("Please enter the product {field}")]
    MissingField { field: &'static str },

    /// The product name exceeds the length limit.
    #[error("Product name can't exceed {MAX_NAME_LEN} characters")]
    NameTooLong,

    /// Another product already owns this slug.
    #[error("A product with slug '{slug}' already exists")]
    SlugExists { slug: String },

    /// The price was negative.
    #[error("Product price cannot be negative")]
    NegativePrice,

    /// A review rating outside 1..=5.
    #[error("Rating must be between 1 and 5")]
    InvalidRating { rating: u8 },
}

impl CatalogError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ProductNotFound { .. } | CatalogError::SlugNotFound { .. } => {
                ErrorKind::NotFound
            }
            CatalogError::SlugExists { .. } => ErrorKind::Conflict,
            CatalogError::MissingField { .. }
            | CatalogError::NameTooLong
            | CatalogError::NegativePrice
            | CatalogError::InvalidRating { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// Derives a URL slug from a product name.
///
/// Lowercases, collapses every non-alphanumeric run into a single dash, and
/// trims leading/trailing dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true; // suppress a leading dash

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}
