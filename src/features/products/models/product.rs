use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::modules::storage::StoredImage;

/// Database model for product
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: String,
    pub image_key: String,
    pub regular_price: Decimal,
    pub sale_price: Decimal,
    pub is_on_sale: bool,
    pub is_b_seller: bool,
    pub is_new_product: bool,
    pub is_featured: bool,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn image(&self) -> StoredImage {
        StoredImage {
            url: self.image_url.clone(),
            key: self.image_key.clone(),
        }
    }
}

/// A validated product ready to insert
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: StoredImage,
    pub regular_price: Decimal,
    pub sale_price: Decimal,
    pub is_on_sale: bool,
    pub is_b_seller: bool,
    pub is_new_product: bool,
    pub is_featured: bool,
    pub category_id: Option<Uuid>,
}

/// Partial update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<StoredImage>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: Option<bool>,
    pub is_b_seller: Option<bool>,
    pub is_new_product: Option<bool>,
    pub is_featured: Option<bool>,
    /// `Some(None)` detaches the product from its category
    pub category_id: Option<Option<Uuid>>,
}

/// Conditions for listing products. Flags only ever narrow the result:
/// `false` means "don't filter", never "must be false".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub is_new_product: bool,
    pub is_b_seller: bool,
    pub is_featured: bool,
    pub is_on_sale: bool,
    pub category_id: Option<Uuid>,
    pub exclude_id: Option<Uuid>,
    /// Case-insensitive substring of the name
    pub name_contains: Option<String>,
}

impl ProductFilter {
    pub fn featured() -> Self {
        Self {
            is_featured: true,
            ..Default::default()
        }
    }

    pub fn name_contains(term: impl Into<String>) -> Self {
        Self {
            name_contains: Some(term.into()),
            ..Default::default()
        }
    }

    /// Other products in `category_id`
    pub fn related_to(product_id: Uuid, category_id: Uuid) -> Self {
        Self {
            category_id: Some(category_id),
            exclude_id: Some(product_id),
            ..Default::default()
        }
    }

    /// Same conditions as the SQL built by the repository
    #[cfg(test)]
    pub fn matches(&self, product: &Product) -> bool {
        (!self.is_new_product || product.is_new_product)
            && (!self.is_b_seller || product.is_b_seller)
            && (!self.is_featured || product.is_featured)
            && (!self.is_on_sale || product.is_on_sale)
            && self
                .category_id
                .is_none_or(|id| product.category_id == Some(id))
            && self.exclude_id.is_none_or(|id| product.id != id)
            && self.name_contains.as_ref().is_none_or(|term| {
                product
                    .name
                    .to_lowercase()
                    .contains(&term.to_lowercase())
            })
    }
}
