use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::modules::storage::StoredImage;

/// Database model for category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: String,
    pub image_key: String,
    /// Products whose `category_id` points here
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn image(&self) -> StoredImage {
        StoredImage {
            url: self.image_url.clone(),
            key: self.image_key.clone(),
        }
    }
}

/// A validated category ready to insert
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: StoredImage,
    /// Products to assign to the new category
    pub product_ids: Vec<Uuid>,
}

/// Partial update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    /// Only ever set together with `name`
    pub slug: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub image: Option<StoredImage>,
    /// Replaces the set of products assigned to the category
    pub product_ids: Option<Vec<Uuid>>,
}
