use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::CatalogueForm;
use crate::features::categories::models::Category;
use crate::features::products::dtos::ProductResponseDto;
use crate::shared::validation::validate_sluggable;

/// Multipart request body for creating a category (Swagger UI documentation only).
/// The handler reads the form through `CatalogueForm`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CategoryFormDto {
    #[schema(example = "Living Room")]
    pub name: String,
    pub description: Option<String>,
    /// Category image (jpg, jpeg or png)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
    /// Product ids to assign, repeated or comma-separated
    pub products: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateCategoryDto {
    #[validate(
        length(min = 1, max = 50, message = "name must be between 1 and 50 characters"),
        custom(function = "validate_sluggable")
    )]
    pub name: String,

    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,

    pub products: Vec<Uuid>,
}

/// Partial update; only fields present in the form are applied
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateCategoryDto {
    #[validate(
        length(min = 1, max = 50, message = "name must be between 1 and 50 characters"),
        custom(function = "validate_sluggable")
    )]
    pub name: Option<String>,

    /// An empty value clears the description
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,

    pub products: Option<Vec<Uuid>>,
}

/// Parse product ids sent as repeated fields and/or comma-separated lists
pub fn parse_product_ids(values: &[String]) -> Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for raw in values.iter().flat_map(|v| v.split(',')) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let id = Uuid::parse_str(raw).map_err(|_| {
            AppError::Validation(format!("products: '{}' is not a valid product id", raw))
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl TryFrom<&CatalogueForm> for CreateCategoryDto {
    type Error = AppError;

    fn try_from(form: &CatalogueForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default().trim().to_string(),
            description: form.text("description").map(|d| d.trim().to_string()),
            products: parse_product_ids(form.values("products"))?,
        })
    }
}

impl TryFrom<&CatalogueForm> for UpdateCategoryDto {
    type Error = AppError;

    fn try_from(form: &CatalogueForm) -> Result<Self> {
        let products = if form.contains("products") {
            Some(parse_product_ids(form.values("products"))?)
        } else {
            None
        };

        Ok(Self {
            name: form.text("name").map(|n| n.trim().to_string()),
            description: form.text("description").map(|d| d.trim().to_string()),
            products,
        })
    }
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Public image URL
    pub image: String,
    pub products: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            image: c.image_url,
            products: c.product_ids,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySummaryDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Category looked up by slug, with its products populated
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithProductsDto {
    pub category: CategorySummaryDto,
    pub products: Vec<ProductResponseDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteCategoryResponseDto {
    pub deleted: bool,
}
