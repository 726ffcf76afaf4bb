use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::CatalogueForm;
use crate::features::products::models::{Product, ProductFilter};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::{parse_bool, validate_price, validate_sluggable};

/// Multipart request body for creating a product (Swagger UI documentation only).
/// The handler reads the form through `CatalogueForm`.
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ProductFormDto {
    #[schema(example = "Blue Chair")]
    pub name: String,
    pub description: Option<String>,
    /// Product image (jpg, jpeg or png)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
    #[schema(value_type = Option<f64>, example = 129.5)]
    pub regular_price: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub sale_price: Option<String>,
    pub is_on_sale: Option<bool>,
    pub is_b_seller: Option<bool>,
    pub is_new_product: Option<bool>,
    pub is_featured: Option<bool>,
    /// Category id; an empty value detaches the product on update
    pub category: Option<Uuid>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateProductDto {
    #[validate(
        length(min = 1, max = 50, message = "name must be between 1 and 50 characters"),
        custom(function = "validate_sluggable")
    )]
    pub name: String,

    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub regular_price: Decimal,

    #[validate(custom(function = "validate_price"))]
    pub sale_price: Decimal,

    pub is_on_sale: bool,
    pub is_b_seller: bool,
    pub is_new_product: bool,
    pub is_featured: bool,
    pub category: Option<Uuid>,
}

/// Partial update; only fields present in the form are applied
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateProductDto {
    #[validate(
        length(min = 1, max = 50, message = "name must be between 1 and 50 characters"),
        custom(function = "validate_sluggable")
    )]
    pub name: Option<String>,

    /// An empty value clears the description
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub regular_price: Option<Decimal>,

    #[validate(custom(function = "validate_price"))]
    pub sale_price: Option<Decimal>,

    pub is_on_sale: Option<bool>,
    pub is_b_seller: Option<bool>,
    pub is_new_product: Option<bool>,
    pub is_featured: Option<bool>,

    /// `Some(None)` detaches the product from its category
    pub category: Option<Option<Uuid>>,
}

fn parse_price(form: &CatalogueForm, field: &str) -> Result<Option<Decimal>> {
    form.text(field)
        .map(|raw| {
            Decimal::from_str(raw.trim())
                .map_err(|_| AppError::Validation(format!("{}: '{}' is not a number", field, raw)))
        })
        .transpose()
}

fn parse_flag(form: &CatalogueForm, field: &str) -> Result<Option<bool>> {
    form.text(field)
        .map(|raw| parse_bool(field, raw).map_err(AppError::Validation))
        .transpose()
}

/// Empty input means "no category"
fn parse_category(form: &CatalogueForm) -> Result<Option<Option<Uuid>>> {
    form.text("category")
        .map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            Uuid::parse_str(raw).map(Some).map_err(|_| {
                AppError::Validation(format!("category: '{}' is not a valid category id", raw))
            })
        })
        .transpose()
}

impl TryFrom<&CatalogueForm> for CreateProductDto {
    type Error = AppError;

    fn try_from(form: &CatalogueForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default().trim().to_string(),
            description: form.text("description").map(|d| d.trim().to_string()),
            regular_price: parse_price(form, "regularPrice")?.unwrap_or_default(),
            sale_price: parse_price(form, "salePrice")?.unwrap_or_default(),
            is_on_sale: parse_flag(form, "isOnSale")?.unwrap_or_default(),
            is_b_seller: parse_flag(form, "isBSeller")?.unwrap_or_default(),
            is_new_product: parse_flag(form, "isNewProduct")?.unwrap_or_default(),
            is_featured: parse_flag(form, "isFeatured")?.unwrap_or_default(),
            category: parse_category(form)?.flatten(),
        })
    }
}

impl TryFrom<&CatalogueForm> for UpdateProductDto {
    type Error = AppError;

    fn try_from(form: &CatalogueForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").map(|n| n.trim().to_string()),
            description: form.text("description").map(|d| d.trim().to_string()),
            regular_price: parse_price(form, "regularPrice")?,
            sale_price: parse_price(form, "salePrice")?,
            is_on_sale: parse_flag(form, "isOnSale")?,
            is_b_seller: parse_flag(form, "isBSeller")?,
            is_new_product: parse_flag(form, "isNewProduct")?,
            is_featured: parse_flag(form, "isFeatured")?,
            category: parse_category(form)?,
        })
    }
}

/// Response DTO for product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponseDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Public image URL
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 129.5)]
    pub regular_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 99.0)]
    pub sale_price: Decimal,
    pub is_on_sale: bool,
    pub is_b_seller: bool,
    pub is_new_product: bool,
    pub is_featured: bool,
    /// Category id, if the product belongs to one
    pub category: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponseDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            image: p.image_url,
            regular_price: p.regular_price,
            sale_price: p.sale_price,
            is_on_sale: p.is_on_sale,
            is_b_seller: p.is_b_seller,
            is_new_product: p.is_new_product,
            is_featured: p.is_featured,
            category: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Product looked up by slug, with the other products of its category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithRelatedDto {
    pub product: ProductResponseDto,
    pub related_products: Vec<ProductResponseDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteProductResponseDto {
    pub deleted: bool,
}

/// Query params for filtering products.
///
/// A flag filters only when its value is exactly `true`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQueryParams {
    pub is_new_product: Option<String>,
    pub is_b_seller: Option<String>,
    pub is_featured: Option<String>,
    pub is_on_sale: Option<String>,
    /// Category id
    pub category: Option<String>,
}

impl ProductQueryParams {
    pub fn to_filter(&self) -> Result<ProductFilter> {
        let enabled = |value: &Option<String>| value.as_deref() == Some("true");

        let category_id = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                AppError::BadRequest(format!("category: '{}' is not a valid category id", raw))
            })?),
        };

        Ok(ProductFilter {
            is_new_product: enabled(&self.is_new_product),
            is_b_seller: enabled(&self.is_b_seller),
            is_featured: enabled(&self.is_featured),
            is_on_sale: enabled(&self.is_on_sale),
            category_id,
            ..Default::default()
        })
    }
}

/// Query params for product search
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchProductsQuery {
    /// Case-insensitive part of the product name
    pub name: Option<String>,
    /// Page number (1-indexed, default: 1)
    pub page: Option<i64>,
    /// Number of items per page (default: 10, max: 100)
    pub page_size: Option<i64>,
}

impl SearchProductsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}
