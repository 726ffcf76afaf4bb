use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppPath, CatalogueForm};
use crate::features::categories::dtos::{
    CategoryFormDto, CategoryResponseDto, CategoryWithProductsDto, CreateCategoryDto,
    DeleteCategoryResponseDto, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

/// Create a category
///
/// Accepts multipart/form-data with `name`, optional `description`, the
/// `image` file and optional `products` ids.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body(content = CategoryFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or duplicate name"),
        (status = 500, description = "Image storage failed")
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    mut form: CatalogueForm,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let dto = CreateCategoryDto::try_from(&form)?;
    let category = service.create(dto, form.image.take()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.list().await?;
    let meta = Meta::total(categories.len() as i64);
    Ok(Json(ApiResponse::success(Some(categories), None, Some(meta))))
}

/// Get category by id
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Get category by slug, with its products
#[utoipa::path(
    get,
    path = "/api/categories/categories/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryWithProductsDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category_by_slug(
    State(service): State<Arc<CategoryService>>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<ApiResponse<CategoryWithProductsDto>>> {
    let category = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Update a category
///
/// Only fields present in the form are changed. A new `image` replaces the
/// stored one.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    request_body(content = CategoryFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or duplicate name"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Image storage failed")
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
    mut form: CatalogueForm,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let dto = UpdateCategoryDto::try_from(&form)?;
    let category = service.update(id, dto, form.image.take()).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Delete a category and its image
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<DeleteCategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Image could not be released; category kept")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<DeleteCategoryResponseDto>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        Some(DeleteCategoryResponseDto { deleted: true }),
        Some("Category deleted".to_string()),
        None,
    )))
}
