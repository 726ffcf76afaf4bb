use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppPath, AppQuery, CatalogueForm};
use crate::features::products::dtos::{
    CreateProductDto, DeleteProductResponseDto, ProductFormDto, ProductQueryParams,
    ProductResponseDto, ProductWithRelatedDto, SearchProductsQuery, UpdateProductDto,
};
use crate::features::products::services::ProductService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Create a product
///
/// Accepts multipart/form-data; the `image` file is required.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = ProductFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Validation error, duplicate name or unknown category"),
        (status = 500, description = "Image storage failed")
    ),
    tag = "products"
)]
pub async fn create_product(
    State(service): State<Arc<ProductService>>,
    mut form: CatalogueForm,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponseDto>>)> {
    let dto = CreateProductDto::try_from(&form)?;
    let product = service.create(dto, form.image.take()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(product),
            Some("Product created".to_string()),
            None,
        )),
    ))
}

/// List all products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List of products", body = ApiResponse<Vec<ProductResponseDto>>),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(service): State<Arc<ProductService>>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let products = service.list().await?;
    let meta = Meta::total(products.len() as i64);
    Ok(Json(ApiResponse::success(Some(products), None, Some(meta))))
}

/// Filter products by flags and category
///
/// Each flag narrows the result only when its value is `true`.
#[utoipa::path(
    get,
    path = "/api/products/products",
    params(ProductQueryParams),
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<Vec<ProductResponseDto>>),
        (status = 400, description = "Invalid category id")
    ),
    tag = "products"
)]
pub async fn filter_products(
    State(service): State<Arc<ProductService>>,
    AppQuery(params): AppQuery<ProductQueryParams>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let products = service.filter(&params.to_filter()?).await?;
    let meta = Meta::total(products.len() as i64);
    Ok(Json(ApiResponse::success(Some(products), None, Some(meta))))
}

/// Featured products, paginated
#[utoipa::path(
    get,
    path = "/api/products/featured",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of featured products", body = ApiResponse<Vec<ProductResponseDto>>),
    ),
    tag = "products"
)]
pub async fn featured_products(
    State(service): State<Arc<ProductService>>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let (products, meta) = service.featured(&query).await?;
    Ok(Json(ApiResponse::success(Some(products), None, Some(meta))))
}

/// Search products by name, paginated
#[utoipa::path(
    get,
    path = "/api/products/search",
    params(SearchProductsQuery),
    responses(
        (status = 200, description = "Page of matching products", body = ApiResponse<Vec<ProductResponseDto>>),
        (status = 400, description = "Missing search term")
    ),
    tag = "products"
)]
pub async fn search_products(
    State(service): State<Arc<ProductService>>,
    AppQuery(query): AppQuery<SearchProductsQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let (products, meta) = service
        .search(query.name.as_deref(), &query.pagination())
        .await?;
    Ok(Json(ApiResponse::success(Some(products), None, Some(meta))))
}

/// Get product by id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<ProductResponseDto>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(service): State<Arc<ProductService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let product = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(product), None, None)))
}

/// Get product by slug, with related products from the same category
#[utoipa::path(
    get,
    path = "/api/products/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<ProductWithRelatedDto>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product_by_slug(
    State(service): State<Arc<ProductService>>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<ApiResponse<ProductWithRelatedDto>>> {
    let product = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(Some(product), None, None)))
}

/// Update a product
///
/// Only fields present in the form are changed; `false` and `0` are applied.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product id")
    ),
    request_body(content = ProductFormDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Validation error, duplicate name or unknown category"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Image storage failed")
    ),
    tag = "products"
)]
pub async fn update_product(
    State(service): State<Arc<ProductService>>,
    AppPath(id): AppPath<Uuid>,
    mut form: CatalogueForm,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let dto = UpdateProductDto::try_from(&form)?;
    let product = service.update(id, dto, form.image.take()).await?;
    Ok(Json(ApiResponse::success(
        Some(product),
        Some("Product updated".to_string()),
        None,
    )))
}

/// Delete a product and its image
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<DeleteProductResponseDto>),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Image could not be released; product kept")
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(service): State<Arc<ProductService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<DeleteProductResponseDto>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        Some(DeleteProductResponseDto { deleted: true }),
        Some("Product deleted".to_string()),
        None,
    )))
}
