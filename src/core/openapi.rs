use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::orders::{dtos as orders_dtos, handlers as orders_handlers};
use crate::features::products::{dtos as products_dtos, handlers as products_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::create_category,
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::get_category_by_slug,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Products
        products_handlers::create_product,
        products_handlers::list_products,
        products_handlers::filter_products,
        products_handlers::featured_products,
        products_handlers::search_products,
        products_handlers::get_product,
        products_handlers::get_product_by_slug,
        products_handlers::update_product,
        products_handlers::delete_product,
        // Orders
        orders_handlers::create_order,
    ),
    components(
        schemas(
            Meta,
            // Categories
            categories_dtos::CategoryFormDto,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategorySummaryDto,
            categories_dtos::CategoryWithProductsDto,
            categories_dtos::DeleteCategoryResponseDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryWithProductsDto>,
            ApiResponse<categories_dtos::DeleteCategoryResponseDto>,
            // Products
            products_dtos::ProductFormDto,
            products_dtos::ProductResponseDto,
            products_dtos::ProductWithRelatedDto,
            products_dtos::DeleteProductResponseDto,
            ApiResponse<products_dtos::ProductResponseDto>,
            ApiResponse<Vec<products_dtos::ProductResponseDto>>,
            ApiResponse<products_dtos::ProductWithRelatedDto>,
            ApiResponse<products_dtos::DeleteProductResponseDto>,
            // Orders
            orders_dtos::CartItemDto,
            orders_dtos::CreateOrderDto,
            orders_dtos::CheckoutSessionResponseDto,
            ApiResponse<orders_dtos::CheckoutSessionResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Catalogue categories (public)"),
        (name = "products", description = "Catalogue products, filters and search (public)"),
        (name = "orders", description = "Checkout sessions"),
    ),
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "API documentation for the storefront backend",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalogue_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/categories",
            "/api/categories/{id}",
            "/api/categories/categories/{slug}",
            "/api/products/products",
            "/api/products/featured",
            "/api/products/search",
            "/api/orders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Shop".to_string(),
            version: "9.9.9".to_string(),
            description: "docs".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Shop");
        assert_eq!(doc.info.version, "9.9.9");
    }
}
