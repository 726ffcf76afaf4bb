use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::features::products::handlers;
use crate::features::products::services::ProductService;
use crate::modules::storage::MAX_IMAGE_SIZE;

/// Create routes for the products feature
///
/// Note: This feature is public (no authentication required)
pub fn routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/api/products/products", get(handlers::filter_products))
        .route(
            "/api/products/products/{slug}",
            get(handlers::get_product_by_slug),
        )
        .route("/api/products/featured", get(handlers::featured_products))
        .route("/api/products/search", get(handlers::search_products))
        .route(
            "/api/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        // Image size plus room for the multipart envelope
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024))
        .with_state(service)
}
