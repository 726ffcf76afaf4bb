use std::sync::Arc;

use axum::Router;

pub mod categories;
pub mod orders;
pub mod products;

/// All catalogue and checkout routes
pub fn routes(
    category_service: Arc<categories::CategoryService>,
    product_service: Arc<products::ProductService>,
    order_service: Arc<orders::OrderService>,
) -> Router {
    Router::new()
        .merge(categories::routes(category_service))
        .merge(products::routes(product_service))
        .merge(orders::routes(order_service))
}
