use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;
use crate::modules::storage::MAX_IMAGE_SIZE;

/// Create routes for the categories feature
///
/// Note: This feature is public (no authentication required)
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/api/categories/categories/{slug}",
            get(handlers::get_category_by_slug),
        )
        // Image size plus room for the multipart envelope
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm;
    use serde_json::Value;

    use crate::shared::test_helpers::{image_part, TestApp};

    #[tokio::test]
    async fn test_create_category_returns_201_with_slug() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/categories")
            .multipart(
                MultipartForm::new()
                    .add_text("name", "Blue Chair!!")
                    .add_text("description", "Seating")
                    .add_part("image", image_part()),
            )
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["slug"], "blue-chair");
        assert_eq!(body["data"]["description"], "Seating");
    }

    #[tokio::test]
    async fn test_create_category_without_name_is_400() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/categories")
            .multipart(MultipartForm::new().add_part("image", image_part()))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(app.store.uploaded().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_category_name_is_400() {
        let app = TestApp::new();
        app.create_category("Lamps").await;

        let response = app
            .server
            .post("/api/categories")
            .multipart(
                MultipartForm::new()
                    .add_text("name", "Lamps")
                    .add_part("image", image_part()),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(app.store.destroyed().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_id_is_404() {
        let app = TestApp::new();

        let response = app
            .server
            .get(&format!("/api/categories/{}", uuid::Uuid::now_v7()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_category_id_is_400_envelope() {
        let app = TestApp::new();

        let response = app.server.get("/api/categories/not-a-uuid").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_get_by_slug_populates_products() {
        let app = TestApp::new();
        let category = app.create_category("Living Room").await;
        let product = app.create_product("Sofa", Some(&category)).await;
        app.create_product("Desk", None).await;

        let response = app.server.get("/api/categories/categories/living-room").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["category"]["name"], "Living Room");
        let products = body["data"]["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["id"], product);
    }

    #[tokio::test]
    async fn test_update_category_assigns_products() {
        let app = TestApp::new();
        let category = app.create_category("Kitchen").await;
        let product = app.create_product("Kettle", None).await;

        let response = app
            .server
            .put(&format!("/api/categories/{}", category))
            .multipart(MultipartForm::new().add_text("products", &product))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["products"][0], product);
        assert_eq!(body["data"]["slug"], "kitchen");
    }

    #[tokio::test]
    async fn test_delete_category_clears_product_reference() {
        let app = TestApp::new();
        let category = app.create_category("Garden").await;
        let product = app.create_product("Hose", Some(&category)).await;

        let response = app
            .server
            .delete(&format!("/api/categories/{}", category))
            .await;
        response.assert_status_ok();

        let response = app.server.get(&format!("/api/products/{}", product)).await;
        let body: Value = response.json();
        assert_eq!(body["data"]["category"], Value::Null);
    }

    #[tokio::test]
    async fn test_delete_category_with_failing_store_is_500_and_keeps_record() {
        let app = TestApp::new();
        let category = app.create_category("Garden").await;
        app.store.fail_destroy(true);

        let response = app
            .server
            .delete(&format!("/api/categories/{}", category))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        app.server
            .get(&format!("/api/categories/{}", category))
            .await
            .assert_status_ok();
    }
}
