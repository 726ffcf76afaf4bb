//! In-memory stand-ins for the database, object store and payment provider

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::config::StripeConfig;
use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryChanges, NewCategory};
use crate::features::categories::{CategoryRepository, CategoryService};
use crate::features::orders::OrderService;
use crate::features::products::models::{NewProduct, Product, ProductChanges, ProductFilter};
use crate::features::products::{ProductRepository, ProductService};
use crate::modules::payments::{CheckoutProvider, CheckoutSessionRequest};
use crate::modules::storage::{ObjectStore, StoredImage, UploadedImage};
use crate::shared::slug::derive_slug;
use crate::shared::types::PaginationQuery;

/// 1x1 transparent PNG
const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn sample_image() -> UploadedImage {
    UploadedImage {
        data: PNG_PIXEL.to_vec(),
        file_name: "pixel.png".to_string(),
        content_type: "image/png".to_string(),
    }
}

pub fn image_part() -> Part {
    Part::bytes(PNG_PIXEL.to_vec())
        .file_name("pixel.png")
        .mime_type("image/png")
}

pub fn stripe_config() -> StripeConfig {
    StripeConfig {
        secret_key: "sk_test_123".to_string(),
        api_base: "http://stripe.test".to_string(),
        client_url: "http://shop.test/".to_string(),
        currency: "php".to_string(),
        allowed_countries: vec!["PH".to_string(), "US".to_string(), "GB".to_string()],
    }
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Object store that keeps keys in memory and can be told to fail
#[derive(Default)]
pub struct RecordingObjectStore {
    counter: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
    destroyed: Mutex<Vec<String>>,
    fail_upload: AtomicBool,
    fail_destroy: AtomicBool,
}

impl RecordingObjectStore {
    /// Keys of every successful upload, in order
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    /// Keys of every successful destroy, in order
    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn upload(&self, folder: &str, image: UploadedImage) -> Result<StoredImage> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(AppError::Storage("upload refused".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let key = format!("test/{}/{}.{}", folder, n, image.extension());
        self.uploaded.lock().unwrap().push(key.clone());

        Ok(StoredImage {
            url: format!("http://storage.test/images/{}", key),
            key,
        })
    }

    async fn destroy(&self, key: &str) -> Result<()> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("destroy refused for '{}'", key)));
        }

        self.destroyed.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

// =============================================================================
// CHECKOUT
// =============================================================================

/// Checkout provider that records requests and answers with a fixed session
#[derive(Default)]
pub struct RecordingCheckout {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    failure: Option<String>,
}

impl RecordingCheckout {
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckoutProvider for RecordingCheckout {
    async fn create_session(&self, request: CheckoutSessionRequest) -> Result<Value> {
        if let Some(message) = &self.failure {
            return Err(AppError::ExternalServiceError(message.clone()));
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        Ok(json!({
            "id": format!("cs_test_{}", requests.len()),
            "object": "checkout.session",
            "url": "https://checkout.stripe.test/pay",
        }))
    }
}

// =============================================================================
// CATALOGUE
// =============================================================================

#[derive(Default)]
struct CatalogueState {
    categories: Vec<Category>,
    products: Vec<Product>,
}

impl CatalogueState {
    fn with_product_ids(&self, mut category: Category) -> Category {
        category.product_ids = self
            .products
            .iter()
            .filter(|p| p.category_id == Some(category.id))
            .map(|p| p.id)
            .collect();
        category
    }

    fn check_category_unique(&self, name: &str, slug: &str, except: Option<Uuid>) -> Result<()> {
        let others = self.categories.iter().filter(|c| Some(c.id) != except);
        for other in others {
            if other.name == name {
                return Err(AppError::Conflict(
                    "A category with this name already exists".to_string(),
                ));
            }
            if other.slug == slug {
                return Err(AppError::Conflict(
                    "A category with this slug already exists".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_product_unique(&self, name: &str, slug: &str, except: Option<Uuid>) -> Result<()> {
        let others = self.products.iter().filter(|p| Some(p.id) != except);
        for other in others {
            if other.name == name {
                return Err(AppError::Conflict(
                    "A product with this name already exists".to_string(),
                ));
            }
            if other.slug == slug {
                return Err(AppError::Conflict(
                    "A product with this slug already exists".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_category_exists(&self, id: Option<Uuid>) -> Result<()> {
        match id {
            Some(id) if !self.categories.iter().any(|c| c.id == id) => Err(AppError::BadRequest(
                "Referenced record does not exist".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn assign_products(&mut self, category_id: Uuid, product_ids: &[Uuid]) -> Result<()> {
        if product_ids
            .iter()
            .any(|id| !self.products.iter().any(|p| p.id == *id))
        {
            return Err(AppError::BadRequest(
                "products contains ids that do not exist".to_string(),
            ));
        }

        for product in self.products.iter_mut() {
            if product_ids.contains(&product.id) {
                product.category_id = Some(category_id);
            }
        }
        Ok(())
    }
}

/// Both repositories over one shared in-memory state, with the same
/// uniqueness and reference rules as the schema
#[derive(Default)]
pub struct InMemoryCatalogue {
    state: Mutex<CatalogueState>,
}

impl InMemoryCatalogue {
    pub fn category_count(&self) -> usize {
        self.state.lock().unwrap().categories.len()
    }

    pub fn category(&self, id: Uuid) -> Option<Category> {
        let state = self.state.lock().unwrap();
        state
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| state.with_product_ids(c))
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        let state = self.state.lock().unwrap();
        state.products.iter().find(|p| p.id == id).cloned()
    }

    /// Insert a category directly, bypassing the service
    pub fn seed_category(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let category = Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            slug: derive_slug(name),
            description: None,
            image_url: format!("http://storage.test/images/seed/{}.png", name),
            image_key: format!("seed/{}.png", name),
            product_ids: vec![],
            created_at: now,
            updated_at: now,
        };
        let id = category.id;
        self.state.lock().unwrap().categories.push(category);
        id
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalogue {
    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let mut state = self.state.lock().unwrap();
        state.check_category_unique(&category.name, &category.slug, None)?;

        let now = Utc::now();
        let id = Uuid::now_v7();
        // Validate product ids before anything is stored
        if category
            .product_ids
            .iter()
            .any(|pid| !state.products.iter().any(|p| p.id == *pid))
        {
            return Err(AppError::BadRequest(
                "products contains ids that do not exist".to_string(),
            ));
        }

        state.categories.push(Category {
            id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            image_url: category.image.url,
            image_key: category.image.key,
            product_ids: vec![],
            created_at: now,
            updated_at: now,
        });
        state.assign_products(id, &category.product_ids)?;

        let stored = state.categories[state.categories.len() - 1].clone();
        Ok(state.with_product_ids(stored))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.category(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .map(|c| state.with_product_ids(c)))
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .cloned()
            .map(|c| state.with_product_ids(c))
            .collect())
    }

    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>> {
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.categories.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let mut updated = state.categories[index].clone();
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(slug) = changes.slug {
            updated.slug = slug;
        }
        if let Some(description) = changes.description {
            updated.description = description;
        }
        if let Some(image) = changes.image {
            updated.image_url = image.url;
            updated.image_key = image.key;
        }
        updated.updated_at = Utc::now();

        state.check_category_unique(&updated.name, &updated.slug, Some(id))?;

        if let Some(product_ids) = &changes.product_ids {
            if product_ids
                .iter()
                .any(|pid| !state.products.iter().any(|p| p.id == *pid))
            {
                return Err(AppError::BadRequest(
                    "products contains ids that do not exist".to_string(),
                ));
            }
            for product in state.products.iter_mut() {
                if product.category_id == Some(id) && !product_ids.contains(&product.id) {
                    product.category_id = None;
                }
            }
            state.assign_products(id, product_ids)?;
        }

        state.categories[index] = updated.clone();
        Ok(Some(state.with_product_ids(updated)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        if state.categories.len() == before {
            return Ok(false);
        }

        for product in state.products.iter_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalogue {
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.lock().unwrap();
        state.check_product_unique(&product.name, &product.slug, None)?;
        state.check_category_exists(product.category_id)?;

        let now = Utc::now();
        let stored = Product {
            id: Uuid::now_v7(),
            name: product.name,
            slug: product.slug,
            description: product.description,
            image_url: product.image.url,
            image_key: product.image.key,
            regular_price: product.regular_price,
            sale_price: product.sale_price,
            is_on_sale: product.is_on_sale,
            is_b_seller: product.is_b_seller,
            is_new_product: product.is_new_product,
            is_featured: product.is_featured,
            category_id: product.category_id,
            created_at: now,
            updated_at: now,
        };
        state.products.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.product(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: Option<&PaginationQuery>,
    ) -> Result<Vec<Product>> {
        let state = self.state.lock().unwrap();
        let matching = state.products.iter().filter(|p| filter.matches(p)).cloned();

        Ok(match page {
            Some(page) => matching
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            None => matching.collect(),
        })
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().filter(|p| filter.matches(p)).count() as i64)
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>> {
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let mut updated = state.products[index].clone();
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(slug) = changes.slug {
            updated.slug = slug;
        }
        if let Some(description) = changes.description {
            updated.description = description;
        }
        if let Some(image) = changes.image {
            updated.image_url = image.url;
            updated.image_key = image.key;
        }
        if let Some(regular_price) = changes.regular_price {
            updated.regular_price = regular_price;
        }
        if let Some(sale_price) = changes.sale_price {
            updated.sale_price = sale_price;
        }
        if let Some(is_on_sale) = changes.is_on_sale {
            updated.is_on_sale = is_on_sale;
        }
        if let Some(is_b_seller) = changes.is_b_seller {
            updated.is_b_seller = is_b_seller;
        }
        if let Some(is_new_product) = changes.is_new_product {
            updated.is_new_product = is_new_product;
        }
        if let Some(is_featured) = changes.is_featured {
            updated.is_featured = is_featured;
        }
        if let Some(category_id) = changes.category_id {
            updated.category_id = category_id;
        }
        updated.updated_at = Utc::now();

        state.check_product_unique(&updated.name, &updated.slug, Some(id))?;
        state.check_category_exists(updated.category_id)?;

        state.products[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() < before)
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// The API routes wired to in-memory collaborators
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<RecordingObjectStore>,
    pub checkout: Arc<RecordingCheckout>,
}

impl TestApp {
    pub fn new() -> Self {
        let catalogue = Arc::new(InMemoryCatalogue::default());
        let store = Arc::new(RecordingObjectStore::default());
        let checkout = Arc::new(RecordingCheckout::default());

        let category_service = Arc::new(CategoryService::new(
            catalogue.clone(),
            catalogue.clone(),
            store.clone(),
        ));
        let product_service = Arc::new(ProductService::new(catalogue.clone(), store.clone()));
        let order_service = Arc::new(OrderService::new(checkout.clone(), &stripe_config()));

        let app = crate::features::routes(category_service, product_service, order_service);
        let server = TestServer::new(app).unwrap();

        Self {
            server,
            store,
            checkout,
        }
    }

    /// Create a category through the API and return its id
    pub async fn create_category(&self, name: &str) -> String {
        let response = self
            .server
            .post("/api/categories")
            .multipart(
                MultipartForm::new()
                    .add_text("name", name)
                    .add_part("image", image_part()),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a product through the API and return its id
    pub async fn create_product(&self, name: &str, category: Option<&String>) -> String {
        match category {
            Some(category) => {
                self.create_product_with(name, &[("category", category.as_str())])
                    .await
            }
            None => self.create_product_with(name, &[]).await,
        }
    }

    /// Create a product with extra form fields and return its id
    pub async fn create_product_with(&self, name: &str, fields: &[(&str, &str)]) -> String {
        let mut form = MultipartForm::new()
            .add_text("name", name)
            .add_text("regularPrice", "10");
        for (field, value) in fields {
            form = form.add_text(field.to_string(), value.to_string());
        }

        let response = self
            .server
            .post("/api/products")
            .multipart(form.add_part("image", image_part()))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
