use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::products::models::{NewProduct, Product, ProductChanges, ProductFilter};
use crate::shared::types::PaginationQuery;

/// Persistence for products
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: NewProduct) -> Result<Product>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>>;
    /// Matching products in creation order; all of them when `page` is `None`
    async fn list(
        &self,
        filter: &ProductFilter,
        page: Option<&PaginationQuery>,
    ) -> Result<Vec<Product>>;
    async fn count(&self, filter: &ProductFilter) -> Result<i64>;
    /// Returns `None` when no product has this id
    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>>;
    /// Returns `false` when no product has this id
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

const PRODUCT_COLUMNS: &str = r#"
    id, name, slug, description, image_url, image_key,
    regular_price, sale_price, is_on_sale, is_b_seller, is_new_product, is_featured,
    category_id, created_at, updated_at
"#;

/// Escape LIKE metacharacters so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if filter.is_new_product {
        qb.push(" AND is_new_product");
    }
    if filter.is_b_seller {
        qb.push(" AND is_b_seller");
    }
    if filter.is_featured {
        qb.push(" AND is_featured");
    }
    if filter.is_on_sale {
        qb.push(" AND is_on_sale");
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(exclude_id) = filter.exclude_id {
        qb.push(" AND id <> ").push_bind(exclude_id);
    }
    if let Some(term) = &filter.name_contains {
        qb.push(" AND name ILIKE '%' || ")
            .push_bind(escape_like(term))
            .push(" || '%'");
    }
}

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let query = format!(
            r#"
            INSERT INTO products (
                id, name, slug, description, image_url, image_key,
                regular_price, sale_price, is_on_sale, is_b_seller, is_new_product, is_featured,
                category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(Uuid::now_v7())
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(&product.image.url)
            .bind(&product.image.key)
            .bind(product.regular_price)
            .bind(product.sale_price)
            .bind(product.is_on_sale)
            .bind(product.is_b_seller)
            .bind(product.is_new_product)
            .bind(product.is_featured)
            .bind(product.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "product"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get product by id: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE slug = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get product by slug: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: Option<&PaginationQuery>,
    ) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PRODUCT_COLUMNS).push(" FROM products");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at, id");

        if let Some(page) = page {
            qb.push(" LIMIT ").push_bind(page.limit());
            qb.push(" OFFSET ").push_bind(page.offset());
        }

        qb.build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list products: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut qb, filter);

        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count products: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(total)
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(slug) = &changes.slug {
            qb.push(", slug = ").push_bind(slug);
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(image) = &changes.image {
            qb.push(", image_url = ").push_bind(&image.url);
            qb.push(", image_key = ").push_bind(&image.key);
        }
        if let Some(regular_price) = changes.regular_price {
            qb.push(", regular_price = ").push_bind(regular_price);
        }
        if let Some(sale_price) = changes.sale_price {
            qb.push(", sale_price = ").push_bind(sale_price);
        }
        if let Some(is_on_sale) = changes.is_on_sale {
            qb.push(", is_on_sale = ").push_bind(is_on_sale);
        }
        if let Some(is_b_seller) = changes.is_b_seller {
            qb.push(", is_b_seller = ").push_bind(is_b_seller);
        }
        if let Some(is_new_product) = changes.is_new_product {
            qb.push(", is_new_product = ").push_bind(is_new_product);
        }
        if let Some(is_featured) = changes.is_featured {
            qb.push(", is_featured = ").push_bind(is_featured);
        }
        if let Some(category_id) = changes.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(PRODUCT_COLUMNS);

        qb.build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "product"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
