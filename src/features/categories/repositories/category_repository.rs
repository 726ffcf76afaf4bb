use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::categories::models::{Category, CategoryChanges, NewCategory};

/// Persistence for categories
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: NewCategory) -> Result<Category>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    async fn list(&self) -> Result<Vec<Category>>;
    /// Returns `None` when no category has this id
    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>>;
    /// Returns `false` when no category has this id
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

const SELECT_CATEGORY: &str = r#"
    SELECT c.id, c.name, c.slug, c.description, c.image_url, c.image_key,
           COALESCE(
               array_agg(p.id ORDER BY p.created_at) FILTER (WHERE p.id IS NOT NULL),
               '{}'
           ) AS product_ids,
           c.created_at, c.updated_at
    FROM categories c
    LEFT JOIN products p ON p.category_id = c.id
"#;

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Point the given products at `category_id`, failing on unknown ids
    async fn assign_products(
        tx: &mut Transaction<'_, Postgres>,
        category_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<()> {
        if product_ids.is_empty() {
            return Ok(());
        }

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET category_id = $1, updated_at = NOW()
            WHERE id = ANY($2)
            "#,
        )
        .bind(category_id)
        .bind(product_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| handle_db_error(e, "category"))?
        .rows_affected();

        if updated != product_ids.len() as u64 {
            return Err(AppError::BadRequest(
                "products contains ids that do not exist".to_string(),
            ));
        }

        Ok(())
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Option<Category>> {
        let query = format!("{} WHERE c.id = $1 GROUP BY c.id", SELECT_CATEGORY);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by id: {:?}", e);
                AppError::Database(e)
            })
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO categories (id, name, slug, description, image_url, image_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image.url)
        .bind(&category.image.key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| handle_db_error(e, "category"))?;

        Self::assign_products(&mut tx, id, &category.product_ids).await?;

        tx.commit().await?;

        self.fetch_one(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Category {} vanished after insert", id)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        self.fetch_one(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let query = format!("{} WHERE c.slug = $1 GROUP BY c.id", SELECT_CATEGORY);
        sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by slug: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let query = format!(
            "{} GROUP BY c.id ORDER BY c.created_at, c.id",
            SELECT_CATEGORY
        );
        sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
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
        qb.push(" WHERE id = ").push_bind(id);

        let updated = qb
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| handle_db_error(e, "category"))?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        if let Some(product_ids) = &changes.product_ids {
            sqlx::query(
                r#"
                UPDATE products
                SET category_id = NULL, updated_at = NOW()
                WHERE category_id = $1 AND NOT (id = ANY($2))
                "#,
            )
            .bind(id)
            .bind(product_ids)
            .execute(&mut *tx)
            .await?;

            Self::assign_products(&mut tx, id, product_ids).await?;
        }

        tx.commit().await?;

        self.fetch_one(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // products.category_id is ON DELETE SET NULL
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
