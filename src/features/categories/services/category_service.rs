use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryResponseDto, CategorySummaryDto, CategoryWithProductsDto, CreateCategoryDto,
    UpdateCategoryDto,
};
use crate::features::categories::models::{CategoryChanges, NewCategory};
use crate::features::categories::repositories::CategoryRepository;
use crate::features::products::models::ProductFilter;
use crate::features::products::repositories::ProductRepository;
use crate::modules::storage::{ObjectStore, UploadedImage};
use crate::shared::constants::CATEGORY_IMAGE_FOLDER;
use crate::shared::media::{self, MediaChange};
use crate::shared::slug::derive_slug;
use crate::shared::validation::normalize_optional;

/// Service for category operations
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    store: Arc<dyn ObjectStore>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            categories,
            products,
            store,
        }
    }

    fn not_found(id: impl std::fmt::Display) -> AppError {
        AppError::NotFound(format!("Category '{}' not found", id))
    }

    /// Create a category, uploading its image first and releasing it again if
    /// the insert fails
    pub async fn create(
        &self,
        dto: CreateCategoryDto,
        image: Option<UploadedImage>,
    ) -> Result<CategoryResponseDto> {
        dto.validate()?;
        let image = image
            .ok_or_else(|| AppError::Validation("image: image is required".to_string()))?;

        let stored = self.store.upload(CATEGORY_IMAGE_FOLDER, image).await?;
        let media = MediaChange::for_create(stored.clone());

        let new_category = NewCategory {
            slug: derive_slug(&dto.name),
            name: dto.name,
            description: normalize_optional(dto.description.as_deref()),
            image: stored,
            product_ids: dto.products,
        };

        match self.categories.insert(new_category).await {
            Ok(category) => {
                tracing::info!(
                    "Category created: id={}, slug={}",
                    category.id,
                    category.slug
                );
                Ok(category.into())
            }
            Err(e) => Err(media.rollback(self.store.as_ref(), e).await),
        }
    }

    /// List all categories
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.categories.list().await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// Get category by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.categories
            .find_by_id(id)
            .await?
            .map(|c| c.into())
            .ok_or_else(|| Self::not_found(id))
    }

    /// Get category by slug together with its products
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryWithProductsDto> {
        let category = self
            .categories
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| Self::not_found(slug))?;

        let filter = ProductFilter {
            category_id: Some(category.id),
            ..Default::default()
        };
        let products = self.products.list(&filter, None).await?;

        Ok(CategoryWithProductsDto {
            category: CategorySummaryDto {
                id: category.id,
                name: category.name,
                slug: category.slug,
            },
            products: products.into_iter().map(|p| p.into()).collect(),
        })
    }

    /// Apply a partial update. A new image replaces the old one, which is
    /// released only after the update is saved.
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateCategoryDto,
        image: Option<UploadedImage>,
    ) -> Result<CategoryResponseDto> {
        dto.validate()?;

        let existing = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let uploaded = match image {
            Some(image) => Some(self.store.upload(CATEGORY_IMAGE_FOLDER, image).await?),
            None => None,
        };
        let media = MediaChange::for_update(existing.image(), uploaded.clone());

        let changes = CategoryChanges {
            slug: dto.name.as_deref().map(derive_slug),
            name: dto.name,
            description: dto
                .description
                .as_deref()
                .map(|d| normalize_optional(Some(d))),
            image: uploaded,
            product_ids: dto.products,
        };

        let category = match self.categories.update(id, changes).await {
            Ok(Some(category)) => category,
            Ok(None) => return Err(media.rollback(self.store.as_ref(), Self::not_found(id)).await),
            Err(e) => return Err(media.rollback(self.store.as_ref(), e).await),
        };

        media.commit(self.store.as_ref()).await?;

        tracing::info!("Category updated: id={}, slug={}", category.id, category.slug);
        Ok(category.into())
    }

    /// Delete a category after releasing its image. If the image cannot be
    /// released the category is kept.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        media::release(self.store.as_ref(), &existing.image_key).await?;

        if !self.categories.delete(id).await? {
            return Err(Self::not_found(id));
        }

        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }
}
