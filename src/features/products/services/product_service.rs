use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::products::dtos::{
    CreateProductDto, ProductResponseDto, ProductWithRelatedDto, UpdateProductDto,
};
use crate::features::products::models::{NewProduct, ProductChanges, ProductFilter};
use crate::features::products::repositories::ProductRepository;
use crate::modules::storage::{ObjectStore, UploadedImage};
use crate::shared::constants::PRODUCT_IMAGE_FOLDER;
use crate::shared::media::{self, MediaChange};
use crate::shared::slug::derive_slug;
use crate::shared::types::{Meta, PaginationQuery};
use crate::shared::validation::normalize_optional;

/// Service for product operations
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    store: Arc<dyn ObjectStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { products, store }
    }

    fn not_found(id: impl std::fmt::Display) -> AppError {
        AppError::NotFound(format!("Product '{}' not found", id))
    }

    /// Create a product, uploading its image first and releasing it again if
    /// the insert fails
    pub async fn create(
        &self,
        dto: CreateProductDto,
        image: Option<UploadedImage>,
    ) -> Result<ProductResponseDto> {
        dto.validate()?;
        let image = image
            .ok_or_else(|| AppError::Validation("image: image is required".to_string()))?;

        let stored = self.store.upload(PRODUCT_IMAGE_FOLDER, image).await?;
        let media = MediaChange::for_create(stored.clone());

        let new_product = NewProduct {
            slug: derive_slug(&dto.name),
            name: dto.name,
            description: normalize_optional(dto.description.as_deref()),
            image: stored,
            regular_price: dto.regular_price,
            sale_price: dto.sale_price,
            is_on_sale: dto.is_on_sale,
            is_b_seller: dto.is_b_seller,
            is_new_product: dto.is_new_product,
            is_featured: dto.is_featured,
            category_id: dto.category,
        };

        match self.products.insert(new_product).await {
            Ok(product) => {
                tracing::info!("Product created: id={}, slug={}", product.id, product.slug);
                Ok(product.into())
            }
            Err(e) => Err(media.rollback(self.store.as_ref(), e).await),
        }
    }

    /// List all products
    pub async fn list(&self) -> Result<Vec<ProductResponseDto>> {
        self.filter(&ProductFilter::default()).await
    }

    /// List products matching every enabled condition of `filter`
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<ProductResponseDto>> {
        let products = self.products.list(filter, None).await?;
        Ok(products.into_iter().map(|p| p.into()).collect())
    }

    /// One page of matching products plus pagination meta
    async fn paginate(
        &self,
        filter: &ProductFilter,
        query: &PaginationQuery,
    ) -> Result<(Vec<ProductResponseDto>, Meta)> {
        let total = self.products.count(filter).await?;
        let products = self.products.list(filter, Some(query)).await?;
        Ok((
            products.into_iter().map(|p| p.into()).collect(),
            Meta::paginated(query, total),
        ))
    }

    /// Featured products, paginated
    pub async fn featured(
        &self,
        query: &PaginationQuery,
    ) -> Result<(Vec<ProductResponseDto>, Meta)> {
        self.paginate(&ProductFilter::featured(), query).await
    }

    /// Case-insensitive name search, paginated
    pub async fn search(
        &self,
        name: Option<&str>,
        query: &PaginationQuery,
    ) -> Result<(Vec<ProductResponseDto>, Meta)> {
        let term = name.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
            AppError::Validation("name: search term is required".to_string())
        })?;

        self.paginate(&ProductFilter::name_contains(term), query)
            .await
    }

    /// Get product by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<ProductResponseDto> {
        self.products
            .find_by_id(id)
            .await?
            .map(|p| p.into())
            .ok_or_else(|| Self::not_found(id))
    }

    /// Get product by slug together with the other products of its category
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductWithRelatedDto> {
        let product = self
            .products
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| Self::not_found(slug))?;

        let related = match product.category_id {
            Some(category_id) => {
                let filter = ProductFilter::related_to(product.id, category_id);
                self.products.list(&filter, None).await?
            }
            None => Vec::new(),
        };

        Ok(ProductWithRelatedDto {
            product: product.into(),
            related_products: related.into_iter().map(|p| p.into()).collect(),
        })
    }

    /// Apply a partial update. A new image replaces the old one, which is
    /// released only after the update is saved.
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateProductDto,
        image: Option<UploadedImage>,
    ) -> Result<ProductResponseDto> {
        dto.validate()?;

        let existing = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let uploaded = match image {
            Some(image) => Some(self.store.upload(PRODUCT_IMAGE_FOLDER, image).await?),
            None => None,
        };
        let media = MediaChange::for_update(existing.image(), uploaded.clone());

        let changes = ProductChanges {
            slug: dto.name.as_deref().map(derive_slug),
            name: dto.name,
            description: dto
                .description
                .as_deref()
                .map(|d| normalize_optional(Some(d))),
            image: uploaded,
            regular_price: dto.regular_price,
            sale_price: dto.sale_price,
            is_on_sale: dto.is_on_sale,
            is_b_seller: dto.is_b_seller,
            is_new_product: dto.is_new_product,
            is_featured: dto.is_featured,
            category_id: dto.category,
        };

        let product = match self.products.update(id, changes).await {
            Ok(Some(product)) => product,
            Ok(None) => return Err(media.rollback(self.store.as_ref(), Self::not_found(id)).await),
            Err(e) => return Err(media.rollback(self.store.as_ref(), e).await),
        };

        media.commit(self.store.as_ref()).await?;

        tracing::info!("Product updated: id={}, slug={}", product.id, product.slug);
        Ok(product.into())
    }

    /// Delete a product after releasing its image. If the image cannot be
    /// released the product is kept.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        media::release(self.store.as_ref(), &existing.image_key).await?;

        if !self.products.delete(id).await? {
            return Err(Self::not_found(id));
        }

        tracing::info!("Product deleted: id={}", id);
        Ok(())
    }
}
