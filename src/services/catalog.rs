use crate::{
    db::DbPool,
    entities::{
        ordered_item,
        product::{self, ActiveModel as ProductActiveModel, Model as ProductModel},
        OrderedItem as OrderedItemEntity, Product as ProductEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::images::ImageStore,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 2, max = 255, message = "Product name must be 2-255 characters"))]
    pub name: String,
    pub price_per_kg: Decimal,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update; only the supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 2, max = 255, message = "Product name must be 2-255 characters"))]
    pub name: Option<String>,
    pub price_per_kg: Option<Decimal>,
    pub in_stock: Option<bool>,
    #[validate(length(min = 1, message = "Image must not be blank"))]
    pub image: Option<String>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price_per_kg.is_none()
            && self.in_stock.is_none()
            && self.image.is_none()
    }
}

/// Catalog management: product CRUD plus image bookkeeping.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    images: ImageStore,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, images: ImageStore, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db,
            images,
            event_sender,
        }
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.images
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.price_per_kg <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price per kg must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let product = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            image: Set(request.image),
            price_per_kg: Set(request.price_per_kg),
            in_stock: Set(request.in_stock.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %product.id, "Product created");
        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::ProductCreated(product.id)).await;
        }

        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::ProductNotFound(product_id))
    }

    /// Lists the catalog, newest products first.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        let products = ProductEntity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    /// Applies a partial update. A request with no fields set is rejected
    /// rather than silently succeeding.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        if request.is_empty() {
            return Err(ServiceError::ValidationError(
                "Update request must change at least one field".to_string(),
            ));
        }
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if let Some(price) = request.price_per_kg {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price per kg must be positive".to_string(),
                ));
            }
        }

        let product = self.get_product(product_id).await?;
        let old_image = product.image.clone();
        let mut active: ProductActiveModel = product.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(price) = request.price_per_kg {
            active.price_per_kg = Set(price);
        }
        if let Some(in_stock) = request.in_stock {
            active.in_stock = Set(in_stock);
        }
        let image_changed = request.image.is_some();
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        if image_changed {
            if let Some(old) = old_image {
                self.images.delete_if_owned(&old).await;
            }
        }

        info!(product_id = %product_id, "Product updated");
        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::ProductUpdated(product_id)).await;
        }

        Ok(updated)
    }

    /// Replaces the product's image, removing the previously stored file.
    #[instrument(skip(self, bytes), fields(product_id = %product_id, content_type = %content_type))]
    pub async fn set_product_image(
        &self,
        product_id: Uuid,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<ProductModel, ServiceError> {
        let product = self.get_product(product_id).await?;
        let old_image = product.image.clone();

        let public_path = self.images.save(content_type, bytes).await?;

        let mut active: ProductActiveModel = product.into();
        active.image = Set(Some(public_path));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        if let Some(old) = old_image {
            self.images.delete_if_owned(&old).await;
        }

        info!(product_id = %product_id, "Product image updated");
        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::ProductUpdated(product_id)).await;
        }

        Ok(updated)
    }

    /// Deletes a product unless existing orders still reference it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(product_id).await?;

        let references = OrderedItemEntity::find()
            .filter(ordered_item::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await?;
        if references > 0 {
            warn!(product_id = %product_id, references, "Refusing to delete referenced product");
            return Err(ServiceError::Conflict(format!(
                "Product {} is referenced by existing orders",
                product_id
            )));
        }

        let image = product.image.clone();
        product.delete(&*self.db).await?;

        if let Some(image) = image {
            self.images.delete_if_owned(&image).await;
        }

        info!(product_id = %product_id, "Product deleted");
        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::ProductDeleted(product_id)).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_patch_is_detected() {
        assert!(UpdateProductRequest::default().is_empty());
        assert!(!UpdateProductRequest {
            price_per_kg: Some(dec!(4.20)),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn create_request_validates_name_length() {
        let request = CreateProductRequest {
            name: "A".to_string(),
            price_per_kg: dec!(1),
            in_stock: None,
            image: None,
        };
        assert!(request.validate().is_err());
    }
}
