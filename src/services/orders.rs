use crate::{
    db::DbPool,
    entities::{
        order::{self, ActiveModel as OrderActiveModel, Model as OrderModel, OrderStatus},
        ordered_item::{self, ActiveModel as OrderedItemActiveModel, Model as OrderedItemModel},
        product, Order as OrderEntity, OrderedItem as OrderedItemEntity, Product as ProductEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the order service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub address: String,
    pub phone_number: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity_in_kg: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderedItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderedItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity_in_kg: Decimal,
}

/// Prices an order against the catalog snapshot from a single bulk lookup.
///
/// Items are checked in input order so the first invalid line determines the
/// reported error, and every line is validated before anything is persisted.
fn price_items(
    items: &[OrderItemInput],
    products: &HashMap<Uuid, product::Model>,
) -> Result<Decimal, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut total = Decimal::ZERO;
    for item in items {
        if item.quantity_in_kg <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Quantity for product {} must be positive",
                item.product_id
            )));
        }

        let product = products
            .get(&item.product_id)
            .ok_or(ServiceError::ProductNotFound(item.product_id))?;

        if !product.in_stock {
            return Err(ServiceError::ProductOutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        // Absurd quantities can overflow Decimal; treat that as bad input
        // rather than letting the arithmetic panic.
        total = item
            .quantity_in_kg
            .checked_mul(product.price_per_kg)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Order total is too large for product {}",
                    item.product_id
                ))
            })?;
    }

    Ok(total)
}

/// Order placement engine.
///
/// Holds the shared connection pool; every `create_order` call opens exactly
/// one transaction and commits or rolls it back as a unit.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order: validates every line against the live catalog,
    /// computes the total from the creation-time price snapshot, and persists
    /// the order with its items atomically.
    ///
    /// On any validation failure nothing is written; on a storage failure the
    /// transaction rolls back entirely and the caller may retry the whole
    /// call (a fresh id is assigned per call, retries are not deduplicated).
    #[instrument(skip(self, request), fields(customer = %request.name, item_count = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order placement");
            ServiceError::DatabaseError(e)
        })?;

        // One bulk catalog fetch for the distinct ids; missing ids are simply
        // absent from the map.
        let mut ids: Vec<Uuid> = request.items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products: HashMap<Uuid, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // All lines validated before any row is written; an error here drops
        // the transaction, which rolls it back.
        let total = price_items(&request.items, &products)?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let order_model = OrderActiveModel {
            id: Set(order_id),
            name: Set(request.name.clone()),
            address: Set(request.address.clone()),
            phone_number: Set(request.phone_number.clone()),
            total_price: Set(total),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut item_models = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let persisted = OrderedItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity_in_kg: Set(item.quantity_in_kg),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, product_id = %item.product_id, "Failed to insert order line");
                ServiceError::DatabaseError(e)
            })?;
            item_models.push(persisted);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order placement transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %total, "Order placed successfully");

        if let Some(event_sender) = &self.event_sender {
            event_sender
                .send_or_log(Event::OrderPlaced {
                    order_id,
                    customer_name: order_model.name.clone(),
                    phone_number: order_model.phone_number.clone(),
                    address: order_model.address.clone(),
                    total_price: order_model.total_price,
                })
                .await;
        }

        Ok(Self::to_response(order_model, item_models))
    }

    /// Retrieves an order with its line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let order = OrderEntity::find_by_id(order_id).one(&*self.db).await?;

        match order {
            Some(order_model) => {
                let items = order_model
                    .find_related(OrderedItemEntity)
                    .all(&*self.db)
                    .await?;
                Ok(Some(Self::to_response(order_model, items)))
            }
            None => Ok(None),
        }
    }

    /// Lists orders newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderModel>, ServiceError> {
        let orders = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    /// Updates an order's status. Transition order is not enforced here.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for status update");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;

        let old_status = order.status;

        let mut active: OrderActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(order_id = %order_id, ?old_status, ?new_status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    old_status: format!("{:?}", old_status),
                    new_status: format!("{:?}", new_status),
                })
                .await;
        }

        Ok(updated)
    }

    /// Deletes an order and its line items in one transaction.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        OrderedItemEntity::delete_many()
            .filter(ordered_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order deleted");

        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::OrderDeleted(order_id)).await;
        }

        Ok(())
    }

    fn to_response(model: OrderModel, items: Vec<OrderedItemModel>) -> OrderResponse {
        OrderResponse {
            id: model.id,
            name: model.name,
            address: model.address,
            phone_number: model.phone_number,
            total_price: model.total_price,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: items
                .into_iter()
                .map(|item| OrderedItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity_in_kg: item.quantity_in_kg,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn catalog_product(name: &str, price: Decimal, in_stock: bool) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image: None,
            price_per_kg: price,
            in_stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn as_map(products: &[product::Model]) -> HashMap<Uuid, product::Model> {
        products.iter().map(|p| (p.id, p.clone())).collect()
    }

    #[test]
    fn prices_items_against_snapshot() {
        let apples = catalog_product("Apples", dec!(10), true);
        let bananas = catalog_product("Bananas", dec!(2.50), true);
        let products = as_map(&[apples.clone(), bananas.clone()]);

        let items = vec![
            OrderItemInput {
                product_id: apples.id,
                quantity_in_kg: dec!(2),
            },
            OrderItemInput {
                product_id: bananas.id,
                quantity_in_kg: dec!(1.5),
            },
        ];

        let total = price_items(&items, &products).expect("pricing should succeed");
        assert_eq!(total, dec!(23.75));
    }

    #[test]
    fn rejects_empty_item_list() {
        let result = price_items(&[], &HashMap::new());
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let apples = catalog_product("Apples", dec!(10), true);
        let products = as_map(&[apples.clone()]);

        let items = vec![OrderItemInput {
            product_id: apples.id,
            quantity_in_kg: dec!(0),
        }];
        assert!(matches!(
            price_items(&items, &products),
            Err(ServiceError::ValidationError(_))
        ));

        let items = vec![OrderItemInput {
            product_id: apples.id,
            quantity_in_kg: dec!(-1),
        }];
        assert!(matches!(
            price_items(&items, &products),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn overflowing_total_is_a_validation_error() {
        let apples = catalog_product("Apples", dec!(10), true);
        let products = as_map(&[apples.clone()]);

        let items = vec![OrderItemInput {
            product_id: apples.id,
            quantity_in_kg: Decimal::MAX,
        }];

        assert!(matches!(
            price_items(&items, &products),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn reports_first_missing_product() {
        let apples = catalog_product("Apples", dec!(10), true);
        let products = as_map(&[apples.clone()]);
        let missing_id = Uuid::new_v4();

        let items = vec![
            OrderItemInput {
                product_id: apples.id,
                quantity_in_kg: dec!(1),
            },
            OrderItemInput {
                product_id: missing_id,
                quantity_in_kg: dec!(1),
            },
        ];

        match price_items(&items, &products) {
            Err(ServiceError::ProductNotFound(id)) => assert_eq!(id, missing_id),
            other => panic!("expected ProductNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn out_of_stock_aborts_whole_order() {
        let apples = catalog_product("Apples", dec!(10), true);
        let mangoes = catalog_product("Mangoes", dec!(5), false);
        let products = as_map(&[apples.clone(), mangoes.clone()]);

        let items = vec![
            OrderItemInput {
                product_id: apples.id,
                quantity_in_kg: dec!(2),
            },
            OrderItemInput {
                product_id: mangoes.id,
                quantity_in_kg: dec!(1),
            },
        ];

        match price_items(&items, &products) {
            Err(ServiceError::ProductOutOfStock { product_id, name }) => {
                assert_eq!(product_id, mangoes.id);
                assert_eq!(name, "Mangoes");
            }
            other => panic!("expected ProductOutOfStock, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn duplicate_product_lines_each_contribute() {
        let apples = catalog_product("Apples", dec!(10), true);
        let products = as_map(&[apples.clone()]);

        let items = vec![
            OrderItemInput {
                product_id: apples.id,
                quantity_in_kg: dec!(1),
            },
            OrderItemInput {
                product_id: apples.id,
                quantity_in_kg: dec!(0.5),
            },
        ];

        let total = price_items(&items, &products).expect("pricing should succeed");
        assert_eq!(total, dec!(15));
    }
}
