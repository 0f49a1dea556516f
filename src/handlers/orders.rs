use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::order::{Model as OrderModel, OrderStatus},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, validate_input},
    services::orders::{CreateOrderRequest, OrderItemInput, OrderResponse},
    AppState,
};

/// Order endpoints speak camelCase on the wire.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub address: String,
    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,
    #[serde(alias = "items")]
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub ordered_items: Vec<OrderItemBody>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemBody {
    pub product_id: Uuid,
    pub quantity_in_kg: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ordered_items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity_in_kg: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryBody {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number");
        err.message = Some("Phone number must be exactly 10 digits".into());
        Err(err)
    }
}

impl From<OrderResponse> for OrderBody {
    fn from(order: OrderResponse) -> Self {
        Self {
            id: order.id,
            name: order.name,
            address: order.address,
            phone_number: order.phone_number,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
            ordered_items: order
                .items
                .into_iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    product_id: item.product_id,
                    quantity_in_kg: item.quantity_in_kg,
                })
                .collect(),
        }
    }
}

impl From<OrderModel> for OrderSummaryBody {
    fn from(order: OrderModel) -> Self {
        Self {
            id: order.id,
            name: order.name,
            phone_number: order.phone_number,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/status", put(update_order_status))
}

async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<Response, ServiceError> {
    validate_input(&body)?;

    let request = CreateOrderRequest {
        name: body.name,
        address: body.address,
        phone_number: body.phone_number,
        items: body
            .ordered_items
            .into_iter()
            .map(|item| OrderItemInput {
                product_id: item.product_id,
                quantity_in_kg: item.quantity_in_kg,
            })
            .collect(),
    };

    let order = state.services.orders.create_order(request).await?;
    Ok(created_response(OrderBody::from(order)))
}

async fn list_orders(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let orders = state.services.orders.list_orders().await?;
    let body: Vec<OrderSummaryBody> = orders.into_iter().map(OrderSummaryBody::from).collect();
    Ok(success_response(body))
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
    Ok(success_response(OrderBody::from(order)))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusBody>,
) -> Result<Response, ServiceError> {
    let updated = state
        .services
        .orders
        .update_order_status(order_id, body.status)
        .await?;
    Ok(success_response(OrderSummaryBody::from(updated)))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.orders.delete_order(order_id).await?;
    Ok(no_content_response())
}
