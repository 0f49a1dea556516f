use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::catalog::{CreateProductRequest, UpdateProductRequest},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/image", put(update_product_image))
}

/// Fields collected from a multipart product upload.
#[derive(Default)]
struct ProductUpload {
    name: Option<String>,
    price_per_kg: Option<Decimal>,
    in_stock: Option<bool>,
    image: Option<(String, Vec<u8>)>,
    image_url: Option<String>,
}

async fn read_product_upload(mut multipart: Multipart) -> Result<ProductUpload, ServiceError> {
    let mut upload = ProductUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("Malformed multipart body: {}", e)))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        match field_name.as_str() {
            "name" => {
                let text = field.text().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Invalid name field: {}", e))
                })?;
                upload.name = Some(text);
            }
            "price_per_kg" => {
                let text = field.text().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Invalid price_per_kg field: {}", e))
                })?;
                let price = Decimal::from_str(text.trim()).map_err(|_| {
                    ServiceError::ValidationError(format!(
                        "price_per_kg must be a decimal number, got '{}'",
                        text
                    ))
                })?;
                upload.price_per_kg = Some(price);
            }
            "in_stock" => {
                let text = field.text().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Invalid in_stock field: {}", e))
                })?;
                let in_stock = text.trim().parse::<bool>().map_err(|_| {
                    ServiceError::ValidationError(format!(
                        "in_stock must be true or false, got '{}'",
                        text
                    ))
                })?;
                upload.in_stock = Some(in_stock);
            }
            "image_url" => {
                let text = field.text().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Invalid image_url field: {}", e))
                })?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    upload.image_url = Some(trimmed.to_string());
                }
            }
            "image" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ServiceError::ValidationError(
                            "Image field must carry a content type".to_string(),
                        )
                    })?;
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Failed to read image upload: {}", e))
                })?;
                upload.image = Some((content_type, bytes.to_vec()));
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    Ok(upload)
}

async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_product_upload(multipart).await?;

    let name = upload
        .name
        .ok_or_else(|| ServiceError::ValidationError("Product name is required".to_string()))?;
    let price_per_kg = upload
        .price_per_kg
        .ok_or_else(|| ServiceError::ValidationError("price_per_kg is required".to_string()))?;

    if upload.image.is_none() && upload.image_url.is_none() {
        return Err(ServiceError::ValidationError(
            "Either an image file or image_url is required".to_string(),
        ));
    }

    // Store the uploaded file first so the product row never references a
    // missing file; clean it up if the insert fails. An uploaded file takes
    // precedence over image_url.
    let catalog = &state.services.catalog;
    let stored_path = match &upload.image {
        Some((content_type, bytes)) => Some(catalog.image_store().save(content_type, bytes).await?),
        None => None,
    };
    let image = stored_path.clone().or(upload.image_url);

    let request = CreateProductRequest {
        name,
        price_per_kg,
        in_stock: upload.in_stock,
        image,
    };

    match catalog.create_product(request).await {
        Ok(product) => Ok(created_response(product)),
        Err(err) => {
            if let Some(path) = stored_path {
                catalog.image_store().delete_if_owned(&path).await;
            }
            Err(err)
        }
    }
}

async fn list_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let products = state.services.catalog.list_products().await?;
    Ok(success_response(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.get_product(product_id).await?;
    Ok(success_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    let updated = state.services.catalog.update_product(product_id, body).await?;
    Ok(success_response(updated))
}

async fn update_product_image(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_product_upload(multipart).await?;
    let (content_type, bytes) = upload.image.ok_or_else(|| {
        ServiceError::ValidationError("Multipart body must contain an image field".to_string())
    })?;

    let updated = state
        .services
        .catalog
        .set_product_image(product_id, &content_type, &bytes)
        .await?;
    Ok(success_response(updated))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_product(product_id).await?;
    Ok(no_content_response())
}
