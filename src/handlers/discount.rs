use axum::{extract::State, response::Response, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ServiceError,
    handlers::common::success_response,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetDiscountBody {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DiscountBody {
    pub text: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_discount).post(set_discount))
}

/// The storewide discount banner. Absent until a message has been set.
async fn get_discount(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let discount = state.services.discounts.get_discount().await?;
    Ok(success_response(DiscountBody {
        text: discount.map(|d| d.text),
    }))
}

async fn set_discount(
    State(state): State<AppState>,
    Json(body): Json<SetDiscountBody>,
) -> Result<Response, ServiceError> {
    let saved = state.services.discounts.set_discount(body.text).await?;
    Ok(success_response(DiscountBody {
        text: Some(saved.text),
    }))
}
