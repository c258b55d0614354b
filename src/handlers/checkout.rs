use crate::{
    entities::purchase::PaymentMethod,
    errors::{ApiError, ServiceError},
    handlers::common::validate_input,
    services::checkout::{CartLine, CheckoutInput},
    services::orders::OrderWithPurchases,
    AppState,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for the checkout endpoint
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

/// Process a cart checkout: validate stock, create purchases, decrement
/// inventory, and group everything into one order
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed"),
        (status = 400, description = "Empty cart or malformed payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart references a missing product", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub(crate) async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CheckoutInput {
        buyer_id: payload.buyer_id,
        buyer_name: payload.buyer_name,
        lines: payload
            .cart_items
            .into_iter()
            .map(|item| CartLine {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
        shipping_address: payload.shipping_address,
        payment_method: payload.payment_method,
        total_amount: payload.total_amount,
    };

    let order = state
        .services
        .checkout
        .checkout(input)
        .await
        .map_err(|err| match err {
            // Checkout rejections carry the reason in the details field too
            ServiceError::InvalidInput(reason) | ServiceError::ValidationError(reason) => {
                ApiError::BadRequest {
                    message: reason.clone(),
                    details: Some(reason),
                }
            }
            other => ApiError::ServiceError(other),
        })?;

    Ok((
        StatusCode::OK,
        Json(CheckoutResponse {
            success: true,
            order,
            message: "Order placed successfully".to_string(),
        }),
    ))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CartItemRequest {
    #[serde(alias = "id")]
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    pub buyer_id: Uuid,
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    #[validate]
    pub cart_items: Vec<CartItemRequest>,
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub order: OrderWithPurchases,
    pub message: String,
}
