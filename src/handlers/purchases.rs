use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response, validate_input},
    services::purchases::CreatePurchaseInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for purchase endpoints
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase))
        .route("/product/:product_id", get(purchases_for_product))
        .route("/analytics/:seller_id", get(seller_analytics))
}

/// Legacy single-purchase creation, kept for callers that predate checkout
async fn create_purchase(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let purchase = state
        .services
        .purchases
        .create_purchase(CreatePurchaseInput {
            product_id: payload.product_id,
            buyer_id: payload.buyer_id,
            buyer_name: payload.buyer_name,
            seller_id: payload.seller_id,
            amount: payload.amount,
            quantity: payload.quantity,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchase))
}

/// Completed purchases of one product, newest first
async fn purchases_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .services
        .purchases
        .purchases_for_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchases))
}

/// Seller revenue overview: totals, per-product stats, monthly series
#[utoipa::path(
    get,
    path = "/api/v1/purchases/analytics/:seller_id",
    responses(
        (status = 200, description = "Seller analytics", body = crate::services::purchases::SellerAnalytics)
    ),
    tag = "Purchases"
)]
pub(crate) async fn seller_analytics(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = state
        .services
        .purchases
        .seller_analytics(seller_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(analytics))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequest {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    pub seller_id: Option<Uuid>,
    pub amount: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
}
