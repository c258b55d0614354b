use crate::{
    entities::demo_request::DemoRequestStatus,
    errors::ApiError,
    handlers::common::{map_service_error, success_response, validate_input},
    services::demo_requests::CreateDemoRequestInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for demo-request endpoints
pub fn demo_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_demo_request))
        .route("/seller/:seller_id", get(demo_requests_for_seller))
        .route("/:id", put(update_demo_request))
}

/// Create a demo request (starts pending)
async fn create_demo_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateDemoRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let request = state
        .services
        .demo_requests
        .create_request(CreateDemoRequestInput {
            product_id: payload.product_id,
            buyer_id: payload.buyer_id,
            buyer_name: payload.buyer_name,
            seller_id: payload.seller_id,
            advance_payment: payload.advance_payment,
            message: payload.message.unwrap_or_default(),
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

/// A seller's demo requests, newest first, with product excerpts
async fn demo_requests_for_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .services
        .demo_requests
        .requests_for_seller(seller_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(requests))
}

/// Move a demo request through its status workflow
async fn update_demo_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDemoRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .services
        .demo_requests
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDemoRequestRequest {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    pub seller_id: Uuid,
    pub advance_payment: Decimal,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDemoRequestRequest {
    pub status: DemoRequestStatus,
}
