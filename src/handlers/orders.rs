use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

/// Creates the router for order retrieval endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:user_id", get(orders_for_buyer))
        .route("/seller/:seller_id", get(orders_for_seller))
        .route("/:order_number", get(get_order))
}

/// A buyer's orders, newest first, purchases and product excerpts expanded
async fn orders_for_buyer(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .orders_for_buyer(user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Seller view: orders grouped around the seller's purchases, plus
/// standalone purchases that never joined an order
async fn orders_for_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .orders
        .orders_for_seller(seller_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(view))
}

/// Single order by its human-readable order number
#[utoipa::path(
    get,
    path = "/api/v1/orders/:order_number",
    responses(
        (status = 200, description = "Order retrieved"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub(crate) async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .order_by_number(&order_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}
