use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::post, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Creates the router for the destructive seed endpoint
pub fn seed_routes() -> Router<AppState> {
    Router::new().route("/", post(seed_catalog))
}

/// Wipe and repopulate the product catalog with fixture data
#[utoipa::path(
    post,
    path = "/api/v1/seed",
    responses(
        (status = 200, description = "Catalog reseeded", body = SeedResponse)
    ),
    tag = "Seed"
)]
pub(crate) async fn seed_catalog(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .seed
        .reseed()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(SeedResponse {
        message: format!("Database seeded successfully with {} products", products.len()),
        count: products.len(),
        products,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeedResponse {
    pub message: String,
    pub count: usize,
    pub products: Vec<crate::services::seed::SeededProduct>,
}
