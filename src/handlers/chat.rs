use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response, validate_input},
    services::chat::SendMessageInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for chat endpoints
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/conversations/:user_id", get(conversations))
        .route("/read/:product_id/:user_id/:other_user_id", put(mark_read))
        .route("/:product_id/:user_id/:other_user_id", get(conversation))
}

/// Send a message in a product conversation
async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let message = state
        .services
        .chat
        .send_message(SendMessageInput {
            product_id: payload.product_id,
            sender_id: payload.sender_id,
            sender_name: payload.sender_name,
            receiver_id: payload.receiver_id,
            receiver_name: payload.receiver_name,
            message: payload.message,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(message))
}

/// Both directions of one product conversation, oldest first
async fn conversation(
    State(state): State<AppState>,
    Path((product_id, user_id, other_user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .services
        .chat
        .conversation(product_id, user_id, other_user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(messages))
}

/// Conversation summaries for a user, most recent first
async fn conversations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state
        .services
        .chat
        .conversations_for_user(user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summaries))
}

/// Mark the counterpart's messages as read
async fn mark_read(
    State(state): State<AppState>,
    Path((product_id, user_id, other_user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .chat
        .mark_read(product_id, user_id, other_user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MarkReadResponse {
        message: "Messages marked as read".to_string(),
        updated,
    }))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    pub product_id: Uuid,
    pub sender_id: Uuid,
    #[validate(length(min = 1, message = "Sender name is required"))]
    pub sender_name: String,
    pub receiver_id: Uuid,
    #[validate(length(min = 1, message = "Receiver name is required"))]
    pub receiver_name: String,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub message: String,
    pub updated: u64,
}
