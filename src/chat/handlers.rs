use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::chat::dto::SendMessageRequest;
use crate::chat::repo::ChatMessage;
use crate::chat::services;
use crate::error::AppResult;
use crate::state::AppState;

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/orders/:id/messages", get(list).post(send))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn list(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    let messages = services::list_messages(&state, &actor.0, order_id).await?;
    Ok(Json(messages))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn send(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ChatMessage>)> {
    let message = services::send_message(&state, &actor.0, order_id, &payload.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
