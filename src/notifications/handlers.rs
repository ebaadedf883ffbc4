use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::auth::extractors::CurrentUser;
use crate::error::AppResult;
use crate::notifications::dto::{Notification, UnreadCount};
use crate::notifications::services;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread", get(unread))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn list(
    State(state): State<AppState>,
    actor: CurrentUser,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = services::list_notifications(&state, &actor.0).await?;
    Ok(Json(notifications))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn unread(
    State(state): State<AppState>,
    actor: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let count = services::count_unread(&state, &actor.0).await?;
    Ok(Json(UnreadCount { count }))
}
