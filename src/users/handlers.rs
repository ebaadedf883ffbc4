use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, ProfileStats, PublicUser, UpdateProfileRequest};
use crate::users::services;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/active", post(toggle_active))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile).put(update_profile))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn create_user(
    State(state): State<AppState>,
    actor: CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = services::create_staff_user(&state, &actor.0, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn list_users(
    State(state): State<AppState>,
    actor: CurrentUser,
) -> AppResult<Json<Vec<PublicUser>>> {
    let users = services::list_users(&state, &actor.0).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn delete_user(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_user(&state, &actor.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn toggle_active(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PublicUser>> {
    let user = services::toggle_user_active(&state, &actor.0, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn profile(
    State(state): State<AppState>,
    actor: CurrentUser,
) -> AppResult<Json<ProfileStats>> {
    let stats = services::profile_stats(&state, &actor.0).await?;
    Ok(Json(stats))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn update_profile(
    State(state): State<AppState>,
    actor: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = services::update_profile(&state, &actor.0, payload).await?;
    Ok(Json(user.into()))
}
