use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::auth::extractors::CurrentUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::services;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::dto::PublicUser;
use crate::users::repo::User;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

fn token_pair(keys: &JwtKeys, user_id: Uuid) -> AppResult<(String, String)> {
    let access = keys.sign_access(user_id)?;
    let refresh = keys.sign_refresh(user_id)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = services::register(&state, &payload.username, &payload.email, &payload.password)
        .await?;
    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = services::authenticate(&state, &payload.username, &payload.password).await?;
    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;
    if !user.is_active {
        return Err(AppError::Unauthorized("account is blocked".into()));
    }

    let (access_token, refresh_token) = token_pair(&keys, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(actor), fields(actor = %actor.0.id))]
async fn me(actor: CurrentUser) -> Json<PublicUser> {
    Json(actor.0.into())
}
