use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::claims::TokenKind;
use crate::auth::jwt::JwtKeys;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo::User;

/// The authenticated actor, loaded fresh from the database so that role
/// changes and account blocks take effect immediately. All core operations
/// take this explicit actor; nothing reads ambient session state.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys
            .verify(token)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("access token required".into()));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized("account is blocked".into()));
        }

        Ok(CurrentUser(user))
    }
}
