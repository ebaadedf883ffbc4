use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// Crate-wide error taxonomy. Every service returns one of these; the
/// handler layer never maps errors by hand.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    Conflict(String),

    #[error("payment provider error: {0}")]
    ExternalService(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_string()
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Maps a unique-constraint violation onto `Duplicate`, leaving other
/// database errors untouched. The constraint name comes from the schema.
pub fn on_unique(e: sqlx::Error, constraint: &str, what: &'static str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.constraint() == Some(constraint) => {
            AppError::Duplicate(what)
        }
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_and_conflict_map_to_409() {
        let dup = AppError::Duplicate("username").into_response();
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        let conflict = AppError::Conflict("already sold".into()).into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn permission_maps_to_403() {
        let resp = AppError::Permission("access denied".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_errors_hide_details() {
        let resp = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
