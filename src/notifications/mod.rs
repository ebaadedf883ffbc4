use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::notification_routes())
}
