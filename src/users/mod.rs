use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod role;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::admin_routes())
        .merge(handlers::profile_routes())
}
