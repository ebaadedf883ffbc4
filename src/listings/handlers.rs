use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::listings::dto::{CatalogQuery, ListingFields, ListingResponse, ReviewRequest};
use crate::listings::{repo, services};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(catalog))
        .route("/listings/:id", get(detail))
        .route("/listings/:id/image", get(image))
}

pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create))
        .route("/listings/:id", put(edit).delete(remove))
        .route("/listings/:id/review", post(review))
}

#[instrument(skip(state))]
async fn catalog(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let products = repo::list_approved(
        &state.db,
        q.category,
        q.search.as_deref(),
        q.limit,
        q.offset,
    )
    .await?;
    Ok(Json(products.into_iter().map(ListingResponse::from).collect()))
}

#[instrument(skip(state))]
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    let product = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    Ok(Json(product.into()))
}

#[instrument(skip(state))]
async fn image(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Redirect> {
    let url = services::image_url(&state, id).await?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn create(
    State(state): State<AppState>,
    actor: CurrentUser,
    Json(payload): Json<ListingFields>,
) -> AppResult<(StatusCode, Json<ListingResponse>)> {
    let product = services::create_listing(&state, &actor.0, payload).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn edit(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListingFields>,
) -> AppResult<Json<ListingResponse>> {
    let product = services::edit_listing(&state, &actor.0, id, payload).await?;
    Ok(Json(product.into()))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn remove(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_listing(&state, &actor.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn review(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Json<ListingResponse>> {
    let product = services::review_listing(&state, &actor.0, id, payload.decision).await?;
    Ok(Json(product.into()))
}
