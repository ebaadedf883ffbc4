use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::error::AppResult;
use crate::orders::dto::{OrderResponse, PaymentResponse, PlaceOrderRequest, TransitionRequest};
use crate::orders::services;
use crate::state::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place).get(list))
        .route("/orders/:id", get(detail))
        .route("/orders/:id/pay", post(pay))
        .route("/orders/:id/status", post(transition))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn place(
    State(state): State<AppState>,
    actor: CurrentUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let order = services::place_order(&state, &actor.0, payload.product_id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn list(
    State(state): State<AppState>,
    actor: CurrentUser,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = services::list_orders(&state, &actor.0).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn detail(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let order = services::get_order(&state, &actor.0, id).await?;
    Ok(Json(order.into()))
}

#[instrument(skip(state, actor), fields(actor = %actor.0.id))]
async fn pay(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PaymentResponse>> {
    let (order, client_secret) = services::request_payment(&state, &actor.0, id).await?;
    Ok(Json(PaymentResponse {
        order: order.into(),
        client_secret,
    }))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.0.id))]
async fn transition(
    State(state): State<AppState>,
    actor: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = services::transition_status(
        &state,
        &actor.0,
        id,
        payload.status,
        payload.tracking_number,
    )
    .await?;
    Ok(Json(order.into()))
}
