//! Order endpoints, relayed to the orders backend

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Relayed, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::models::OrderRecord;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/forms", get(list_order_forms))
}

/// List orders of the current user
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders", body = [OrderRecord]),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "Orders backend unavailable")
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(
            DownstreamRequest::get(Service::Orders, "/orders")
                .with_token(session.token())
                .with_query(params),
        )
        .await
}

/// Get order by ID
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderRecord),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(DownstreamRequest::get(Service::Orders, format!("/orders/{id}")).with_token(session.token()))
        .await
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Relayed, ApiError> {
    require_object(&body)?;
    state
        .downstream
        .send(
            DownstreamRequest::post(Service::Orders, "/orders")
                .with_token(session.token())
                .with_json(body),
        )
        .await
}

pub async fn update_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Relayed, ApiError> {
    require_object(&body)?;
    state
        .downstream
        .send(
            DownstreamRequest::put(Service::Orders, format!("/orders/{id}"))
                .with_token(session.token())
                .with_json(body),
        )
        .await
}

/// The backend soft-deletes the record
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(DownstreamRequest::delete(Service::Orders, format!("/orders/{id}")).with_token(session.token()))
        .await
}

/// Forms attached to an order
pub async fn list_order_forms(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(
            DownstreamRequest::get(Service::Forms, "/forms")
                .with_token(session.token())
                .with_query([("order_id", id.to_string())]),
        )
        .await
}

pub(crate) fn require_object(body: &Value) -> Result<(), ApiError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("expected a JSON object".into()))
    }
}
