//! Customer lookup and validation against Raynet CRM and the ERP

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Relayed, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::routes::orders::require_object;
use crate::AppState;

pub fn raynet_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(search_raynet_customers))
        .route("/customers/validate", post(validate_raynet_customer))
}

pub fn erp_router() -> Router<Arc<AppState>> {
    Router::new().route("/customers/validate", post(validate_erp_customer))
}

pub async fn search_raynet_customers(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(
            DownstreamRequest::get(Service::Raynet, "/customers")
                .with_token(session.token())
                .with_query(params),
        )
        .await
}

pub async fn validate_raynet_customer(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Relayed, ApiError> {
    validate_customer(&state, &session, Service::Raynet, body).await
}

pub async fn validate_erp_customer(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Relayed, ApiError> {
    validate_customer(&state, &session, Service::Erp, body).await
}

async fn validate_customer(
    state: &AppState,
    session: &Session,
    service: Service,
    body: Value,
) -> Result<Relayed, ApiError> {
    require_object(&body)?;
    state
        .downstream
        .send(
            DownstreamRequest::post(service, "/customers/validate")
                .with_token(session.token())
                .with_json(body),
        )
        .await
}
