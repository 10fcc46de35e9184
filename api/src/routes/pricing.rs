//! Price calculation, relayed to the pricing backend

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Relayed, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::routes::orders::require_object;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(calculate_price))
}

pub async fn calculate_price(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Relayed, ApiError> {
    require_object(&body)?;
    state
        .downstream
        .send(
            DownstreamRequest::post(Service::Pricing, "/price")
                .with_token(session.token())
                .with_json(body),
        )
        .await
}
