//! Product schemas
//!
//! Schemas are fetched from the products backend and checked with the form
//! engine before they reach a client, so an invalid payload never renders a
//! partial form.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use form_engine::{validate_payload, DynamicForm, ProductSchema};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::models::ApiResponse;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:code/schema", get(get_schema))
        .route("/:code/form", post(generate_form))
}

/// Validated product schema
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    match fetch_schema(&state, &session, &code).await? {
        Ok(schema) => Ok(Json(ApiResponse::success(schema)).into_response()),
        Err(relayed) => Ok(relayed),
    }
}

/// Initial `form_json` for a product: one room with one defaulted row
pub async fn generate_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let schema = match fetch_schema(&state, &session, &code).await? {
        Ok(schema) => schema,
        Err(relayed) => return Ok(relayed),
    };
    let form = DynamicForm::generate(Arc::new(schema));
    let form_json = form
        .to_form_json()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(ApiResponse::success(form_json)).into_response())
}

/// Inner `Err` carries a non-success backend answer to relay unchanged
async fn fetch_schema(
    state: &AppState,
    session: &Session,
    code: &str,
) -> Result<Result<ProductSchema, Response>, ApiError> {
    check_product_code(code)?;
    let relayed = state
        .downstream
        .send(
            DownstreamRequest::get(Service::Products, format!("/products/{code}/schema"))
                .with_token(session.token()),
        )
        .await?;

    if !relayed.is_success() {
        return Ok(Err(relayed.into_response()));
    }

    let payload = unwrap_envelope(relayed.body);
    let schema = validate_payload(payload).map_err(|e| {
        tracing::warn!(product_code = code, error = %e, "Backend schema rejected");
        ApiError::from(e)
    })?;
    Ok(Ok(schema))
}

/// Codes become a backend path segment, so only plain identifiers pass
fn check_product_code(code: &str) -> Result<(), ApiError> {
    let plain = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid product code `{code}`")))
    }
}

/// Backends answer either with the bare schema or with `{ success, data }`
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("product_code") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
