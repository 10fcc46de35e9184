//! Form endpoints, relayed to the forms backend

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use form_engine::{FormSubmission, FormUpdate};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Relayed, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::models::FormRecord;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
}

/// List forms of the current user
#[utoipa::path(
    get,
    path = "/api/forms",
    params(("order_id" = Option<i64>, Query, description = "Only forms attached to this order")),
    responses(
        (status = 200, description = "Forms", body = [FormRecord]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "forms"
)]
pub async fn list_forms(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(
            DownstreamRequest::get(Service::Forms, "/forms")
                .with_token(session.token())
                .with_query(params),
        )
        .await
}

/// Get form by ID
#[utoipa::path(
    get,
    path = "/api/forms/{id}",
    params(("id" = i64, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form", body = FormRecord),
        (status = 404, description = "Form not found")
    ),
    tag = "forms"
)]
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(DownstreamRequest::get(Service::Forms, format!("/forms/{id}")).with_token(session.token()))
        .await
}

pub async fn create_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(submission): Json<FormSubmission>,
) -> Result<Relayed, ApiError> {
    if submission.form_type.trim().is_empty() {
        return Err(ApiError::BadRequest("form_type must not be empty".into()));
    }
    require_form_json(&submission.form_json)?;

    tracing::info!(form_type = %submission.form_type, order_id = ?submission.order_id, "Creating form");
    let body = to_body(&submission)?;
    state
        .downstream
        .send(
            DownstreamRequest::post(Service::Forms, "/forms")
                .with_token(session.token())
                .with_json(body),
        )
        .await
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
    Json(update): Json<FormUpdate>,
) -> Result<Relayed, ApiError> {
    require_form_json(&update.form_json)?;
    let body = to_body(&update)?;
    state
        .downstream
        .send(
            DownstreamRequest::put(Service::Forms, format!("/forms/{id}"))
                .with_token(session.token())
                .with_json(body),
        )
        .await
}

/// The backend soft-deletes the record
pub async fn delete_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(DownstreamRequest::delete(Service::Forms, format!("/forms/{id}")).with_token(session.token()))
        .await
}

fn require_form_json(form_json: &Value) -> Result<(), ApiError> {
    if form_json.is_object() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("form_json must be a JSON object".into()))
    }
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::BadRequest(e.to_string()))
}
