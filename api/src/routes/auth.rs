//! Login relay
//!
//! Credentials go to the external auth service; the token it returns is kept
//! in an HTTP-only cookie so browser requests carry it automatically.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::downstream::{DownstreamRequest, Relayed, Service};
use crate::error::ApiError;
use crate::middleware::auth::Session;
use crate::models::{ApiResponse, LoginRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Log in through the auth service
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set"),
        (status = 401, description = "Wrong credentials (relayed)")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let body = serde_json::to_value(&credentials).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let relayed = state
        .downstream
        .send(DownstreamRequest::post(Service::Auth, "/login").with_json(body))
        .await?;

    let cookie = relayed
        .is_success()
        .then(|| issued_token(&relayed.body))
        .flatten()
        .and_then(|(token, max_age)| session_cookie(&state, &token, max_age));

    tracing::info!(username = %credentials.username, status = relayed.status, "Login relayed");
    let mut response = relayed.into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    let mut response = Json(ApiResponse::success(Value::Null)).into_response();
    if let Some(cookie) = session_cookie(&state, "", Some(0)) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Current user as the auth service knows it
pub async fn me(State(state): State<Arc<AppState>>, session: Session) -> Result<Relayed, ApiError> {
    state
        .downstream
        .send(DownstreamRequest::get(Service::Auth, "/me").with_token(session.token()))
        .await
}

/// Token and lifetime from a login answer, bare or wrapped in `data`
fn issued_token(body: &Value) -> Option<(String, Option<u64>)> {
    let payload = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
    let token = payload
        .get("access_token")
        .or_else(|| payload.get("token"))
        .and_then(Value::as_str)?;
    let max_age = payload.get("expires_in").and_then(Value::as_u64);
    Some((token.to_string(), max_age))
}

fn session_cookie(state: &AppState, token: &str, max_age: Option<u64>) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        state.config.auth.cookie_name, token
    );
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={age}"));
    }
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
