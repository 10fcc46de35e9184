//! Request-scoped session
//!
//! The credential is issued by the external auth service. The gateway only
//! extracts it from the `Authorization` header or the session cookie, checks
//! expiry when a JWT secret is configured, and hands it to each backend call.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::AppState;

/// Claims the gateway reads from a verified JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// Credential of the calling user
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    claims: Option<SessionClaims>,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Present only when tokens are verified locally
    pub fn claims(&self) -> Option<&SessionClaims> {
        self.claims.as_ref()
    }

    pub fn from_headers(headers: &HeaderMap, auth: &AuthConfig) -> Result<Self, ApiError> {
        let token = bearer_token(headers)
            .or_else(|| cookie_value(headers, &auth.cookie_name))
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized("missing credential"))?;

        let claims = match &auth.jwt_secret {
            Some(secret) => Some(verify_token(&token, secret)?),
            None => None,
        };

        Ok(Self { token, claims })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = Arc::<AppState>::from_ref(state);
        Session::from_headers(&parts.headers, &app.config.auth).map_err(|e| {
            tracing::debug!(path = %parts.uri.path(), reason = %e, "Request rejected");
            e
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, ApiError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::Unauthorized("session expired"),
        _ => ApiError::Unauthorized("invalid credential"),
    })
}
