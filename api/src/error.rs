//! Gateway error type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use form_engine::SchemaError;
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid product schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// Downstream unreachable; `details` is only filled outside production
    #[error("Service unavailable")]
    ServiceUnavailable { details: Option<String> },

    /// Downstream answered with something that is not JSON
    #[error("Bad gateway")]
    BadGateway { details: Option<String> },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSchema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidSchema(_) => "invalid_schema",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::BadGateway { .. } => "bad_gateway",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unauthorized(reason) => format!("Not authenticated: {reason}"),
            Self::ServiceUnavailable { .. } => "Backend service is currently unavailable".into(),
            Self::BadGateway { .. } => "Backend service returned an invalid response".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            Self::ServiceUnavailable { details } | Self::BadGateway { details } => details.clone(),
            _ => None,
        };
        let body = ApiResponse::<()>::error(self.code(), &self.message()).with_details(details);
        (status, Json(body)).into_response()
    }
}
