//! Downstream REST backends
//!
//! Handlers talk to the backends only through [`Downstream`], so routes can be
//! exercised against an in-memory fake. [`HttpDownstream`] is the reqwest
//! implementation: it relays status and JSON body verbatim and never retries.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::config::{BackendEndpoints, PortalConfig};
use crate::error::ApiError;

/// Named backend service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Auth,
    Orders,
    Forms,
    Products,
    Pricing,
    Raynet,
    Erp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

/// One call to a backend
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamRequest {
    pub service: Service,
    pub verb: Verb,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<String>,
    pub body: Option<Value>,
}

impl DownstreamRequest {
    pub fn new(service: Service, verb: Verb, path: impl Into<String>) -> Self {
        Self {
            service,
            verb,
            path: path.into(),
            query: Vec::new(),
            token: None,
            body: None,
        }
    }

    pub fn get(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Verb::Get, path)
    }

    pub fn post(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Verb::Post, path)
    }

    pub fn put(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Verb::Put, path)
    }

    pub fn delete(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Verb::Delete, path)
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Backend answer, relayed verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct Relayed {
    pub status: u16,
    /// `Null` when the backend sent no body
    pub body: Value,
}

impl Relayed {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        if self.body.is_null() {
            status.into_response()
        } else {
            (status, Json(self.body)).into_response()
        }
    }
}

#[async_trait]
pub trait Downstream: Send + Sync {
    async fn send(&self, request: DownstreamRequest) -> Result<Relayed, ApiError>;
}

/// reqwest-backed [`Downstream`]
pub struct HttpDownstream {
    client: reqwest::Client,
    endpoints: BackendEndpoints,
    expose_details: bool,
}

impl HttpDownstream {
    pub fn new(config: &PortalConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backends.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoints: config.backends.clone(),
            expose_details: !config.is_production(),
        })
    }

    fn base_url(&self, service: Service) -> &str {
        let base = match service {
            Service::Auth => &self.endpoints.auth,
            Service::Orders => &self.endpoints.orders,
            Service::Forms => &self.endpoints.forms,
            Service::Products => &self.endpoints.products,
            Service::Pricing => &self.endpoints.pricing,
            Service::Raynet => &self.endpoints.raynet,
            Service::Erp => &self.endpoints.erp,
        };
        base.trim_end_matches('/')
    }

    fn details(&self, error: impl ToString) -> Option<String> {
        self.expose_details.then(|| error.to_string())
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn send(&self, request: DownstreamRequest) -> Result<Relayed, ApiError> {
        let url = format!("{}{}", self.base_url(request.service), request.path);
        let method = match request.verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(service = ?request.service, %url, error = %e, "Backend unreachable");
            ApiError::ServiceUnavailable {
                details: self.details(&e),
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(service = ?request.service, %url, error = %e, "Backend response truncated");
            ApiError::BadGateway {
                details: self.details(&e),
            }
        })?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(service = ?request.service, %url, status, error = %e, "Backend returned non-JSON body");
                ApiError::BadGateway {
                    details: self.details(&e),
                }
            })?
        };

        tracing::debug!(service = ?request.service, %url, status, "Backend call relayed");
        Ok(Relayed { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(uri: &str, mode: RunMode) -> PortalConfig {
        let mut config = PortalConfig::default();
        config.mode = mode;
        config.backends.orders = format!("{uri}/");
        config.backends.forms = uri.to_string();
        config.backends.timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn test_relays_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("page", "2"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
            .mount(&server)
            .await;

        let downstream = HttpDownstream::new(&config_for(&server.uri(), RunMode::Development)).unwrap();
        let relayed = downstream
            .send(
                DownstreamRequest::get(Service::Orders, "/orders")
                    .with_token("tok-1")
                    .with_query([("page", "2")]),
            )
            .await
            .unwrap();

        assert_eq!(relayed.status, 200);
        assert_eq!(relayed.body, json!({"success": true, "data": []}));
    }

    #[tokio::test]
    async fn test_relays_error_status_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/forms"))
            .and(body_json(json!({"form_type": "ROLETA"})))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"success": false, "error": "conflict"})))
            .mount(&server)
            .await;

        let downstream = HttpDownstream::new(&config_for(&server.uri(), RunMode::Development)).unwrap();
        let relayed = downstream
            .send(DownstreamRequest::post(Service::Forms, "/forms").with_json(json!({"form_type": "ROLETA"})))
            .await
            .unwrap();

        assert_eq!(relayed.status, 409);
        assert!(!relayed.is_success());
        assert_eq!(relayed.body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/forms/5"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let downstream = HttpDownstream::new(&config_for(&server.uri(), RunMode::Development)).unwrap();
        let relayed = downstream
            .send(DownstreamRequest::delete(Service::Forms, "/forms/5"))
            .await
            .unwrap();
        assert_eq!(relayed, Relayed { status: 204, body: Value::Null });
    }

    #[tokio::test]
    async fn test_non_json_body_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forms"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let downstream = HttpDownstream::new(&config_for(&server.uri(), RunMode::Development)).unwrap();
        let err = downstream
            .send(DownstreamRequest::get(Service::Forms, "/forms"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadGateway { details: Some(_) }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_hides_details_in_production() {
        let config = config_for("http://127.0.0.1:1", RunMode::Production);
        let downstream = HttpDownstream::new(&config).unwrap();
        let err = downstream
            .send(DownstreamRequest::get(Service::Forms, "/forms"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable { details: None }));

        let config = config_for("http://127.0.0.1:1", RunMode::Development);
        let downstream = HttpDownstream::new(&config).unwrap();
        let err = downstream
            .send(DownstreamRequest::get(Service::Forms, "/forms"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable { details: Some(_) }));
    }
}
