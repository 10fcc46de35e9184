//! Order Forms Portal API Gateway
//!
//! Thin authenticated gateway in front of the REST backends that own orders,
//! forms, product schemas, pricing and customer validation (Raynet CRM, ERP).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   bearer / cookie   ┌───────────────────────────────────┐
//! │   Browser /  │ ──────────────────▶ │            portal-api             │
//! │   formctl    │                     │  Session ─▶ route ─▶ Downstream   │
//! └──────────────┘                     │       (form-engine validation)    │
//!                                      └──────────────┬────────────────────┘
//!                                                     │ status + JSON relayed
//!            ┌──────────┬──────────┬──────────┬───────┴──┬──────────┬──────────┐
//!            │   auth   │  orders  │  forms   │ products │ pricing  │ raynet / │
//!            │          │          │          │          │          │   erp    │
//!            └──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```

pub mod config;
pub mod downstream;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::PortalConfig;
pub use downstream::{Downstream, HttpDownstream};
pub use error::ApiError;

/// Shared handler state
pub struct AppState {
    pub config: PortalConfig,
    pub downstream: Arc<dyn Downstream>,
}

impl AppState {
    pub fn new(config: PortalConfig, downstream: Arc<dyn Downstream>) -> Self {
        Self { config, downstream }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Forms Portal API",
        version = "0.1.0",
        description = "Gateway for orders and blind/screen production forms"
    ),
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::orders::list_orders,
        routes::orders::get_order,
        routes::forms::list_forms,
        routes::forms::get_form,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::OrderRecord,
            models::FormRecord,
            models::LoginRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login relay"),
        (name = "orders", description = "Customer orders"),
        (name = "forms", description = "Production forms")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/orders", routes::orders::router())
        .nest("/forms", routes::forms::router())
        .nest("/products", routes::products::router())
        .nest("/pricing", routes::pricing::router())
        .nest("/raynet", routes::customers::raynet_router())
        .nest("/erp", routes::customers::erp_router())
}
