//! API Models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Response envelope shared with the backends
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            details: None,
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code.to_string()),
            message: Some(message.to_string()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

// ============ Orders ============

/// Order as stored by the orders backend (soft-deleted records carry `deleted_at`)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderRecord {
    pub id: i64,
    pub owner: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub raynet_id: Option<i64>,
    pub erp_id: Option<String>,
    pub deleted_at: Option<String>,
}

// ============ Forms ============

/// Form instance as stored by the forms backend
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormRecord {
    pub id: i64,
    pub owner: Option<String>,
    pub form_type: String,
    #[schema(value_type = Object)]
    pub form_json: Value,
    pub order_id: Option<i64>,
    pub deleted_at: Option<String>,
}

// ============ Auth ============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
