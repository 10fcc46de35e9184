//! Gateway configuration
//!
//! Layered as built-in defaults, then an optional `portal.toml` (or the file
//! named by `PORTAL_CONFIG`), then `PORTAL__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub mode: RunMode,
    pub auth: AuthConfig,
    pub backends: BackendEndpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Production hides diagnostic details from error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Cookie holding the session token when no `Authorization` header is sent
    pub cookie_name: String,
    /// HS256 secret; when unset tokens are relayed as opaque credentials
    pub jwt_secret: Option<String>,
}

/// Base URLs of the REST backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendEndpoints {
    pub auth: String,
    pub orders: String,
    pub forms: String,
    pub products: String,
    pub pricing: String,
    pub raynet: String,
    pub erp: String,
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        let backend = "http://localhost:8000/api".to_string();
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:8080".into(),
            },
            mode: RunMode::Development,
            auth: AuthConfig {
                cookie_name: "access_token".into(),
                jwt_secret: None,
            },
            backends: BackendEndpoints {
                auth: backend.clone(),
                orders: backend.clone(),
                forms: backend.clone(),
                products: backend.clone(),
                pricing: backend.clone(),
                raynet: format!("{backend}/raynet"),
                erp: format!("{backend}/erp"),
                timeout_secs: 30,
            },
        }
    }
}

impl PortalConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("PORTAL_CONFIG").unwrap_or_else(|_| "portal".into());
        Config::builder()
            .add_source(Config::try_from(&PortalConfig::default())?)
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.mode == RunMode::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_config() {
        let cfg: PortalConfig = Config::builder()
            .add_source(Config::try_from(&PortalConfig::default()).unwrap())
            .set_override("mode", "production")
            .unwrap()
            .set_override("backends.forms", "http://forms.internal/api")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(cfg.is_production());
        assert_eq!(cfg.backends.forms, "http://forms.internal/api");
        assert_eq!(cfg.backends.orders, "http://localhost:8000/api");
        assert_eq!(cfg.auth.cookie_name, "access_token");
        assert!(cfg.auth.jwt_secret.is_none());
        assert_eq!(cfg.backends.timeout_secs, 30);
    }
}
