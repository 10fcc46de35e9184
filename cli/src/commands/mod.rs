//! CLI Commands

pub mod config;
pub mod forms;
pub mod orders;
pub mod schema;

use anyhow::{bail, Context, Result};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::Value;

/// Gateway client
pub struct ApiClient {
    pub base_url: String,
    pub token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            client: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends with the session token and returns the `data` of the envelope
    async fn send(&self, req: RequestBuilder) -> Result<Value> {
        let Some(token) = &self.token else {
            bail!("not logged in: set FORMCTL_TOKEN or run `formctl config set token <TOKEN>`");
        };

        let resp = req
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("cannot reach {}", self.base_url))?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("gateway returned a non-JSON body")?
        };
        tracing::debug!(status = status.as_u16(), "Gateway answered");

        if !status.is_success() {
            bail!("{} {}", status.as_u16(), error_text(&body));
        }
        Ok(unwrap_data(body))
    }
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn error_text(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}
