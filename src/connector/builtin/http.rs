//! HTTP connector: performs an outbound request with reqwest.
//!
//! The request timeout lives here, on the capability, not in the
//! dispatcher. Any response status counts as a successful invocation; only
//! transport failures fail the node.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

const DEFAULT_TIMEOUT_MS: u64 = 15_000;

pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    fn id(&self) -> &'static str {
        "http"
    }

    fn name(&self) -> &'static str {
        "HTTP Request"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Action
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let url = match config.get("url").and_then(Value::as_str) {
            Some(url) => url,
            None => return Ok(ConnectorResult::fail("missing 'url' in http config")),
        };
        let method = config
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_uppercase();
        let timeout_ms = config
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let method = match reqwest::Method::from_bytes(method.as_bytes()) {
            Ok(m) => m,
            Err(_) => return Ok(ConnectorResult::fail(format!("unsupported method: {method}"))),
        };

        ctx.log(format!("[http] {method} {url}"), None);

        let mut request = self
            .client
            .request(method, url)
            .timeout(Duration::from_millis(timeout_ms));

        if let Some(headers) = config.get("headers").and_then(Value::as_object) {
            for (key, value) in headers {
                if let Some(v) = value.as_str() {
                    request = request.header(key, v);
                }
            }
        }

        match config.get("body") {
            Some(Value::String(text)) => request = request.body(text.clone()),
            Some(body @ (Value::Object(_) | Value::Array(_))) => request = request.json(body),
            _ => {}
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                ctx.log(format!("[http] error: {err}"), None);
                return Ok(ConnectorResult::fail(format!("http request failed: {err}")));
            }
        };

        let status = response.status().as_u16();
        ctx.log(format!("[http] status {status}"), None);

        let text = response.text().await.unwrap_or_default();
        let data = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        Ok(ConnectorResult::ok(json!({
            "status": status,
            "data": data,
        })))
    }
}
