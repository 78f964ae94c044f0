//! Discord connector: posts a message to a Discord webhook URL.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

pub struct DiscordConnector {
    client: reqwest::Client,
}

impl DiscordConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DiscordConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for DiscordConnector {
    fn id(&self) -> &'static str {
        "discord"
    }

    fn name(&self) -> &'static str {
        "Discord Message"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Action
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let webhook_url = match config.get("webhookUrl").and_then(Value::as_str) {
            Some(url) => url,
            None => return Ok(ConnectorResult::fail("missing Discord webhook URL")),
        };
        let message = config
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Hello from wireflow!");

        let response = self
            .client
            .post(webhook_url)
            .timeout(Duration::from_secs(10))
            .json(&json!({ "content": message }))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                ctx.log("[discord] message sent", None);
                Ok(ConnectorResult::ok(json!(format!(
                    "Sent to Discord: {message}"
                ))))
            }
            Ok(response) => {
                let status = response.status();
                ctx.log(format!("[discord] rejected with status {status}"), None);
                Ok(ConnectorResult::fail(format!(
                    "discord webhook returned {status}"
                )))
            }
            Err(err) => {
                ctx.log(format!("[discord] error: {err}"), None);
                Ok(ConnectorResult::fail(format!("discord post failed: {err}")))
            }
        }
    }
}
