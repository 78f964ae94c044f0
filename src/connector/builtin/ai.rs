//! AI connector: text generation through the injected AI service.
//!
//! Requires `services.ai`; when the host did not configure one, the node
//! fails with a service-unavailable message rather than crashing the run.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};
use crate::error::EngineError;

pub struct AiConnector;

#[async_trait]
impl Connector for AiConnector {
    fn id(&self) -> &'static str {
        "ai"
    }

    fn name(&self) -> &'static str {
        "AI Text Generation"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Action
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let prompt = match config.get("prompt").and_then(Value::as_str) {
            Some(prompt) => prompt,
            None => return Ok(ConnectorResult::fail("missing 'prompt'")),
        };
        let model = config.get("model").and_then(Value::as_str);
        let system = config.get("system").and_then(Value::as_str);

        let Some(ai) = ctx.services.ai.clone() else {
            return Ok(ConnectorResult::fail(
                EngineError::ServiceUnavailable {
                    service: "ai".to_string(),
                }
                .to_string(),
            ));
        };

        ctx.log(
            format!("[ai] generating text with model {}", model.unwrap_or("default")),
            None,
        );

        match ai.generate_text(prompt, model, system).await {
            Ok(text) => {
                ctx.log(format!("[ai] generated {} chars", text.len()), None);
                Ok(ConnectorResult::ok(json!(text)))
            }
            Err(err) => {
                ctx.log(format!("[ai] error: {err}"), None);
                Ok(ConnectorResult::fail(err.to_string()))
            }
        }
    }
}
