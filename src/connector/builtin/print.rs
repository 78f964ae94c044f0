//! Print connector: logs a message and passes it on as output.

use async_trait::async_trait;
use serde_json::Value;

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

pub struct PrintConnector;

#[async_trait]
impl Connector for PrintConnector {
    fn id(&self) -> &'static str {
        "print"
    }

    fn name(&self) -> &'static str {
        "Print Message"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Utility
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        // Templates were already resolved by the dispatcher; whatever is
        // left in `message` is printed verbatim.
        let message = match config.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "No message provided".to_string(),
        };

        tracing::info!("[print] {}", message);
        ctx.log(format!("[print] {message}"), None);

        Ok(ConnectorResult::ok(Value::String(message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use indexmap::IndexMap;
    use serde_json::json;

    #[tokio::test]
    async fn outputs_the_message() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "n1",
        };

        let result = PrintConnector
            .execute(&mut ctx, &json!({ "message": "hi" }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, Some(json!("hi")));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].node_id, "n1");
    }
}
