//! Math connector: evaluates an arithmetic expression.
//!
//! The expression arrives with its templates already resolved (e.g.
//! `"{{state.a}} + {{state.b}}"` becomes `"2 + 3"`) and runs through the
//! constrained interpreter, not a code evaluator.

use async_trait::async_trait;
use serde_json::Value;

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};
use crate::expression::eval;

pub struct MathConnector;

#[async_trait]
impl Connector for MathConnector {
    fn id(&self) -> &'static str {
        "math"
    }

    fn name(&self) -> &'static str {
        "Math Expression"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Utility
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let expression = config
            .get("expression")
            .and_then(Value::as_str)
            .unwrap_or("0");

        match eval::evaluate(expression) {
            Ok(result) => {
                ctx.log(format!("[math] {expression} = {result}"), None);
                Ok(ConnectorResult::ok(result))
            }
            Err(reason) => {
                ctx.log(format!("[math] error: {reason}"), None);
                Ok(ConnectorResult::fail(format!(
                    "math expression failed: {reason}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use indexmap::IndexMap;
    use serde_json::json;

    #[tokio::test]
    async fn evaluates_resolved_expression() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "m1",
        };

        let result = MathConnector
            .execute(&mut ctx, &json!({ "expression": "2 + 3 * 4" }))
            .await
            .unwrap();
        assert_eq!(result.output, Some(json!(14)));
    }
}
