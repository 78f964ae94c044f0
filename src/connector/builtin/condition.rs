//! Condition connector: evaluates a comparison expression to a boolean.
//!
//! Like `math`, the expression has its templates resolved before it gets
//! here (e.g. `"{{state.age}} > 18"` becomes `"21 > 18"`) and runs through
//! the constrained interpreter.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};
use crate::expression::eval;

pub struct ConditionConnector;

#[async_trait]
impl Connector for ConditionConnector {
    fn id(&self) -> &'static str {
        "condition"
    }

    fn name(&self) -> &'static str {
        "Conditional Branch"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Logic
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let expression = match config.get("expression").and_then(Value::as_str) {
            Some(expr) => expr,
            None => return Ok(ConnectorResult::fail("condition missing 'expression'")),
        };

        match eval::evaluate_bool(expression) {
            Ok(verdict) => {
                ctx.log(format!("[condition] {expression} => {verdict}"), None);
                Ok(ConnectorResult::ok(json!(verdict)))
            }
            Err(reason) => {
                ctx.log(format!("[condition] error: {reason}"), None);
                Ok(ConnectorResult::fail(format!(
                    "condition expression failed: {reason}"
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

    #[tokio::test]
    async fn boolean_verdict() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "c1",
        };

        let result = ConditionConnector
            .execute(&mut ctx, &json!({ "expression": "21 > 18" }))
            .await
            .unwrap();
        assert_eq!(result.output, Some(json!(true)));
    }

    #[tokio::test]
    async fn missing_expression_fails() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "c1",
        };

        let result = ConditionConnector
            .execute(&mut ctx, &json!({}))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
