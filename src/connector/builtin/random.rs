//! Random connector: emits an integer in a configured inclusive range.

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

pub struct RandomConnector;

#[async_trait]
impl Connector for RandomConnector {
    fn id(&self) -> &'static str {
        "random"
    }

    fn name(&self) -> &'static str {
        "Generate Random Number"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Utility
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let min = config.get("min").and_then(Value::as_i64).unwrap_or(0);
        let max = config.get("max").and_then(Value::as_i64).unwrap_or(100);
        if min > max {
            return Ok(ConnectorResult::fail(format!(
                "invalid range: min {min} > max {max}"
            )));
        }

        let value = rand::thread_rng().gen_range(min..=max);
        ctx.log(format!("[random] {value} between {min}-{max}"), None);

        Ok(ConnectorResult::ok(json!(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use indexmap::IndexMap;

    #[tokio::test]
    async fn stays_within_range() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "r1",
        };

        let result = RandomConnector
            .execute(&mut ctx, &json!({ "min": 3, "max": 5 }))
            .await
            .unwrap();
        let n = result.output.unwrap().as_i64().unwrap();
        assert!((3..=5).contains(&n));
    }

    #[tokio::test]
    async fn inverted_range_fails() {
        let input = Value::Null;
        let results = IndexMap::new();
        let mut logs = Vec::new();
        let services = Services::default();
        let mut ctx = ConnectorContext {
            input: &input,
            results: &results,
            logs: &mut logs,
            services: &services,
            node_id: "r1",
        };

        let result = RandomConnector
            .execute(&mut ctx, &json!({ "min": 9, "max": 1 }))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
