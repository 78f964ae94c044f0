//! Delay connector: suspends the run for a configured number of
//! milliseconds. Suspension happens inside the connector, so the dispatcher
//! simply awaits it like any other capability invocation.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

pub struct DelayConnector;

#[async_trait]
impl Connector for DelayConnector {
    fn id(&self) -> &'static str {
        "delay"
    }

    fn name(&self) -> &'static str {
        "Delay / Wait"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Utility
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let ms = config
            .get("ms")
            .and_then(Value::as_u64)
            .unwrap_or(1000);

        ctx.log(format!("[delay] waiting {ms}ms"), None);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        ctx.log("[delay] completed", None);

        Ok(ConnectorResult::ok(json!(format!("Waited {ms}ms"))))
    }
}
