//! Trigger-kind connectors.
//!
//! These are registry entries so graphs that include their trigger node can
//! execute end to end; they just pass the run input through. The real
//! triggering machinery is the trigger subsystem (cron) and the hooks
//! endpoint (webhook).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::connector::{Connector, ConnectorContext, ConnectorKind, ConnectorResult};

/// Manual start node; wraps the payload with trigger metadata.
pub struct StartConnector;

#[async_trait]
impl Connector for StartConnector {
    fn id(&self) -> &'static str {
        "start"
    }

    fn name(&self) -> &'static str {
        "Start Trigger"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Trigger
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        let event = config
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or("manual");
        ctx.log(format!("[start] triggered via '{event}' event"), None);

        let mut output = json!({
            "triggered": true,
            "event": event,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let (Some(out), Some(payload)) = (
            output.as_object_mut(),
            config.get("payload").and_then(Value::as_object),
        ) {
            for (key, value) in payload {
                out.insert(key.clone(), value.clone());
            }
        }

        Ok(ConnectorResult::ok(output))
    }
}

/// Webhook entry node; forwards the inbound payload unchanged.
pub struct WebhookConnector;

#[async_trait]
impl Connector for WebhookConnector {
    fn id(&self) -> &'static str {
        "webhook"
    }

    fn name(&self) -> &'static str {
        "Incoming Webhook Trigger"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Trigger
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        _config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        ctx.log("[webhook] triggered", None);
        Ok(ConnectorResult::ok(ctx.input.clone()))
    }
}

/// Cron entry node; the schedule itself is handled by the trigger subsystem.
pub struct CronConnector;

#[async_trait]
impl Connector for CronConnector {
    fn id(&self) -> &'static str {
        "cron"
    }

    fn name(&self) -> &'static str {
        "Cron Schedule Trigger"
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Trigger
    }

    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        _config: &Value,
    ) -> anyhow::Result<ConnectorResult> {
        ctx.log("[cron] fired", None);
        Ok(ConnectorResult::ok(json!({
            "trigger": "cron",
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}
