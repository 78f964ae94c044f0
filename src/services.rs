//! Injectable capability services.
//!
//! Connectors that talk to external systems (AI completion, credential
//! lookup) receive their handles through the per-run `Services` bundle
//! rather than reaching for globals. A connector that needs an absent
//! service fails its node with a service-unavailable message; the run
//! fails cleanly without touching the hosting process.

use async_trait::async_trait;
use std::sync::Arc;

/// Text-generation capability consumed by the `ai` connector.
#[async_trait]
pub trait AiService: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        system: Option<&str>,
    ) -> anyhow::Result<String>;
}

/// Credential lookup capability for connectors that need stored secrets.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
}

/// Capability handles passed into each run by the caller.
///
/// All handles are optional; a default bundle carries none.
#[derive(Default, Clone)]
pub struct Services {
    pub ai: Option<Arc<dyn AiService>>,
    pub credentials: Option<Arc<dyn CredentialStore>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("ai", &self.ai.is_some())
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}
