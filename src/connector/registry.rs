//! Connector registry with normalized, aliased lookup.
//!
//! Maps node type identifiers to connector implementations. Lookup first
//! normalizes the identifier (lowercase, strip whitespace/hyphen/underscore),
//! then consults an alias table for historically-renamed identifiers, so
//! "discord-webhook", "discord_webhook", and "discord" all resolve to one
//! connector. Unknown identifiers return `None`; the dispatcher turns that
//! into a typed error carrying the offending node id.

use std::collections::HashMap;
use std::sync::Arc;

use super::builtin;
use super::Connector;

/// In-memory connector registry. Built once at startup and shared read-only.
pub struct ConnectorRegistry {
    /// Canonical key -> connector
    connectors: HashMap<String, Arc<dyn Connector>>,
    /// Normalized alias -> canonical key
    aliases: HashMap<String, String>,
}

/// Normalize an identifier into a canonical lookup key.
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect()
}

impl ConnectorRegistry {
    /// Empty registry; useful for tests that register their own fakes.
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registry preloaded with every built-in connector and the
    /// historical alias table.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(builtin::print::PrintConnector));
        registry.register(Arc::new(builtin::delay::DelayConnector));
        registry.register(Arc::new(builtin::random::RandomConnector));
        registry.register(Arc::new(builtin::math::MathConnector));
        registry.register(Arc::new(builtin::condition::ConditionConnector));
        registry.register(Arc::new(builtin::http::HttpConnector::new()));
        registry.register(Arc::new(builtin::discord::DiscordConnector::new()));
        registry.register(Arc::new(builtin::ai::AiConnector));
        registry.register(Arc::new(builtin::trigger::StartConnector));
        registry.register(Arc::new(builtin::trigger::WebhookConnector));
        registry.register(Arc::new(builtin::trigger::CronConnector));

        // Historical renames. Keys are stored normalized, so variations
        // like "discord-webhook" and "Discord_Webhook" land on one entry.
        registry.alias("discord-webhook", "discord");
        registry.alias("discord_webhook", "discord");
        registry.alias("log", "print");
        registry.alias("console", "print");
        registry.alias("http-request", "http");
        registry.alias("schedule", "cron");

        registry
    }

    /// Register a connector under its normalized canonical id.
    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        let key = normalize_key(connector.id());
        self.connectors.insert(key, connector);
    }

    /// Map an alternate identifier onto an already-registered canonical id.
    pub fn alias(&mut self, from: &str, to: &str) {
        self.aliases.insert(normalize_key(from), normalize_key(to));
    }

    /// Resolve a node type identifier to a connector.
    ///
    /// Deterministic and case/format-insensitive; returns `None` rather
    /// than erroring for unknown identifiers.
    pub fn resolve(&self, type_identifier: &str) -> Option<Arc<dyn Connector>> {
        let key = normalize_key(type_identifier);
        if let Some(connector) = self.connectors.get(&key) {
            return Some(Arc::clone(connector));
        }
        let canonical = self.aliases.get(&key)?;
        self.connectors.get(canonical).map(Arc::clone)
    }

    /// All registered connectors, for the editor palette endpoint.
    pub fn list(&self) -> Vec<Arc<dyn Connector>> {
        self.connectors.values().map(Arc::clone).collect()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_case_and_format_insensitively() {
        let registry = ConnectorRegistry::with_builtins();
        for variant in ["print", "PRINT", " Print ", "p_r_i_n_t"] {
            let connector = registry.resolve(variant).expect(variant);
            assert_eq!(connector.id(), "print");
        }
    }

    #[test]
    fn alias_table_folds_renamed_identifiers() {
        let registry = ConnectorRegistry::with_builtins();
        for variant in ["discord", "discord-webhook", "discord_webhook", "Discord Webhook"] {
            let connector = registry.resolve(variant).expect(variant);
            assert_eq!(connector.id(), "discord");
        }
        assert_eq!(registry.resolve("log").unwrap().id(), "print");
        assert_eq!(registry.resolve("http-request").unwrap().id(), "http");
    }

    #[test]
    fn unknown_identifier_returns_none() {
        let registry = ConnectorRegistry::with_builtins();
        assert!(registry.resolve("bogus").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn list_contains_builtins() {
        let registry = ConnectorRegistry::with_builtins();
        let ids: Vec<&str> = registry.list().iter().map(|c| c.id()).collect();
        assert!(ids.contains(&"print"));
        assert!(ids.contains(&"http"));
        assert!(ids.contains(&"cron"));
    }
}
