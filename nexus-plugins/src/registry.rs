//! Plugin registry
//!
//! Built once at startup and shared read-only afterwards. Registration order
//! is preserved and is the order callers see when listing plugins.

use nexus_core::{Credentials, ExecutionResult, Node, NodeType};
use nexus_transport::ProcessWorker;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::plugins::{
    AbuseIpDbPlugin, CrtShPlugin, DnsLookupPlugin, HunterPlugin, IpApiPlugin, NumverifyPlugin,
    SherlockPlugin, ShodanPlugin, VirusTotalPlugin,
};
use crate::providers::Providers;
use crate::{OsintPlugin, PluginError};

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Plugin {0} not found")]
    NotFound(String),

    #[error("Plugin {0} is already registered")]
    Duplicate(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Thread-safe reference to a plugin
pub type SharedPlugin = Arc<dyn OsintPlugin>;

/// Ordered collection of plugins addressed by name
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<SharedPlugin>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin
    pub fn with_defaults(providers: Providers, worker: ProcessWorker) -> Self {
        let builtin: Vec<SharedPlugin> = vec![
            Arc::new(ShodanPlugin::new(providers.clone())),
            Arc::new(AbuseIpDbPlugin::new(providers.clone())),
            Arc::new(IpApiPlugin::new(providers.clone())),
            Arc::new(VirusTotalPlugin::new(providers.clone())),
            Arc::new(DnsLookupPlugin::new(providers.clone())),
            Arc::new(CrtShPlugin::new(providers.clone())),
            Arc::new(HunterPlugin::new(providers.clone())),
            Arc::new(NumverifyPlugin::new(providers)),
            Arc::new(SherlockPlugin::new(worker)),
        ];

        info!("Registered {} built-in plugins", builtin.len());
        Self { plugins: builtin }
    }

    /// Append a plugin; names must be unique
    pub fn register(&mut self, plugin: SharedPlugin) -> Result<(), RegistryError> {
        if self.get(plugin.name()).is_some() {
            return Err(RegistryError::Duplicate(plugin.name().to_string()));
        }
        debug!("Registered plugin {}", plugin.name());
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SharedPlugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Plugins accepting `node_type`, in registration order
    pub fn plugins_for_type(&self, node_type: &NodeType) -> Vec<SharedPlugin> {
        self.plugins
            .iter()
            .filter(|p| p.accepts(node_type))
            .cloned()
            .collect()
    }

    /// Run the named plugin against `node`
    ///
    /// The node type is not checked against the plugin's accepted types.
    pub async fn execute(
        &self,
        name: &str,
        node: &Node,
        credentials: &Credentials,
    ) -> Result<ExecutionResult, RegistryError> {
        let plugin = self
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        info!("Running plugin {} on node {}", name, node.id);
        Ok(plugin.execute(node, credentials).await?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedPlugin> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::providers_at;
    use crate::Cost;
    use async_trait::async_trait;

    struct EchoPlugin {
        name: &'static str,
        types: Vec<NodeType>,
    }

    #[async_trait]
    impl OsintPlugin for EchoPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes the node id"
        }

        fn accepted_types(&self) -> &[NodeType] {
            &self.types
        }

        fn cost(&self) -> Cost {
            Cost::Free
        }

        async fn execute(&self, node: &Node, _credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
            Ok(ExecutionResult::explained(format!("{} saw {}", self.name, node.id)))
        }
    }

    fn echo(name: &'static str, types: &[NodeType]) -> SharedPlugin {
        Arc::new(EchoPlugin {
            name,
            types: types.to_vec(),
        })
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = PluginRegistry::new();
        registry.register(echo("a", &[NodeType::Ip])).unwrap();
        let err = registry.register(echo("a", &[NodeType::Domain])).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_plugins_for_type_keeps_order() {
        let mut registry = PluginRegistry::new();
        registry.register(echo("first", &[NodeType::Ip, NodeType::Domain])).unwrap();
        registry.register(echo("second", &[NodeType::Email])).unwrap();
        registry.register(echo("third", &[NodeType::Ip])).unwrap();

        let names: Vec<_> = registry
            .plugins_for_type(&NodeType::Ip)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "third"]);
        assert!(registry.plugins_for_type(&NodeType::Crypto).is_empty());
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_exact_name() {
        let mut registry = PluginRegistry::new();
        registry.register(echo("echo", &[NodeType::Ip])).unwrap();

        // eligibility is the caller's concern
        let node = Node::new("e1", NodeType::Email);
        let result = registry.execute("echo", &node, &Credentials::new()).await.unwrap();
        assert_eq!(result.logs, vec!["echo saw e1"]);

        let err = registry.execute("Echo", &node, &Credentials::new()).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(name) if name == "Echo"));
    }

    #[test]
    fn test_default_registration_order() {
        let registry = PluginRegistry::with_defaults(providers_at("http://127.0.0.1:9"), ProcessWorker::default());
        let names: Vec<_> = registry.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Shodan IP Enrichment",
                "AbuseIPDB Check",
                "IP-API Geolocation",
                "VirusTotal Reputation",
                "Basic DNS Enumeration",
                "CRT.sh Subdomain Enumeration",
                "Hunter.io Email Lookup",
                "Numverify Phone Lookup",
                "Sherlock",
            ]
        );

        let domain: Vec<_> = registry
            .plugins_for_type(&NodeType::Domain)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(
            domain,
            vec!["VirusTotal Reputation", "Basic DNS Enumeration", "CRT.sh Subdomain Enumeration"]
        );
        assert_eq!(registry.plugins_for_type(&NodeType::Identity)[0].info().author, "Sherlock Project (Wrapped)");
    }
}
