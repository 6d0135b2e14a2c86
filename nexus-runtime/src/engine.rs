//! Enrichment engine
//!
//! Facade over the pipelines and the plugin registry. It is what a transport
//! layer (HTTP routes, CLI) talks to: pipelines patch an existing node,
//! plugins grow the graph around it.

use anyhow::Context;
use nexus_core::{
    ContractError, Credentials, EnrichmentResult, ExecutionResult, GraphStore, Node, NodeType,
    StoreError,
};
use nexus_plugins::{PluginError, PluginInfo, PluginRegistry, Providers, RegistryError};
use nexus_transport::{create_http_client, HickoryResolver, ProcessWorker};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::pipelines::{PipelineError, Pipelines};

/// Errors from engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Plugin failed: {0}")]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("No enrichment pipeline for {0} nodes")]
    NoPipeline(NodeType),

    #[error("Node {0} has no value to search for")]
    MissingValue(String),

    #[error("Node {node_id} not found in case {case_id}")]
    NodeNotFound { case_id: String, node_id: String },

    #[error("Plugin result rejected: {0}")]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => EngineError::PluginNotFound(name),
            RegistryError::Plugin(e) => EngineError::Plugin(e),
            other => EngineError::Registry(other),
        }
    }
}

/// Answer to a pipeline request
#[derive(Debug, Clone, Serialize)]
pub struct EnrichResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EnrichmentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichResponse {
    fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

/// Shared, immutable entry point to enrichment
#[derive(Clone)]
pub struct Engine {
    pipelines: Pipelines,
    registry: Arc<PluginRegistry>,
}

impl Engine {
    pub fn new(pipelines: Pipelines, registry: PluginRegistry) -> Self {
        Self {
            pipelines,
            registry: Arc::new(registry),
        }
    }

    /// Engine wired to the real providers, system DNS and built-in plugins
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let http = create_http_client(&config.http).context("building HTTP client")?;
        let providers = Providers::new(
            http,
            config.endpoints.clone(),
            Arc::new(HickoryResolver::from_system_conf()),
        );
        let registry = PluginRegistry::with_defaults(
            providers.clone(),
            ProcessWorker::new(config.worker.clone()),
        );
        Ok(Self::new(Pipelines::new(providers), registry))
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Whether `node_type` has an enrichment pipeline
    pub fn has_pipeline(node_type: &NodeType) -> bool {
        matches!(
            node_type,
            NodeType::Ip | NodeType::Domain | NodeType::Email | NodeType::Phone
        )
    }

    async fn run_pipeline(
        &self,
        node_type: &NodeType,
        value: &str,
        credentials: &Credentials,
    ) -> Result<EnrichmentResult, EngineError> {
        let result = match node_type {
            NodeType::Ip => self.pipelines.enrich_address(value, credentials).await?,
            NodeType::Domain => self.pipelines.enrich_domain(value, credentials).await?,
            NodeType::Email => self.pipelines.enrich_email(value, credentials).await?,
            NodeType::Phone => self.pipelines.enrich_phone(value, credentials).await?,
            other => return Err(EngineError::NoPipeline(other.clone())),
        };
        Ok(result)
    }

    /// Run the pipeline for `node_type` on a raw value
    pub async fn enrich(&self, node_type: &NodeType, value: &str, credentials: &Credentials) -> EnrichResponse {
        info!("Enrichment request for type {}", node_type);
        match self.run_pipeline(node_type, value, credentials).await {
            Ok(result) => EnrichResponse {
                success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                warn!("Enrichment for {} failed: {}", node_type, e);
                EnrichResponse::failed(e)
            }
        }
    }

    /// Enrich `node` from its own data and patch it in place
    pub async fn enrich_node(&self, node: &mut Node, credentials: &Credentials) -> Result<EnrichmentResult, EngineError> {
        if !Self::has_pipeline(&node.node_type) {
            return Err(EngineError::NoPipeline(node.node_type.clone()));
        }
        let value = node
            .search_value()
            .ok_or_else(|| EngineError::MissingValue(node.id.clone()))?
            .to_string();

        let result = self.run_pipeline(&node.node_type, &value, credentials).await?;
        result.apply_to(node);
        Ok(result)
    }

    pub fn list_plugins_for_type(&self, node_type: &NodeType) -> Vec<PluginInfo> {
        self.registry
            .plugins_for_type(node_type)
            .iter()
            .map(|p| p.info())
            .collect()
    }

    pub async fn run_plugin(&self, name: &str, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, EngineError> {
        Ok(self.registry.execute(name, node, credentials).await?)
    }

    /// Run a plugin on a stored node and persist what it found
    ///
    /// The graph is read again once the plugin returns, so edits made to the
    /// case while it ran are kept. The delta is checked against that graph
    /// before anything is written; a rejected delta leaves the case untouched.
    /// The final read and the replace are not atomic across writers: a write
    /// landing between them is lost (last writer wins).
    pub async fn expand(
        &self,
        store: &dyn GraphStore,
        case_id: &str,
        node_id: &str,
        plugin: &str,
        credentials: &Credentials,
    ) -> Result<ExecutionResult, EngineError> {
        let not_found = || EngineError::NodeNotFound {
            case_id: case_id.to_string(),
            node_id: node_id.to_string(),
        };
        let node = store.node(case_id, node_id)?.ok_or_else(not_found)?;

        let delta = self.run_plugin(plugin, &node, credentials).await?;

        let mut graph = store.graph(case_id)?;
        if graph.node(node_id).is_none() {
            return Err(not_found());
        }
        delta.validate(&node, &graph.node_ids())?;

        info!(
            "Plugin {} added {} nodes to case {}",
            plugin,
            delta.new_nodes.len(),
            case_id
        );
        graph.merge(delta.clone());
        store.replace_graph(case_id, graph.nodes, graph.links)?;
        Ok(delta)
    }
}
