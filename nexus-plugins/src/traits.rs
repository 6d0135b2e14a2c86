//! Plugin contract

use async_trait::async_trait;
use nexus_core::{Credentials, ExecutionResult, Node, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors a plugin raises instead of reporting through its logs
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("External tool failed: {0}")]
    Worker(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Advisory cost tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cost {
    Free,
    Paid,
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Free => f.write_str("free"),
            Cost::Paid => f.write_str("paid"),
        }
    }
}

/// Metadata shown to a caller choosing what to run on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub accepted_types: Vec<NodeType>,
    pub cost: Cost,
}

/// A named capability that expands a node into satellite nodes
#[async_trait]
pub trait OsintPlugin: Send + Sync {
    /// Unique dispatch key
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn version(&self) -> &str {
        "1.0"
    }

    fn author(&self) -> &str {
        "Nexus Team"
    }

    /// Node types this plugin may run against
    fn accepted_types(&self) -> &[NodeType];

    fn cost(&self) -> Cost;

    /// Run against `node`; partial failures go to the result logs
    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError>;

    fn accepts(&self, node_type: &NodeType) -> bool {
        self.accepted_types().contains(node_type)
    }

    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            version: self.version().to_string(),
            author: self.author().to_string(),
            accepted_types: self.accepted_types().to_vec(),
            cost: self.cost(),
        }
    }
}
