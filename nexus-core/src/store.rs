//! Graph persistence seam
//!
//! The enrichment core never persists anything itself. It reads nodes through
//! [`GraphStore`] and hands back a full node/link set for an atomic replace.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::{EnrichmentResult, ExecutionResult, Link, Node, NodeData};

/// Errors from a graph store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Node and link set of one case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> HashSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Append a plugin's discovered nodes and links
    pub fn merge(&mut self, delta: ExecutionResult) {
        self.nodes.extend(delta.new_nodes);
        self.links.extend(delta.new_links);
    }

    /// Patch a node in place; false if the node is unknown
    pub fn apply_patch(&mut self, node_id: &str, patch: &EnrichmentResult) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                patch.apply_to(node);
                true
            }
            None => false,
        }
    }
}

/// Persistence operations consumed by the enrichment core
pub trait GraphStore: Send + Sync {
    /// Full graph of a case
    fn graph(&self, case_id: &str) -> Result<Graph, StoreError>;

    /// Atomically replace every node and link of a case
    fn replace_graph(&self, case_id: &str, nodes: Vec<Node>, links: Vec<Link>) -> Result<(), StoreError>;

    fn node(&self, case_id: &str, node_id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.graph(case_id)?.node(node_id).cloned())
    }
}

/// Row shape of a persisted node; `data` is stored as a JSON string
#[derive(Debug, Clone)]
struct NodeRecord {
    id: String,
    node_type: String,
    data: String,
    notes: String,
    x: f64,
    y: f64,
    date: Option<String>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.to_string(),
            data: node.data.to_json_string(),
            notes: node.notes.clone(),
            x: node.x,
            y: node.y,
            date: node.date.clone(),
        }
    }
}

impl TryFrom<&NodeRecord> for Node {
    type Error = StoreError;

    fn try_from(record: &NodeRecord) -> Result<Self, Self::Error> {
        let data = NodeData::from_json_str(&record.data).map_err(|e| StoreError::Corrupt {
            id: record.id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Node {
            id: record.id.clone(),
            node_type: record.node_type.as_str().into(),
            data,
            x: record.x,
            y: record.y,
            notes: record.notes.clone(),
            date: record.date.clone(),
        })
    }
}

#[derive(Debug, Default)]
struct CaseRecords {
    nodes: Vec<NodeRecord>,
    links: Vec<Link>,
}

/// Store that keeps serialized rows in memory
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    cases: RwLock<HashMap<String, CaseRecords>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_case(&self, case_id: &str) {
        self.cases.write().entry(case_id.to_string()).or_default();
    }
}

impl GraphStore for InMemoryGraphStore {
    fn graph(&self, case_id: &str) -> Result<Graph, StoreError> {
        let cases = self.cases.read();
        let case = cases
            .get(case_id)
            .ok_or_else(|| StoreError::CaseNotFound(case_id.to_string()))?;

        let nodes = case
            .nodes
            .iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Graph {
            nodes,
            links: case.links.clone(),
        })
    }

    fn replace_graph(&self, case_id: &str, nodes: Vec<Node>, links: Vec<Link>) -> Result<(), StoreError> {
        let records = CaseRecords {
            nodes: nodes.iter().map(NodeRecord::from).collect(),
            links,
        };

        let mut cases = self.cases.write();
        match cases.get_mut(case_id) {
            Some(case) => {
                *case = records;
                Ok(())
            }
            None => Err(StoreError::CaseNotFound(case_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;

    #[test]
    fn test_round_trip_preserves_node_identity() {
        let store = InMemoryGraphStore::new();
        store.create_case("case-1");

        let root = Node::new("root", NodeType::Ip).with_data("ip", "1.2.3.4").at(10.0, 20.0);
        let mut delta = ExecutionResult::explained("Found 2 ports");
        for port in [22, 443] {
            let mut data = NodeData::new();
            data.insert("port", port);
            data.insert("protocol", "tcp");
            data.insert("banner", "OpenSSH 9.6 \"quoted\" | ünïcode");
            delta.attach(&root, Node::satellite("port", NodeType::Port, data, &root));
        }

        let mut graph = Graph {
            nodes: vec![root.clone()],
            links: vec![],
        };
        graph.merge(delta.clone());
        store.replace_graph("case-1", graph.nodes, graph.links).unwrap();

        let reread = store.graph("case-1").unwrap();
        for emitted in &delta.new_nodes {
            let stored = reread.node(&emitted.id).expect("node persisted");
            assert_eq!(stored.node_type, emitted.node_type);
            assert_eq!(stored.data, emitted.data);
        }
        assert_eq!(reread.links, delta.new_links);
    }

    #[test]
    fn test_unknown_case() {
        let store = InMemoryGraphStore::new();
        assert!(matches!(store.graph("nope"), Err(StoreError::CaseNotFound(_))));
        assert!(store.replace_graph("nope", vec![], vec![]).is_err());
    }

    #[test]
    fn test_apply_patch() {
        let mut graph = Graph {
            nodes: vec![Node::new("e", NodeType::Email)],
            links: vec![],
        };
        let mut data = NodeData::new();
        data.insert("status", "Valid");
        let patch = EnrichmentResult::new("email_info", data);

        assert!(graph.apply_patch("e", &patch));
        assert!(!graph.apply_patch("missing", &patch));
        assert_eq!(graph.node("e").unwrap().data.get_str("status"), Some("Valid"));
    }
}
