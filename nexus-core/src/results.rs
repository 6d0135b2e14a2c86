//! Graph mutation contract
//!
//! Two mutation styles exist and are never mixed:
//! - [`ExecutionResult`]: produced by plugins, adds satellite nodes and links
//! - [`EnrichmentResult`]: produced by pipelines, patches the input node's data

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::{Link, Node, NodeData};

/// Violations of the plugin result contract
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("result carries no log lines")]
    EmptyLogs,

    #[error("node id {0} appears more than once")]
    DuplicateNodeId(String),

    #[error("node id {0} already exists in the graph")]
    IdCollision(String),

    #[error("link {link} references unknown node {endpoint}")]
    DanglingLink { link: String, endpoint: String },

    #[error("link {0} does not connect the input node to a new node")]
    DetachedLink(String),

    #[error("node {id} has {links} links to the input node, expected 1")]
    UnpairedNode { id: String, links: usize },
}

/// Nodes and links discovered by a plugin run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub new_nodes: Vec<Node>,
    pub new_links: Vec<Link>,
    pub logs: Vec<String>,
}

impl ExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Add `node` together with the link that ties it to `anchor`
    pub fn attach(&mut self, anchor: &Node, node: Node) {
        self.new_links.push(Link::new(anchor.id.clone(), node.id.clone()));
        self.new_nodes.push(node);
    }

    /// Result that only explains why nothing was produced
    pub fn explained(line: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.log(line);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.new_nodes.is_empty() && self.new_links.is_empty()
    }

    /// Check the result against `input` and the ids already in the graph
    pub fn validate(&self, input: &Node, existing_ids: &HashSet<String>) -> Result<(), ContractError> {
        if self.logs.is_empty() {
            return Err(ContractError::EmptyLogs);
        }

        let mut new_ids: HashSet<&str> = HashSet::new();
        for node in &self.new_nodes {
            if !new_ids.insert(node.id.as_str()) || node.id == input.id {
                return Err(ContractError::DuplicateNodeId(node.id.clone()));
            }
            if existing_ids.contains(&node.id) {
                return Err(ContractError::IdCollision(node.id.clone()));
            }
        }

        let mut pairing: HashMap<&str, usize> = new_ids.iter().map(|id| (*id, 0)).collect();
        for link in &self.new_links {
            for endpoint in [&link.source, &link.target] {
                if *endpoint != input.id && !new_ids.contains(endpoint.as_str()) {
                    return Err(ContractError::DanglingLink {
                        link: link.id.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
            }

            let satellite = if link.source == input.id {
                link.target.as_str()
            } else if link.target == input.id {
                link.source.as_str()
            } else {
                return Err(ContractError::DetachedLink(link.id.clone()));
            };

            match pairing.get_mut(satellite) {
                Some(count) => *count += 1,
                None => return Err(ContractError::DetachedLink(link.id.clone())),
            }
        }

        // Report in emission order so the first offender is deterministic
        for node in &self.new_nodes {
            let links = pairing.get(node.id.as_str()).copied().unwrap_or(0);
            if links != 1 {
                return Err(ContractError::UnpairedNode {
                    id: node.id.clone(),
                    links,
                });
            }
        }

        Ok(())
    }
}

/// In-place patch for an existing node, produced by a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Pipeline tag (`ip_info`, `dns_info`, `email_info`, `phone_info`)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "enrichedData")]
    pub enriched_data: NodeData,
    /// Trace of skipped and failed provider steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

impl EnrichmentResult {
    pub fn new(kind: &str, enriched_data: NodeData) -> Self {
        Self {
            kind: kind.to_string(),
            enriched_data,
            logs: Vec::new(),
        }
    }

    /// Merge the patch into `node` and stamp its notes
    pub fn apply_to(&self, node: &mut Node) {
        node.data.merge(&self.enriched_data);

        let stamp = format!("[Auto-Complete {}]", Utc::now().format("%Y-%m-%d"));
        if node.notes.is_empty() {
            node.notes = stamp;
        } else {
            node.notes.push('\n');
            node.notes.push_str(&stamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;

    fn input() -> Node {
        Node::new("root", NodeType::Domain).with_data("domain", "example.com")
    }

    fn satellite(id: &str) -> Node {
        Node::new(id, NodeType::Domain)
    }

    #[test]
    fn test_attach_pairs_node_and_link() {
        let root = input();
        let mut result = ExecutionResult::new();
        result.attach(&root, satellite("a"));
        result.attach(&root, satellite("b"));
        result.log("Found 2 subdomains.");

        assert_eq!(result.new_nodes.len(), 2);
        assert_eq!(result.new_links.len(), 2);
        assert!(result.new_links.iter().all(|l| l.source == "root"));
        assert!(result.validate(&root, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_validate_rejects_silent_result() {
        let root = input();
        assert_eq!(
            ExecutionResult::new().validate(&root, &HashSet::new()),
            Err(ContractError::EmptyLogs)
        );
        assert!(ExecutionResult::explained("nothing to do")
            .validate(&root, &HashSet::new())
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_collisions() {
        let root = input();
        let mut result = ExecutionResult::explained("ok");
        result.attach(&root, satellite("a"));

        let existing: HashSet<String> = ["a".to_string()].into_iter().collect();
        assert_eq!(
            result.validate(&root, &existing),
            Err(ContractError::IdCollision("a".into()))
        );

        result.attach(&root, satellite("a"));
        assert_eq!(
            result.validate(&root, &HashSet::new()),
            Err(ContractError::DuplicateNodeId("a".into()))
        );
    }

    #[test]
    fn test_validate_rejects_bad_links() {
        let root = input();

        let mut dangling = ExecutionResult::explained("ok");
        dangling.new_nodes.push(satellite("a"));
        dangling.new_links.push(Link::new("root", "ghost"));
        assert!(matches!(
            dangling.validate(&root, &HashSet::new()),
            Err(ContractError::DanglingLink { .. })
        ));

        let mut unpaired = ExecutionResult::explained("ok");
        unpaired.new_nodes.push(satellite("a"));
        assert_eq!(
            unpaired.validate(&root, &HashSet::new()),
            Err(ContractError::UnpairedNode { id: "a".into(), links: 0 })
        );

        let mut sideways = ExecutionResult::explained("ok");
        sideways.attach(&root, satellite("a"));
        sideways.attach(&root, satellite("b"));
        sideways.new_links.push(Link::new("a", "b"));
        assert!(matches!(
            sideways.validate(&root, &HashSet::new()),
            Err(ContractError::DetachedLink(_))
        ));
    }

    #[test]
    fn test_execution_result_wire_names() {
        let json = serde_json::to_value(ExecutionResult::explained("x")).unwrap();
        assert!(json.get("newNodes").is_some());
        assert!(json.get("newLinks").is_some());
        assert_eq!(json["logs"][0], "x");
    }

    #[test]
    fn test_apply_patch() {
        let mut node = Node::new("ip1", NodeType::Ip).with_data("ip", "8.8.8.8");
        node.notes = "seen in phishing kit".into();

        let mut data = NodeData::new();
        data.insert("country", "United States");
        let patch = EnrichmentResult::new("ip_info", data);
        patch.apply_to(&mut node);

        assert_eq!(node.data.get_str("ip"), Some("8.8.8.8"));
        assert_eq!(node.data.get_str("country"), Some("United States"));
        assert!(node.notes.starts_with("seen in phishing kit\n[Auto-Complete "));

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["type"], "ip_info");
        assert_eq!(json["enrichedData"]["country"], "United States");
        assert!(json.get("logs").is_none());
    }
}
