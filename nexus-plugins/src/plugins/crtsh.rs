//! Subdomain discovery from certificate-transparency logs

use async_trait::async_trait;
use nexus_core::{Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::warn;

use super::search_value;
use crate::providers::{Providers, MAX_SUBDOMAINS};
use crate::{Cost, OsintPlugin, PluginError};

pub struct CrtShPlugin {
    providers: Providers,
}

impl CrtShPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for CrtShPlugin {
    fn name(&self) -> &str {
        "CRT.sh Subdomain Enumeration"
    }

    fn description(&self) -> &str {
        "Find subdomains using SSL certificate transparency logs via crt.sh"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Domain]
    }

    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, _credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let domain = match search_value(node) {
            Ok(domain) => domain,
            Err(explained) => return Ok(explained),
        };

        let mut result = ExecutionResult::explained(format!("Querying crt.sh for {}...", domain));
        let lookup = match self.providers.crtsh_subdomains(domain).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!("crt.sh lookup for {} failed: {}", domain, e);
                result.log(format!("Error executing crt.sh lookup: {}", e));
                return Ok(result);
            }
        };

        result.log(format!("Found {} unique subdomains.", lookup.total_unique));
        if lookup.total_unique > MAX_SUBDOMAINS {
            result.log(format!("Keeping the first {}.", MAX_SUBDOMAINS));
        }

        for sub in lookup.subdomains {
            let data: NodeData = [("domain", sub), ("source", "crt.sh".to_string())]
                .into_iter()
                .collect();
            result.attach(node, Node::satellite("auto", NodeType::Domain, data, node));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::assert_contract;
    use crate::providers::testing::providers_at;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_subdomain_nodes_are_capped() {
        let entries: Vec<_> = (0..80)
            .map(|i| serde_json::json!({"name_value": format!("h{}.corp.io\n*.corp.io\ncorp.io", i)}))
            .collect();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "%.corp.io"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entries))
            .mount(&server)
            .await;

        let plugin = CrtShPlugin::new(providers_at(&server.uri()));
        let input = Node::new("d1", NodeType::Domain).with_data("domain", "corp.io");
        let result = plugin.execute(&input, &Credentials::new()).await.unwrap();

        assert_contract(&result, &input);
        assert_eq!(result.new_nodes.len(), MAX_SUBDOMAINS);
        assert!(result.logs.contains(&"Found 80 unique subdomains.".to_string()));
        assert!(result
            .new_nodes
            .iter()
            .all(|n| n.node_type == NodeType::Domain && n.data.get_str("domain") != Some("corp.io")));
    }

    #[tokio::test]
    async fn test_missing_domain_field() {
        let plugin = CrtShPlugin::new(providers_at("http://127.0.0.1:9"));
        let input = Node::new("d1", NodeType::Domain);
        let result = plugin.execute(&input, &Credentials::new()).await.unwrap();
        assert!(result.is_empty());
        assert!(result.logs[0].starts_with("Error: Input node does not contain a domain field"));
    }
}
