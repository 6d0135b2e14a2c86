//! VirusTotal verdicts for addresses and domains

use async_trait::async_trait;
use nexus_core::{keys, Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::{debug, warn};

use super::search_value;
use crate::providers::{Providers, VtTarget};
use crate::{Cost, OsintPlugin, PluginError};

pub struct VirusTotalPlugin {
    providers: Providers,
}

impl VirusTotalPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for VirusTotalPlugin {
    fn name(&self) -> &str {
        "VirusTotal Reputation"
    }

    fn description(&self) -> &str {
        "Check reputation of IP or Domain on VirusTotal"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Ip, NodeType::Domain]
    }

    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let target = match node.node_type {
            NodeType::Ip => VtTarget::Ip,
            NodeType::Domain => VtTarget::Domain,
            ref other => {
                return Err(PluginError::InvalidInput(format!(
                    "VirusTotal cannot look up {} nodes",
                    other
                )))
            }
        };
        let value = match search_value(node) {
            Ok(value) => value,
            Err(explained) => return Ok(explained),
        };
        let Some(api_key) = credentials.get(keys::VIRUSTOTAL) else {
            debug!("No VirusTotal key, skipping {}", value);
            return Ok(ExecutionResult::explained("Skipping VirusTotal: No API Key provided."));
        };

        let mut result = ExecutionResult::explained(format!(
            "Querying VirusTotal for {} ({})...",
            value, node.node_type
        ));
        match self.providers.virustotal_report(value, target, api_key).await {
            Ok(report) => {
                let mut data = NodeData::new();
                data.insert_opt("reputation", report.reputation);
                data.insert("malicious", report.malicious);
                data.insert("suspicious", report.suspicious);
                data.insert("harmless", report.harmless);
                data.insert_opt("last_analysis", report.last_analysis);
                data.insert("source", "virustotal");
                result.attach(node, Node::satellite("rep_vt", NodeType::VtReport, data, node));
            }
            Err(e) => {
                warn!("VirusTotal lookup for {} failed: {}", value, e);
                result.log(format!("VirusTotal Request Failed: {}", e));
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::assert_contract;
    use crate::providers::testing::providers_at;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_domain_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"attributes": {
                    "reputation": -4,
                    "last_analysis_stats": {"malicious": 2, "suspicious": 0, "harmless": 60},
                    "last_analysis_date": 1704067200
                }}
            })))
            .mount(&server)
            .await;

        let plugin = VirusTotalPlugin::new(providers_at(&server.uri()));
        let input = Node::new("d1", NodeType::Domain).with_data("domain", "example.com");
        let result = plugin
            .execute(&input, &Credentials::new().with(keys::VIRUSTOTAL, "vk"))
            .await
            .unwrap();

        assert_contract(&result, &input);
        assert_eq!(result.logs[0], "Querying VirusTotal for example.com (domain)...");
        let report = &result.new_nodes[0];
        assert_eq!(report.node_type, NodeType::VtReport);
        assert_eq!(report.data.get("malicious"), Some(&2.into()));
        assert_eq!(report.data.get_str("last_analysis"), Some("2024-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_rejects_other_types() {
        let plugin = VirusTotalPlugin::new(providers_at("http://127.0.0.1:9"));
        let input = Node::new("e1", NodeType::Email).with_data("email", "a@b.c");
        let err = plugin.execute(&input, &Credentials::new()).await.unwrap_err();
        assert!(matches!(err, PluginError::InvalidInput(_)));
    }
}
