//! AbuseIPDB reputation report

use async_trait::async_trait;
use nexus_core::{keys, Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::{debug, warn};

use super::search_value;
use crate::providers::Providers;
use crate::{Cost, OsintPlugin, PluginError};

pub struct AbuseIpDbPlugin {
    providers: Providers,
}

impl AbuseIpDbPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for AbuseIpDbPlugin {
    fn name(&self) -> &str {
        "AbuseIPDB Check"
    }

    fn description(&self) -> &str {
        "Check IP reputation against AbuseIPDB database"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Ip]
    }

    // the key is free to obtain
    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let ip = match search_value(node) {
            Ok(ip) => ip,
            Err(explained) => return Ok(explained),
        };
        let Some(api_key) = credentials.get(keys::ABUSEIPDB) else {
            debug!("No AbuseIPDB key, skipping {}", ip);
            return Ok(ExecutionResult::explained("Skipping AbuseIPDB: No API Key provided."));
        };

        let mut result = ExecutionResult::explained(format!("Querying AbuseIPDB for {}...", ip));
        match self.providers.abuseipdb_check(ip, api_key).await {
            Ok(report) => {
                let mut data = NodeData::new();
                data.insert_opt("risk_score", report.abuse_confidence_score);
                data.insert_opt("total_reports", report.total_reports);
                data.insert_opt("last_report", report.last_reported_at);
                data.insert_opt("usage_type", report.usage_type);
                data.insert_opt("domain_assoc", report.domain);
                data.insert("source", "abuseipdb");
                result.attach(node, Node::satellite("rep_abuseipdb", NodeType::ReputationData, data, node));
            }
            Err(e) => {
                warn!("AbuseIPDB lookup for {} failed: {}", ip, e);
                result.log(format!("AbuseIPDB Request Failed: {}", e));
            }
        }
        Ok(result)
    }
}
