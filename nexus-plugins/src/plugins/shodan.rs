//! Shodan host report and open ports

use async_trait::async_trait;
use nexus_core::{keys, Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::{debug, warn};

use super::search_value;
use crate::providers::Providers;
use crate::{Cost, OsintPlugin, PluginError};

pub struct ShodanPlugin {
    providers: Providers,
}

impl ShodanPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for ShodanPlugin {
    fn name(&self) -> &str {
        "Shodan IP Enrichment"
    }

    fn description(&self) -> &str {
        "Gather vulnerability and host information from Shodan"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Ip]
    }

    fn cost(&self) -> Cost {
        Cost::Paid
    }

    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let ip = match search_value(node) {
            Ok(ip) => ip,
            Err(explained) => return Ok(explained),
        };
        let Some(api_key) = credentials.get(keys::SHODAN) else {
            debug!("No Shodan key, skipping {}", ip);
            return Ok(ExecutionResult::explained("Skipping Shodan: No API Key provided."));
        };

        let mut result = ExecutionResult::explained(format!("Querying Shodan for {}...", ip));
        let host = match self.providers.shodan_host(ip, api_key).await {
            Ok(host) => host,
            Err(e) => {
                warn!("Shodan lookup for {} failed: {}", ip, e);
                result.log(format!("Shodan Request Failed: {}", e));
                return Ok(result);
            }
        };

        let mut report = NodeData::new();
        report.insert_opt("asn", host.asn.clone());
        report.insert_opt("isp", host.isp.clone());
        report.insert_opt("organization", host.organization());
        report.insert_opt("country", host.country_name.clone());
        report.insert_opt("city", host.city.clone());
        report.insert_opt("lat", host.latitude);
        report.insert_opt("lon", host.longitude);
        report.insert_opt("os", host.os.clone());
        report.insert("ports", host.ports.clone());
        report.insert("hostnames", host.hostnames.clone());
        report.insert("vulns", host.vulns.clone());
        report.insert("source", "shodan");
        result.attach(node, Node::satellite("rep_shodan", NodeType::ShodanData, report, node));

        for port in &host.ports {
            let data: NodeData = [
                ("port", serde_json::Value::from(*port)),
                ("protocol", "tcp".into()),
                ("service", "unknown".into()),
            ]
            .into_iter()
            .collect();
            result.attach(node, Node::satellite("port", NodeType::Port, data, node));
        }

        result.log(format!("Shodan reported {} open ports.", host.ports.len()));
        Ok(result)
    }
}
