//! Basic DNS enumeration
//!
//! A records become `ip` nodes, MX and NS hosts become `server` nodes and all
//! TXT strings are grouped into a single `dns_record` node. Each record type
//! is looked up independently; an empty answer is noted and the rest carry on.

use async_trait::async_trait;
use nexus_core::{Credentials, ExecutionResult, Node, NodeData, NodeType};
use nexus_transport::DnsError;
use serde_json::Value;
use tracing::warn;

use super::search_value;
use crate::providers::Providers;
use crate::{Cost, OsintPlugin, PluginError};

pub struct DnsLookupPlugin {
    providers: Providers,
}

impl DnsLookupPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

/// Log line for a record type that produced nothing
fn missing(record: &str, err: &DnsError) -> String {
    match err {
        DnsError::NoRecords => format!("No {} records found.", record),
        DnsError::Lookup(reason) => {
            warn!("{} lookup failed: {}", record, reason);
            format!("{} lookup failed: {}", record, reason)
        }
    }
}

#[async_trait]
impl OsintPlugin for DnsLookupPlugin {
    fn name(&self) -> &str {
        "Basic DNS Enumeration"
    }

    fn description(&self) -> &str {
        "Resolve A, MX, NS, and TXT records"
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

        let mut result = ExecutionResult::explained(format!("Resolving DNS for {}...", domain));
        let dns = self.providers.dns();
        let (a, mx, ns, txt) = futures::join!(
            dns.lookup_a(domain),
            dns.lookup_mx(domain),
            dns.lookup_ns(domain),
            dns.lookup_txt(domain),
        );

        match a {
            Ok(ips) => {
                for ip in &ips {
                    let data: NodeData = [("ip", ip.to_string()), ("source", "dns_a_record".to_string())]
                        .into_iter()
                        .collect();
                    result.attach(node, Node::satellite("ip", NodeType::Ip, data, node));
                }
                result.log(format!("Found {} A records.", ips.len()));
            }
            Err(e) => result.log(missing("A", &e)),
        }

        match mx {
            Ok(records) => {
                for record in &records {
                    let data: NodeData = [
                        ("hostname", Value::from(record.exchange.as_str())),
                        ("priority", record.priority.into()),
                        ("type", "mail_server".into()),
                    ]
                    .into_iter()
                    .collect();
                    result.attach(node, Node::satellite("mx", NodeType::Server, data, node));
                }
                result.log(format!("Found {} MX records.", records.len()));
            }
            Err(e) => result.log(missing("MX", &e)),
        }

        match ns {
            Ok(servers) => {
                for server in &servers {
                    let data: NodeData = [("hostname", server.as_str()), ("type", "nameserver")]
                        .into_iter()
                        .collect();
                    result.attach(node, Node::satellite("ns", NodeType::Server, data, node));
                }
                result.log(format!("Found {} NS records.", servers.len()));
            }
            Err(e) => result.log(missing("NS", &e)),
        }

        match txt {
            Ok(records) => {
                let mut data = NodeData::new();
                data.insert("records", records.clone());
                data.insert("type", "TXT");
                result.attach(node, Node::satellite("txt", NodeType::DnsRecord, data, node));
                result.log(format!("Found {} TXT records.", records.len()));
            }
            Err(e) => result.log(missing("TXT", &e)),
        }

        Ok(result)
    }
}
