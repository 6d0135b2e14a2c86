//! Graph-expanding plugins
//!
//! Each plugin reads the identifying value of its input node, asks one
//! provider about it and returns satellite nodes, each tied to the input node
//! by exactly one link. Missing keys and provider failures are reported in the
//! result logs rather than as errors.

use nexus_core::{ExecutionResult, Node};

pub mod abuseipdb;
pub mod crtsh;
pub mod dns;
pub mod hunter;
pub mod ipapi;
pub mod numverify;
pub mod sherlock;
pub mod shodan;
pub mod virustotal;

pub use abuseipdb::AbuseIpDbPlugin;
pub use crtsh::CrtShPlugin;
pub use dns::DnsLookupPlugin;
pub use hunter::HunterPlugin;
pub use ipapi::IpApiPlugin;
pub use numverify::NumverifyPlugin;
pub use sherlock::{parse_hits, ProfileHit, SherlockHits, SherlockPlugin};
pub use shodan::ShodanPlugin;
pub use virustotal::VirusTotalPlugin;

/// The node's search value, or a result explaining why there is none
pub(crate) fn search_value(node: &Node) -> Result<&str, ExecutionResult> {
    node.search_value().ok_or_else(|| {
        let keys = node.node_type.identifying_keys();
        let wanted = if keys.is_empty() {
            "an identifying".to_string()
        } else {
            keys.join("/")
        };
        ExecutionResult::explained(format!(
            "Error: Input node does not contain a {} field in data.",
            wanted
        ))
    })
}
