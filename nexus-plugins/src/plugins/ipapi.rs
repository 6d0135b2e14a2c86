//! IP-API geolocation (no key needed)

use async_trait::async_trait;
use nexus_core::{Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::warn;

use super::search_value;
use crate::providers::{ProviderError, Providers};
use crate::{Cost, OsintPlugin, PluginError};

pub struct IpApiPlugin {
    providers: Providers,
}

impl IpApiPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for IpApiPlugin {
    fn name(&self) -> &str {
        "IP-API Geolocation"
    }

    fn description(&self) -> &str {
        "Basic geolocation and ISP info using IP-API (Free)"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Ip]
    }

    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, _credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let ip = match search_value(node) {
            Ok(ip) => ip,
            Err(explained) => return Ok(explained),
        };

        let mut result = ExecutionResult::explained(format!("Querying IP-API for {}...", ip));
        match self.providers.ipapi_lookup(ip).await {
            Ok(geo) => {
                let mut data = NodeData::new();
                data.insert_opt("isp", geo.isp.clone());
                data.insert_opt("organization", geo.organization());
                data.insert_opt("country", geo.country.clone());
                data.insert_opt("city", geo.city.clone());
                data.insert_opt("lat", geo.lat);
                data.insert_opt("lon", geo.lon);
                data.insert_opt("timezone", geo.timezone.clone());
                data.insert_opt("asn", geo.asn.clone());
                data.insert("source", "ip-api");
                result.attach(node, Node::satellite("info_ipapi", NodeType::GeoData, data, node));
            }
            Err(ProviderError::Api(message)) => {
                result.log(format!("IP-API failed: {}", message));
            }
            Err(e) => {
                warn!("IP-API lookup for {} failed: {}", ip, e);
                result.log(format!("IP-API Request Failed: {}", e));
            }
        }
        Ok(result)
    }
}
