//! Shodan host lookups (paid)

use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Host report from `/shodan/host/{ip}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShodanHost {
    pub ip_str: Option<String>,
    pub asn: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub os: Option<String>,
    pub ports: Vec<u16>,
    pub hostnames: Vec<String>,
    pub vulns: Vec<String>,
}

impl ShodanHost {
    /// Owning organization, falling back to the ISP
    pub fn organization(&self) -> Option<&str> {
        self.org
            .as_deref()
            .filter(|o| !o.is_empty())
            .or(self.isp.as_deref())
    }
}

impl Providers {
    pub async fn shodan_host(&self, ip: &str, api_key: &str) -> Result<ShodanHost, ProviderError> {
        info!("Querying Shodan for {}", ip);
        let url = join_url(&self.endpoints().shodan, &format!("/shodan/host/{}", ip));
        fetch_json("Shodan", self.http().get(&url).query(&[("key", api_key)])).await
    }
}
