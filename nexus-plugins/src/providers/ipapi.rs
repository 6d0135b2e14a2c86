//! IP-API geolocation (free, no key)

use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Geolocation answer; `status` is `success` or `fail`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeoInfo {
    pub status: Option<String>,
    pub message: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    #[serde(rename = "as")]
    pub asn: Option<String>,
}

impl GeoInfo {
    pub fn organization(&self) -> Option<&str> {
        self.org
            .as_deref()
            .filter(|o| !o.is_empty())
            .or(self.isp.as_deref())
    }
}

impl Providers {
    pub async fn ipapi_lookup(&self, ip: &str) -> Result<GeoInfo, ProviderError> {
        info!("Querying IP-API for {}", ip);
        let url = join_url(&self.endpoints().ipapi, &format!("/json/{}", ip));
        let geo: GeoInfo = fetch_json("IP-API", self.http().get(&url)).await?;

        if geo.status.as_deref() == Some("fail") {
            return Err(ProviderError::Api(
                geo.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }
        Ok(geo)
    }
}
