//! RDAP registration data (free replacement for WHOIS)

use serde_json::Value;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Registration facts extracted from an RDAP domain object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RdapRecord {
    pub registrar: Option<String>,
    pub creation_date: Option<String>,
    pub expiry_date: Option<String>,
    pub status: Vec<String>,
}

impl RdapRecord {
    /// Pull the fields out of a raw RDAP document; every level may be missing
    pub fn from_json(doc: &Value) -> Self {
        // entities[0].vcardArray[1] is a list of [name, params, type, value]
        let registrar = doc["entities"][0]["vcardArray"][1]
            .as_array()
            .and_then(|props| props.iter().find(|p| p[0].as_str() == Some("fn")))
            .and_then(|p| p[3].as_str())
            .map(str::to_string);

        let event = |action: &str| {
            doc["events"].as_array().and_then(|events| {
                events
                    .iter()
                    .find(|e| e["eventAction"].as_str() == Some(action))
                    .and_then(|e| e["eventDate"].as_str())
                    .map(str::to_string)
            })
        };

        let status = doc["status"]
            .as_array()
            .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            registrar,
            creation_date: event("registration"),
            expiry_date: event("expiration"),
            status,
        }
    }
}

impl Providers {
    pub async fn rdap_domain(&self, domain: &str) -> Result<RdapRecord, ProviderError> {
        info!("Querying RDAP for {}", domain);
        let url = join_url(&self.endpoints().rdap, &format!("/domain/{}", domain));
        let doc: Value = fetch_json("RDAP", self.http().get(&url)).await?;
        Ok(RdapRecord::from_json(&doc))
    }
}
