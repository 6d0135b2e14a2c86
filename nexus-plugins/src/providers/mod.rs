//! External intelligence providers
//!
//! One module per service. Each exposes a typed lookup on [`Providers`] and a
//! normalized response; callers decide how failures are reported.

use nexus_transport::SharedResolver;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub mod abuseipdb;
pub mod crtsh;
pub mod hunter;
pub mod ipapi;
pub mod numverify;
pub mod rdap;
pub mod shodan;
pub mod virustotal;

pub use abuseipdb::*;
pub use crtsh::*;
pub use hunter::*;
pub use ipapi::*;
pub use numverify::*;
pub use rdap::*;
pub use shodan::*;
pub use virustotal::*;

/// Errors from provider calls
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} returned {status}: {detail}")]
    Status {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Base URL of every provider
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub shodan: String,
    pub abuseipdb: String,
    pub ipapi: String,
    pub virustotal: String,
    pub rdap: String,
    pub crtsh: String,
    pub hunter: String,
    pub numverify: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            shodan: "https://api.shodan.io".to_string(),
            abuseipdb: "https://api.abuseipdb.com".to_string(),
            ipapi: "http://ip-api.com".to_string(),
            virustotal: "https://www.virustotal.com".to_string(),
            rdap: "https://rdap.org".to_string(),
            crtsh: "https://crt.sh".to_string(),
            hunter: "https://api.hunter.io".to_string(),
            numverify: "http://apilayer.net".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at one host (mock servers, proxies)
    pub fn all(base: &str) -> Self {
        let base = base.to_string();
        Self {
            shodan: base.clone(),
            abuseipdb: base.clone(),
            ipapi: base.clone(),
            virustotal: base.clone(),
            rdap: base.clone(),
            crtsh: base.clone(),
            hunter: base.clone(),
            numverify: base,
        }
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Shared handles every provider lookup needs
#[derive(Clone)]
pub struct Providers {
    http: Client,
    endpoints: Endpoints,
    dns: SharedResolver,
}

impl Providers {
    pub fn new(http: Client, endpoints: Endpoints, dns: SharedResolver) -> Self {
        Self { http, endpoints, dns }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn dns(&self) -> &SharedResolver {
        &self.dns
    }
}

/// Send `request` and decode a JSON body, mapping every failure mode
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Parse(format!("{}: {}", provider, e)))
}

/// Prefer the provider's own `error` message over the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match &v["error"] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(o) => o
                .get("message")
                .or_else(|| o.get("type"))
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use nexus_transport::{create_http_client, HttpConfig, StaticResolver};
    use std::sync::Arc;

    pub fn providers_at(base: &str) -> Providers {
        providers_with_dns(base, StaticResolver::new())
    }

    pub fn providers_with_dns(base: &str, resolver: StaticResolver) -> Providers {
        let http = create_http_client(&HttpConfig::default()).unwrap();
        Providers::new(http, Endpoints::all(base), Arc::new(resolver))
    }
}
