//! AbuseIPDB reputation checks

use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Reports older than this are ignored by the check endpoint
const MAX_AGE_DAYS: &str = "90";

#[derive(Debug, Deserialize)]
struct AbuseEnvelope {
    data: AbuseReport,
}

/// Abuse report for one address
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AbuseReport {
    pub abuse_confidence_score: Option<u32>,
    pub total_reports: Option<u64>,
    pub last_reported_at: Option<String>,
    pub usage_type: Option<String>,
    pub domain: Option<String>,
}

impl AbuseReport {
    /// Confidence rendered as a percentage string
    pub fn risk_score(&self) -> Option<String> {
        self.abuse_confidence_score.map(|score| format!("{}%", score))
    }
}

impl Providers {
    pub async fn abuseipdb_check(&self, ip: &str, api_key: &str) -> Result<AbuseReport, ProviderError> {
        info!("Querying AbuseIPDB for {}", ip);
        let url = join_url(&self.endpoints().abuseipdb, "/api/v2/check");
        let request = self
            .http()
            .get(&url)
            .query(&[("ipAddress", ip), ("maxAgeInDays", MAX_AGE_DAYS)])
            .header("Key", api_key)
            .header("Accept", "application/json");

        let envelope: AbuseEnvelope = fetch_json("AbuseIPDB", request).await?;
        Ok(envelope.data)
    }
}
