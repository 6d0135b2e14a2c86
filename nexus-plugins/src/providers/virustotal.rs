//! VirusTotal reputation verdicts for addresses and domains

use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Object kind looked up on VirusTotal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtTarget {
    Ip,
    Domain,
}

impl VtTarget {
    fn collection(self) -> &'static str {
        match self {
            VtTarget::Ip => "ip_addresses",
            VtTarget::Domain => "domains",
        }
    }
}

#[derive(Debug, Deserialize)]
struct VtEnvelope {
    data: VtObject,
}

#[derive(Debug, Deserialize)]
struct VtObject {
    attributes: VtAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VtAttributes {
    reputation: Option<i64>,
    last_analysis_stats: VtStats,
    last_analysis_date: Option<i64>,
    whois: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct VtStats {
    malicious: u64,
    suspicious: u64,
    harmless: u64,
}

/// Normalized verdict
#[derive(Debug, Clone, PartialEq)]
pub struct VtReport {
    pub reputation: Option<i64>,
    pub malicious: u64,
    pub suspicious: u64,
    pub harmless: u64,
    /// Last analysis time as ISO 8601 (UTC, milliseconds)
    pub last_analysis: Option<String>,
    pub has_whois: bool,
}

/// Epoch seconds to `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn epoch_to_iso(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Providers {
    pub async fn virustotal_report(
        &self,
        value: &str,
        target: VtTarget,
        api_key: &str,
    ) -> Result<VtReport, ProviderError> {
        info!("Querying VirusTotal for {} ({:?})", value, target);
        let url = join_url(
            &self.endpoints().virustotal,
            &format!("/api/v3/{}/{}", target.collection(), value),
        );
        let envelope: VtEnvelope =
            fetch_json("VirusTotal", self.http().get(&url).header("x-apikey", api_key)).await?;

        let attr = envelope.data.attributes;
        Ok(VtReport {
            reputation: attr.reputation,
            malicious: attr.last_analysis_stats.malicious,
            suspicious: attr.last_analysis_stats.suspicious,
            harmless: attr.last_analysis_stats.harmless,
            last_analysis: attr.last_analysis_date.and_then(epoch_to_iso),
            has_whois: attr.whois.is_some_and(|w| !w.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::providers_at;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_epoch_to_iso() {
        assert_eq!(epoch_to_iso(1704067200).as_deref(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_domain_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/domains/evil.test"))
            .and(header("x-apikey", "vk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "attributes": {
                        "reputation": -12,
                        "last_analysis_stats": {"malicious": 7, "suspicious": 1, "harmless": 60, "undetected": 20},
                        "last_analysis_date": 1704067200
                    }
                }
            })))
            .mount(&server)
            .await;

        let report = providers_at(&server.uri())
            .virustotal_report("evil.test", VtTarget::Domain, "vk")
            .await
            .unwrap();
        assert_eq!(report.reputation, Some(-12));
        assert_eq!(report.malicious, 7);
        assert_eq!(report.suspicious, 1);
        assert_eq!(report.last_analysis.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert!(!report.has_whois);
    }
}
