//! Network address enrichment: Shodan, AbuseIPDB, IP-API, VirusTotal

use nexus_core::{keys, Credentials, EnrichmentResult};
use nexus_plugins::VtTarget;
use tracing::info;

use super::{require, seed, PipelineError, Pipelines, StepLog, IP_INFO};

impl Pipelines {
    /// Enrich an IP address
    ///
    /// IP-API is free and only consulted when no earlier provider reported a
    /// country.
    pub async fn enrich_address(&self, ip: &str, credentials: &Credentials) -> Result<EnrichmentResult, PipelineError> {
        let ip = require(ip)?;
        info!("Enriching address {}", ip);

        let providers = &self.providers;
        let (shodan, abuse, vt) = futures::join!(
            async {
                match credentials.get(keys::SHODAN) {
                    Some(key) => Some(providers.shodan_host(ip, key).await),
                    None => None,
                }
            },
            async {
                match credentials.get(keys::ABUSEIPDB) {
                    Some(key) => Some(providers.abuseipdb_check(ip, key).await),
                    None => None,
                }
            },
            async {
                match credentials.get(keys::VIRUSTOTAL) {
                    Some(key) => Some(providers.virustotal_report(ip, VtTarget::Ip, key).await),
                    None => None,
                }
            },
        );

        let mut data = seed();
        let mut log = StepLog::default();

        match shodan {
            None => log.skipped("Shodan"),
            Some(Err(e)) => log.failed("Shodan", &e),
            Some(Ok(host)) => {
                data.insert_opt("asn", host.asn.clone());
                data.insert_opt("isp", host.isp.clone());
                data.insert_opt("organization", host.organization());
                data.insert_opt("country", host.country_name.clone());
                data.insert_opt("city", host.city.clone());
                data.insert_opt("lat", host.latitude);
                data.insert_opt("lon", host.longitude);
                data.insert_opt("os", host.os.clone());
                data.insert_joined("ports", &host.ports, ", ");
                data.insert_joined("hostnames", &host.hostnames, ", ");
                data.insert_joined("vulns", &host.vulns, ", ");
            }
        }

        match abuse {
            None => log.skipped("AbuseIPDB"),
            Some(Err(e)) => log.failed("AbuseIPDB", &e),
            Some(Ok(report)) => {
                data.insert_opt("risk_score", report.risk_score());
                data.insert_opt("total_reports", report.total_reports);
                data.insert_opt("last_report", report.last_reported_at);
                data.insert_opt("usage_type", report.usage_type);
                data.insert_opt("domain_assoc", report.domain);
            }
        }

        if !data.contains_key("country") {
            log.note(format!("Using IP-API fallback for {}", ip));
            match providers.ipapi_lookup(ip).await {
                Ok(geo) => {
                    data.insert_opt("isp", geo.isp.clone());
                    data.insert_opt("organization", geo.organization());
                    data.insert_opt("country", geo.country.clone());
                    data.insert_opt("city", geo.city.clone());
                    data.insert_opt("lat", geo.lat);
                    data.insert_opt("lon", geo.lon);
                    data.insert_opt("timezone", geo.timezone.clone());
                    data.insert_opt("asn", geo.asn.clone());
                }
                Err(e) => log.failed("IP-API", &e),
            }
        }

        match vt {
            None => log.skipped("VirusTotal"),
            Some(Err(e)) => log.failed("VirusTotal", &e),
            Some(Ok(report)) => {
                data.insert_opt("vt_reputation", report.reputation);
                data.insert("vt_malicious", report.malicious);
                data.insert("vt_suspicious", report.suspicious);
                data.insert("vt_harmless", report.harmless);
                data.insert_opt("vt_last_analysis", report.last_analysis);
            }
        }

        let mut result = EnrichmentResult::new(IP_INFO, data);
        result.logs = log.into_lines();
        Ok(result)
    }
}
