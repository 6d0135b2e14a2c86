//! Domain enrichment: DNS records, RDAP registration and crt.sh subdomains

use nexus_core::{Credentials, EnrichmentResult};
use nexus_transport::DnsError;
use tracing::info;

use super::{require, seed, PipelineError, Pipelines, StepLog, DNS_INFO};

impl Pipelines {
    /// Enrich a domain name; every source here is free
    pub async fn enrich_domain(&self, domain: &str, _credentials: &Credentials) -> Result<EnrichmentResult, PipelineError> {
        let domain = require(domain)?;
        info!("Enriching domain {}", domain);

        let dns = self.providers.dns();
        let (a, mx, ns, txt, rdap, crtsh) = futures::join!(
            dns.lookup_a(domain),
            dns.lookup_mx(domain),
            dns.lookup_ns(domain),
            dns.lookup_txt(domain),
            self.providers.rdap_domain(domain),
            self.providers.crtsh_subdomains(domain),
        );

        let mut data = seed();
        data.insert("domain", domain);
        let mut log = StepLog::default();

        // An empty answer is not worth a log line; a broken resolver is
        let mut records = |kind: &str, outcome: Result<Option<String>, DnsError>, key: &str| match outcome {
            Ok(Some(value)) => {
                data.insert(key, value);
            }
            Ok(None) | Err(DnsError::NoRecords) => {}
            Err(DnsError::Lookup(reason)) => log.note(format!("{} lookup failed: {}", kind, reason)),
        };

        records(
            "A",
            a.map(|ips| joined(ips.iter().map(|ip| ip.to_string()), ", ")),
            "ips",
        );
        records(
            "MX",
            mx.map(|mx| joined(mx.iter().map(|m| format!("{} ({})", m.exchange, m.priority)), ", ")),
            "mx_records",
        );
        records("NS", ns.map(|ns| joined(ns, ", ")), "nameservers");
        records("TXT", txt.map(|txt| joined(txt, " | ")), "txt_records");

        match rdap {
            Ok(record) => {
                data.insert("registrar", record.registrar.unwrap_or_else(|| "Unknown".to_string()));
                data.insert_opt("creation_date", record.creation_date);
                data.insert_opt("expiry_date", record.expiry_date);
                if !record.status.is_empty() {
                    data.insert_joined("status", &record.status, ", ");
                }
            }
            Err(e) => log.failed("RDAP", &e),
        }

        match crtsh {
            Ok(lookup) if !lookup.subdomains.is_empty() => {
                data.insert_joined("subdomains", &lookup.subdomains, ", ");
                data.insert("subdomain_count", lookup.subdomains.len());
            }
            Ok(_) => {}
            Err(e) => log.failed("crt.sh", &e),
        }

        let mut result = EnrichmentResult::new(DNS_INFO, data);
        result.logs = log.into_lines();
        Ok(result)
    }
}

/// Join non-empty record lists; `None` when there is nothing to show
fn joined<I, S>(items: I, separator: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<S> = items.into_iter().collect();
    if parts.is_empty() {
        return None;
    }
    Some(
        parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(separator),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::testing::pipelines_at;
    use nexus_transport::StaticResolver;
    use serde_json::json;
    use std::net::Ipv4Addr;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_mail_only_domain() {
        let server = MockServer::start().await;
        let resolver = StaticResolver::new().with_mx("x.com", "mail.x.com", 10);
        let pipelines = pipelines_at(&server.uri(), resolver);

        let result = pipelines.enrich_domain("x.com", &Credentials::new()).await.unwrap();

        assert_eq!(result.kind, "dns_info");
        let data = &result.enriched_data;
        assert_eq!(data.get_str("mx_records"), Some("mail.x.com (10)"));
        assert_eq!(data.get_str("domain"), Some("x.com"));
        assert!(!data.contains_key("ips"));
        assert!(!data.contains_key("nameservers"));
        assert!(!result.logs.iter().any(|l| l.contains("lookup failed")));
    }

    #[tokio::test]
    async fn test_all_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domain/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [{"vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar"]]]}],
                "events": [{"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"}],
                "status": ["active"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "%.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name_value": "www.example.com\nexample.com"},
                {"name_value": "*.example.com"},
                {"name_value": "api.example.com"}
            ])))
            .mount(&server)
            .await;

        let resolver = StaticResolver::new()
            .with_a("example.com", &[Ipv4Addr::new(93, 184, 216, 34), Ipv4Addr::new(93, 184, 216, 35)])
            .with_ns("example.com", &["a.iana-servers.net", "b.iana-servers.net"])
            .with_txt("example.com", &["v=spf1 -all", "google-site-verification=abc"]);
        let pipelines = pipelines_at(&server.uri(), resolver);

        let result = pipelines.enrich_domain("example.com", &Credentials::new()).await.unwrap();
        let data = &result.enriched_data;
        assert_eq!(data.get_str("ips"), Some("93.184.216.34, 93.184.216.35"));
        assert_eq!(data.get_str("nameservers"), Some("a.iana-servers.net, b.iana-servers.net"));
        assert_eq!(data.get_str("txt_records"), Some("v=spf1 -all | google-site-verification=abc"));
        assert_eq!(data.get_str("registrar"), Some("Example Registrar"));
        assert_eq!(data.get_str("creation_date"), Some("1995-08-14T04:00:00Z"));
        assert!(!data.contains_key("expiry_date"));
        assert_eq!(data.get_str("status"), Some("active"));
        assert_eq!(data.get_str("subdomains"), Some("www.example.com, api.example.com"));
        assert_eq!(data.get("subdomain_count"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_registrar_defaults_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domain/bare.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objectClassName": "domain"})))
            .mount(&server)
            .await;

        let pipelines = pipelines_at(&server.uri(), StaticResolver::new());
        let result = pipelines.enrich_domain("bare.org", &Credentials::new()).await.unwrap();
        assert_eq!(result.enriched_data.get_str("registrar"), Some("Unknown"));
        assert!(!result.enriched_data.contains_key("subdomains"));
    }

    #[tokio::test]
    async fn test_resolver_failure_is_logged() {
        let server = MockServer::start().await;
        let resolver = StaticResolver::new().with_failure("down.test", "SERVFAIL");
        let pipelines = pipelines_at(&server.uri(), resolver);

        let result = pipelines.enrich_domain("down.test", &Credentials::new()).await.unwrap();
        assert!(result.logs.contains(&"A lookup failed: SERVFAIL".to_string()));
        assert!(result.logs.iter().any(|l| l.starts_with("RDAP Request Failed")));
        assert!(!result.enriched_data.contains_key("registrar"));
    }
}
