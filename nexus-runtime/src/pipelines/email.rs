//! Email enrichment via Hunter.io

use nexus_core::{keys, Credentials, EnrichmentResult};
use tracing::info;

use super::{require, seed, PipelineError, Pipelines, StepLog, EMAIL_INFO};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

impl Pipelines {
    pub async fn enrich_email(&self, email: &str, credentials: &Credentials) -> Result<EnrichmentResult, PipelineError> {
        let email = require(email)?;
        info!("Enriching email {}", email);

        let mut parts = email.split('@');
        let mut data = seed();
        data.insert("email", email);
        data.insert_opt("user", parts.next());
        data.insert_opt("domain", parts.next());
        data.insert("status", "Pending Analysis");
        let mut log = StepLog::default();

        match credentials.get(keys::HUNTER) {
            None => {
                log.skipped("Hunter.io");
                data.insert("status", "No API Key Provided");
            }
            Some(key) => match self.providers.hunter_verify(email, key).await {
                Ok(Some(verdict)) => {
                    data.insert_opt("status", verdict.status());
                    data.insert_opt("score", verdict.score.map(|s| format!("{}%", s)));
                    data.insert(
                        "provider",
                        if verdict.gibberish { "Unknown/Gibberish" } else { "Standard" },
                    );
                    data.insert("disposable", yes_no(verdict.disposable));
                    data.insert("webmail", yes_no(verdict.webmail));
                    data.insert("mx_records", if verdict.mx_records { "Found" } else { "Missing" });
                }
                Ok(None) => log.note("Hunter.io returned no verdict"),
                Err(e) => {
                    log.failed("Hunter.io", &e);
                    data.insert("status", "API Error");
                }
            },
        }

        let mut result = EnrichmentResult::new(EMAIL_INFO, data);
        result.logs = log.into_lines();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::testing::pipelines_at;
    use nexus_transport::StaticResolver;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn hunter(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/email-verifier"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_without_key() {
        let pipelines = pipelines_at("http://127.0.0.1:9", StaticResolver::new());
        let result = pipelines
            .enrich_email("alice@corp.io", &Credentials::new())
            .await
            .unwrap();

        let data = &result.enriched_data;
        assert_eq!(result.kind, "email_info");
        assert_eq!(data.get_str("user"), Some("alice"));
        assert_eq!(data.get_str("domain"), Some("corp.io"));
        assert_eq!(data.get_str("status"), Some("No API Key Provided"));
    }

    #[tokio::test]
    async fn test_verdict_fields() {
        let server = hunter(
            200,
            json!({"data": {
                "result": "deliverable",
                "score": 94,
                "disposable": false,
                "webmail": true,
                "mx_records": true,
                "gibberish": false
            }}),
        )
        .await;
        let pipelines = pipelines_at(&server.uri(), StaticResolver::new());
        let result = pipelines
            .enrich_email("alice@corp.io", &Credentials::new().with(keys::HUNTER, "hk"))
            .await
            .unwrap();

        let data = &result.enriched_data;
        assert_eq!(data.get_str("status"), Some("Valid"));
        assert_eq!(data.get_str("score"), Some("94%"));
        assert_eq!(data.get_str("provider"), Some("Standard"));
        assert_eq!(data.get_str("disposable"), Some("No"));
        assert_eq!(data.get_str("webmail"), Some("Yes"));
        assert_eq!(data.get_str("mx_records"), Some("Found"));
    }

    #[tokio::test]
    async fn test_other_verdicts_pass_through() {
        let server = hunter(200, json!({"data": {"result": "risky", "gibberish": true}})).await;
        let pipelines = pipelines_at(&server.uri(), StaticResolver::new());
        let result = pipelines
            .enrich_email("x9q@corp.io", &Credentials::new().with(keys::HUNTER, "hk"))
            .await
            .unwrap();

        let data = &result.enriched_data;
        assert_eq!(data.get_str("status"), Some("risky"));
        assert_eq!(data.get_str("provider"), Some("Unknown/Gibberish"));
        assert_eq!(data.get_str("mx_records"), Some("Missing"));
        assert!(!data.contains_key("score"));
    }

    #[tokio::test]
    async fn test_request_failure() {
        let server = hunter(401, json!({"errors": [{"details": "No user found for the API key supplied"}]})).await;
        let pipelines = pipelines_at(&server.uri(), StaticResolver::new());
        let result = pipelines
            .enrich_email("alice@corp.io", &Credentials::new().with(keys::HUNTER, "bad"))
            .await
            .unwrap();
        assert_eq!(result.enriched_data.get_str("status"), Some("API Error"));
        assert!(result.logs[0].starts_with("Hunter.io Request Failed"));
    }
}
