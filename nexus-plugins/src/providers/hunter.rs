//! Hunter.io email verification (paid)

use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

#[derive(Debug, Deserialize)]
struct HunterEnvelope {
    #[serde(default)]
    data: Option<HunterVerdict>,
}

/// Verification verdict for one address
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HunterVerdict {
    /// `deliverable`, `undeliverable`, `risky`, ...
    pub result: Option<String>,
    pub score: Option<i64>,
    pub disposable: bool,
    pub webmail: bool,
    pub mx_records: bool,
    pub gibberish: bool,
}

impl HunterVerdict {
    /// `deliverable` becomes `Valid`; other verdicts pass through
    pub fn status(&self) -> Option<String> {
        self.result.as_deref().map(|r| match r {
            "deliverable" => "Valid".to_string(),
            other => other.to_string(),
        })
    }
}

impl Providers {
    /// `Ok(None)` when the provider answered without a verdict
    pub async fn hunter_verify(&self, email: &str, api_key: &str) -> Result<Option<HunterVerdict>, ProviderError> {
        info!("Querying Hunter.io for {}", email);
        let url = join_url(&self.endpoints().hunter, "/v2/email-verifier");
        let request = self
            .http()
            .get(&url)
            .query(&[("email", email), ("api_key", api_key)]);

        let envelope: HunterEnvelope = fetch_json("Hunter.io", request).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let mut verdict = HunterVerdict {
            result: Some("deliverable".into()),
            ..Default::default()
        };
        assert_eq!(verdict.status().as_deref(), Some("Valid"));

        verdict.result = Some("risky".into());
        assert_eq!(verdict.status().as_deref(), Some("risky"));

        verdict.result = None;
        assert_eq!(verdict.status(), None);
    }
}
