//! Phone enrichment via Numverify
//!
//! The patch always carries `carrier`, `line_type` and `valid`, so a caller
//! can tell "not checked" from "checked and rejected".

use nexus_core::{keys, Credentials, EnrichmentResult};
use nexus_plugins::PhoneValidation;
use std::fmt;
use tracing::info;

use super::{require, seed, PipelineError, Pipelines, StepLog, PHONE_INFO};

/// Validation state reported in the `valid` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Unknown,
    Yes,
    NoInvalid,
}

impl Validity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Validity::Unknown => "Unknown",
            Validity::Yes => "Yes",
            Validity::NoInvalid => "No/Invalid",
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rough country prefix: the first four characters of an international number
fn country_code(phone: &str) -> String {
    if phone.starts_with('+') {
        phone.chars().take(4).collect()
    } else {
        "?".to_string()
    }
}

impl Pipelines {
    pub async fn enrich_phone(&self, phone: &str, credentials: &Credentials) -> Result<EnrichmentResult, PipelineError> {
        let phone = require(phone)?;
        info!("Enriching phone {}", phone);

        let mut data = seed();
        data.insert("phone", phone);
        data.insert("country_code", country_code(phone));
        data.insert("carrier", "Unknown (API Limit/Error)");
        data.insert("line_type", "Unknown");
        data.insert("valid", Validity::Unknown.as_str());
        let mut validity = Validity::Unknown;
        let mut log = StepLog::default();

        match credentials.get(keys::NUMVERIFY) {
            None => {
                log.skipped("Numverify");
                data.insert("carrier", "No API Key");
            }
            Some(key) => match self.providers.numverify_validate(phone, key).await {
                Ok(PhoneValidation::Valid(details)) => {
                    data.insert_opt("country_code", details.country_prefix);
                    data.insert_opt("country", details.country_name);
                    data.insert_opt("location", details.location);
                    data.insert_opt("carrier", details.carrier);
                    data.insert_opt("line_type", details.line_type);
                    validity = Validity::Yes;
                }
                Ok(PhoneValidation::Invalid) => {
                    log.note("Numverify returned invalid number");
                    validity = Validity::NoInvalid;
                }
                Ok(PhoneValidation::Rejected(kind)) => {
                    log.note(format!("Numverify API Error: {}", kind));
                    data.insert("carrier", format!("API Error: {}", kind));
                }
                Err(e) => {
                    log.failed("Numverify", &e);
                    data.insert("carrier", "Request Failed");
                }
            },
        }
        data.insert("valid", validity.as_str());

        let mut result = EnrichmentResult::new(PHONE_INFO, data);
        result.logs = log.into_lines();
        Ok(result)
    }
}
