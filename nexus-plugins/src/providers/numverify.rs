//! Numverify phone validation

use serde::Deserialize;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawValidation {
    success: Option<bool>,
    error: Option<RawError>,
    valid: bool,
    country_prefix: Option<String>,
    country_name: Option<String>,
    location: Option<String>,
    carrier: Option<String>,
    line_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawError {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Details of a number the provider recognized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneDetails {
    pub country_prefix: Option<String>,
    pub country_name: Option<String>,
    pub location: Option<String>,
    pub carrier: Option<String>,
    pub line_type: Option<String>,
}

/// What the provider said about a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneValidation {
    Valid(PhoneDetails),
    /// The provider checked the number and rejected it
    Invalid,
    /// The provider refused the request (quota, bad key, ...)
    Rejected(String),
}

impl From<RawValidation> for PhoneValidation {
    fn from(raw: RawValidation) -> Self {
        if raw.success == Some(false) || raw.error.is_some() {
            let kind = raw
                .error
                .and_then(|e| e.kind)
                .unwrap_or_else(|| "unknown".to_string());
            return PhoneValidation::Rejected(kind);
        }

        if raw.valid {
            PhoneValidation::Valid(PhoneDetails {
                country_prefix: raw.country_prefix,
                country_name: raw.country_name,
                location: raw.location,
                carrier: raw.carrier,
                line_type: raw.line_type,
            })
        } else {
            PhoneValidation::Invalid
        }
    }
}

impl Providers {
    pub async fn numverify_validate(&self, phone: &str, api_key: &str) -> Result<PhoneValidation, ProviderError> {
        info!("Querying Numverify for {}", phone);
        let url = join_url(&self.endpoints().numverify, "/api/validate");
        let request = self
            .http()
            .get(&url)
            .query(&[("access_key", api_key), ("number", phone), ("format", "1")]);

        let raw: RawValidation = fetch_json("Numverify", request).await?;
        Ok(raw.into())
    }
}
