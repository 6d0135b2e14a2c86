//! Per-call provider credentials
//!
//! A missing key is never an error: the provider step it gates is skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known provider keys
pub mod keys {
    pub const SHODAN: &str = "shodan";
    pub const ABUSEIPDB: &str = "abuseipdb";
    pub const VIRUSTOTAL: &str = "virustotal";
    pub const HUNTER: &str = "hunter";
    pub const NUMVERIFY: &str = "numverify";
}

/// Mapping from provider key to API secret
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: &str, secret: impl Into<String>) -> Self {
        self.insert(provider, secret);
        self
    }

    pub fn insert(&mut self, provider: &str, secret: impl Into<String>) {
        self.0.insert(provider.to_string(), secret.into());
    }

    /// Secret for `provider`; blank values count as absent
    pub fn get(&self, provider: &str) -> Option<&str> {
        self.0
            .get(provider)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn has(&self, provider: &str) -> bool {
        self.get(provider).is_some()
    }

    /// Provider keys that carry a usable secret
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.providers().next().is_none()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// Secrets never reach logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "***")))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_secret_is_absent() {
        let creds = Credentials::new()
            .with(keys::SHODAN, "abc")
            .with(keys::HUNTER, "   ");
        assert_eq!(creds.get(keys::SHODAN), Some("abc"));
        assert!(!creds.has(keys::HUNTER));
        assert!(!creds.has(keys::NUMVERIFY));
        assert_eq!(creds.providers().collect::<Vec<_>>(), vec!["shodan"]);
    }

    #[test]
    fn test_debug_redacts() {
        let creds = Credentials::new().with(keys::VIRUSTOTAL, "supersecret");
        let out = format!("{:?}", creds);
        assert!(out.contains("virustotal"));
        assert!(!out.contains("supersecret"));
    }

    #[test]
    fn test_deserialize_from_map() {
        let creds: Credentials =
            serde_json::from_str(r#"{"abuseipdb":"k1","numverify":""}"#).unwrap();
        assert!(creds.has(keys::ABUSEIPDB));
        assert!(!creds.is_empty());
        assert!(!creds.has(keys::NUMVERIFY));
    }
}
