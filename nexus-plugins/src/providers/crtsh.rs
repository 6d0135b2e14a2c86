//! Certificate-transparency subdomain lookup via crt.sh
//!
//! Shared by the domain pipeline and the subdomain plugin. The result is
//! always deduplicated, never contains the queried domain or wildcard names,
//! and is capped at [`MAX_SUBDOMAINS`] to bound graph growth.

use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;

use super::{fetch_json, join_url, ProviderError, Providers};

/// Hard cap on subdomains returned by one lookup
pub const MAX_SUBDOMAINS: usize = 50;

#[derive(Debug, Deserialize)]
struct CrtEntry {
    #[serde(default)]
    name_value: Option<String>,
}

/// Subdomains found for a domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdomainLookup {
    /// Unique names, first-seen order, at most [`MAX_SUBDOMAINS`]
    pub subdomains: Vec<String>,
    /// Unique names before the cap was applied
    pub total_unique: usize,
}

/// Turn raw certificate name values into the capped subdomain list
///
/// A single value may hold several names separated by newlines.
pub fn collect_subdomains<'a, I>(name_values: I, domain: &str) -> SubdomainLookup
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();

    for name in name_values.into_iter().flat_map(str::lines) {
        let name = name.trim();
        if name.is_empty() || name == domain || name.contains('*') {
            continue;
        }
        if seen.insert(name) {
            unique.push(name.to_string());
        }
    }

    let total_unique = unique.len();
    unique.truncate(MAX_SUBDOMAINS);
    SubdomainLookup {
        subdomains: unique,
        total_unique,
    }
}

impl Providers {
    pub async fn crtsh_subdomains(&self, domain: &str) -> Result<SubdomainLookup, ProviderError> {
        info!("Querying crt.sh for {}", domain);
        let url = join_url(&self.endpoints().crtsh, "/");
        let pattern = format!("%.{}", domain);
        let request = self
            .http()
            .get(&url)
            .query(&[("q", pattern.as_str()), ("output", "json")]);

        let entries: Vec<CrtEntry> = fetch_json("crt.sh", request).await?;
        Ok(collect_subdomains(
            entries.iter().filter_map(|e| e.name_value.as_deref()),
            domain,
        ))
    }
}
