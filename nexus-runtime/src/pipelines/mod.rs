//! Multi-source enrichment pipelines
//!
//! A pipeline queries every provider that applies to one kind of value and
//! folds their answers into a single flat patch for the node. Providers are
//! independent: a missing key or a failed request only removes that
//! provider's fields and adds a line to the result logs. Fields are merged in
//! a fixed provider order, later providers overwriting earlier ones.

use chrono::{SecondsFormat, Utc};
use nexus_core::NodeData;
use nexus_plugins::{ProviderError, Providers};
use thiserror::Error;
use tracing::warn;

mod address;
mod domain;
mod email;
mod phone;

pub use phone::Validity;

/// Tag of each pipeline's result
pub const IP_INFO: &str = "ip_info";
pub const DNS_INFO: &str = "dns_info";
pub const EMAIL_INFO: &str = "email_info";
pub const PHONE_INFO: &str = "phone_info";

/// Errors from pipeline runs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Search value is empty")]
    EmptyValue,
}

/// Runs the enrichment pipelines against a shared set of providers
#[derive(Clone)]
pub struct Pipelines {
    providers: Providers,
}

impl Pipelines {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

/// Patch skeleton every pipeline starts from
fn seed() -> NodeData {
    let mut data = NodeData::new();
    data.insert(
        "last_update",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    data
}

fn require(value: &str) -> Result<&str, PipelineError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PipelineError::EmptyValue);
    }
    Ok(value)
}

/// Trace of the provider steps of one run
#[derive(Debug, Default)]
struct StepLog(Vec<String>);

impl StepLog {
    fn skipped(&mut self, provider: &str) {
        self.0.push(format!("Skipping {}: No API Key provided.", provider));
    }

    fn failed(&mut self, provider: &str, err: &ProviderError) {
        warn!("{} request failed: {}", provider, err);
        self.0.push(format!("{} Request Failed: {}", provider, err));
    }

    fn note(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    fn into_lines(self) -> Vec<String> {
        self.0
    }
}
