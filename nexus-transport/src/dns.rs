//! DNS resolution
//!
//! Resolution sits behind [`DnsResolver`] so enrichment code can run against
//! a scripted resolver offline. "No records" is a distinct outcome from a
//! failed lookup: callers ignore the former and log the latter.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use thiserror::Error;

/// Errors from DNS resolution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DnsError {
    #[error("No records found")]
    NoRecords,

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

impl From<ResolveError> for DnsError {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => DnsError::NoRecords,
            _ => DnsError::Lookup(err.to_string()),
        }
    }
}

/// A mail exchange record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub exchange: String,
    pub priority: u16,
}

/// Record lookups used by enrichment
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, DnsError>;

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError>;

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DnsError>;

    /// TXT strings, flattened across records
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

/// Thread-safe reference to a resolver
pub type SharedResolver = Arc<dyn DnsResolver>;

/// Resolver backed by hickory
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Resolver using the system configuration, falling back to public resolvers
    pub fn from_system_conf() -> Self {
        let inner = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { inner }
    }
}

fn strip_root(name: String) -> String {
    name.trim_end_matches('.').to_string()
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        let lookup = self.inner.ipv4_lookup(name).await?;
        Ok(lookup.iter().map(|a| a.0).collect())
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError> {
        let lookup = self.inner.mx_lookup(name).await?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord {
                exchange: strip_root(mx.exchange().to_utf8()),
                priority: mx.preference(),
            })
            .collect())
    }

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.inner.ns_lookup(name).await?;
        Ok(lookup.iter().map(|ns| strip_root(ns.to_string())).collect())
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.inner.txt_lookup(name).await?;
        Ok(lookup
            .iter()
            .flat_map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

#[derive(Debug, Default)]
struct Zone {
    a: HashMap<String, Vec<Ipv4Addr>>,
    mx: HashMap<String, Vec<MxRecord>>,
    ns: HashMap<String, Vec<String>>,
    txt: HashMap<String, Vec<String>>,
    broken: HashMap<String, String>,
}

/// In-memory resolver answering from a fixed zone
///
/// Names without records answer [`DnsError::NoRecords`]; names marked broken
/// fail every lookup.
#[derive(Debug, Default)]
pub struct StaticResolver {
    zone: RwLock<Zone>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_a(self, name: &str, ips: &[Ipv4Addr]) -> Self {
        self.zone.write().a.insert(name.to_string(), ips.to_vec());
        self
    }

    pub fn with_mx(self, name: &str, exchange: &str, priority: u16) -> Self {
        self.zone
            .write()
            .mx
            .entry(name.to_string())
            .or_default()
            .push(MxRecord {
                exchange: exchange.to_string(),
                priority,
            });
        self
    }

    pub fn with_ns(self, name: &str, servers: &[&str]) -> Self {
        self.zone
            .write()
            .ns
            .insert(name.to_string(), servers.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_txt(self, name: &str, records: &[&str]) -> Self {
        self.zone
            .write()
            .txt
            .insert(name.to_string(), records.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_failure(self, name: &str, reason: &str) -> Self {
        self.zone.write().broken.insert(name.to_string(), reason.to_string());
        self
    }

    fn answer<T: Clone>(&self, name: &str, pick: impl Fn(&Zone) -> Option<&Vec<T>>) -> Result<Vec<T>, DnsError> {
        let zone = self.zone.read();
        if let Some(reason) = zone.broken.get(name) {
            return Err(DnsError::Lookup(reason.clone()));
        }
        match pick(&zone) {
            Some(records) if !records.is_empty() => Ok(records.clone()),
            _ => Err(DnsError::NoRecords),
        }
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        self.answer(name, |z| z.a.get(name))
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DnsError> {
        self.answer(name, |z| z.mx.get(name))
    }

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.answer(name, |z| z.ns.get(name))
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.answer(name, |z| z.txt.get(name))
    }
}
