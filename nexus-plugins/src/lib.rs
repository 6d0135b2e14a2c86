//! Nexus Plugins
//!
//! Intelligence sources and the plugins built on top of them:
//! - **providers**: typed clients for Shodan, AbuseIPDB, IP-API, VirusTotal,
//!   RDAP, crt.sh, Hunter.io and Numverify
//! - **plugins**: graph-expanding capabilities, one per source, plus the
//!   Sherlock username search run through the process worker
//! - **registry**: name-addressed plugin table queried by node type

pub mod plugins;
pub mod providers;
pub mod registry;
pub mod traits;

pub use plugins::*;
pub use providers::{
    AbuseReport, Endpoints, GeoInfo, HunterVerdict, PhoneDetails, PhoneValidation, ProviderError,
    Providers, RdapRecord, ShodanHost, SubdomainLookup, VtReport, VtTarget,
};
pub use registry::*;
pub use traits::*;
