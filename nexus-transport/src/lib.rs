//! Nexus Transport
//!
//! I/O plumbing shared by providers and plugins:
//! - HTTP client factory with mandatory timeouts
//! - DNS resolution behind a swappable resolver
//! - External process worker with deadline enforcement

pub mod http;
pub mod dns;
pub mod process;

pub use http::*;
pub use dns::*;
pub use process::*;
