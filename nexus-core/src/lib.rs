//! Nexus Core - graph entities and the enrichment mutation contract
//!
//! This crate provides the types shared by every layer:
//! - Nodes, links and the open node-type vocabulary
//! - Per-call provider credentials
//! - Plugin results (new satellite nodes) and pipeline results (data patches)
//! - The persistence seam consumed by the engine

pub mod node;
pub mod credentials;
pub mod results;
pub mod store;

pub use node::*;
pub use credentials::*;
pub use results::*;
pub use store::*;
