//! Nexus Runtime
//!
//! Multi-source enrichment pipelines and the [`Engine`] facade that routes
//! requests to pipelines or plugins.

pub mod config;
pub mod engine;
pub mod pipelines;

pub use config::*;
pub use engine::*;
pub use pipelines::{PipelineError, Pipelines, Validity};
