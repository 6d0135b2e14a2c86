//! HTTP client factory
//!
//! Every provider request goes through a client built here so that no call
//! can hang without a deadline.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent sent to providers
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: format!("nexus-osint/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors from HTTP plumbing
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Create the shared HTTP client
pub fn create_http_client(config: &HttpConfig) -> Result<Client, HttpError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| HttpError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.user_agent.starts_with("nexus-osint/"));
    }

    #[test]
    fn test_create_client() {
        assert!(create_http_client(&HttpConfig::default()).is_ok());
    }
}
