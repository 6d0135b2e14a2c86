//! Engine configuration
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration. Example:
//!
//! ```toml
//! [http]
//! timeout_secs = 15
//!
//! [worker]
//! tools_dir = "/opt/nexus/tools"
//! timeout_secs = 180
//!
//! [endpoints]
//! crtsh = "https://crt.sh"
//!
//! [credentials]
//! shodan = "..."
//! ```

use nexus_core::Credentials;
use nexus_plugins::Endpoints;
use nexus_transport::{HttpConfig, WorkerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub http: HttpConfig,
    pub worker: WorkerConfig,
    pub endpoints: Endpoints,
    /// Provider keys; callers may also pass credentials per request
    pub credentials: Credentials,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::keys;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.worker.timeout_secs, 120);
        assert_eq!(config.endpoints.crtsh, "https://crt.sh");
        assert!(config.credentials.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [worker]
            tools_dir = "/opt/tools"

            [endpoints]
            ipapi = "http://localhost:8080"

            [credentials]
            shodan = "sk-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.worker.tools_dir, PathBuf::from("/opt/tools"));
        assert_eq!(config.worker.interpreter.as_deref(), Some("python3"));
        assert_eq!(config.endpoints.ipapi, "http://localhost:8080");
        assert_eq!(config.endpoints.shodan, "https://api.shodan.io");
        assert_eq!(config.credentials.get(keys::SHODAN), Some("sk-123"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\ntimeout_secs = 3").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.http.timeout_secs, 3);

        assert!(matches!(
            EngineConfig::load("/nonexistent/nexus.toml"),
            Err(ConfigError::Io { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[http]\ntimeout_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
