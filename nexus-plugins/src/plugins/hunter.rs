//! Hunter.io email verification

use async_trait::async_trait;
use nexus_core::{keys, Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::{debug, warn};

use super::search_value;
use crate::providers::Providers;
use crate::{Cost, OsintPlugin, PluginError};

pub struct HunterPlugin {
    providers: Providers,
}

impl HunterPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for HunterPlugin {
    fn name(&self) -> &str {
        "Hunter.io Email Lookup"
    }

    fn description(&self) -> &str {
        "Verify email address and find professional details"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Email]
    }

    fn cost(&self) -> Cost {
        Cost::Paid
    }

    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let email = match search_value(node) {
            Ok(email) => email,
            Err(explained) => return Ok(explained),
        };
        let Some(api_key) = credentials.get(keys::HUNTER) else {
            debug!("No Hunter.io key, skipping {}", email);
            return Ok(ExecutionResult::explained("Skipping Hunter.io: No API Key provided."));
        };

        let mut result = ExecutionResult::explained(format!("Querying Hunter.io for {}...", email));
        match self.providers.hunter_verify(email, api_key).await {
            Ok(Some(verdict)) => {
                let mut data = NodeData::new();
                data.insert_opt("status", verdict.result.clone());
                data.insert_opt("score", verdict.score);
                data.insert("disposable", verdict.disposable);
                data.insert("webmail", verdict.webmail);
                data.insert("mx_records", verdict.mx_records);
                data.insert("source", "hunter.io");
                result.attach(node, Node::satellite("hunter", NodeType::EmailData, data, node));
            }
            Ok(None) => result.log("Hunter.io returned no verdict."),
            Err(e) => {
                warn!("Hunter.io lookup for {} failed: {}", email, e);
                result.log(format!("Hunter.io Request Failed: {}", e));
            }
        }
        Ok(result)
    }
}
