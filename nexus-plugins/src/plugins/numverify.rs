//! Numverify phone validation

use async_trait::async_trait;
use nexus_core::{keys, Credentials, ExecutionResult, Node, NodeData, NodeType};
use tracing::{debug, warn};

use super::search_value;
use crate::providers::{PhoneValidation, Providers};
use crate::{Cost, OsintPlugin, PluginError};

pub struct NumverifyPlugin {
    providers: Providers,
}

impl NumverifyPlugin {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl OsintPlugin for NumverifyPlugin {
    fn name(&self) -> &str {
        "Numverify Phone Lookup"
    }

    fn description(&self) -> &str {
        "Validate phone number and get carrier/location info"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Phone]
    }

    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let phone = match search_value(node) {
            Ok(phone) => phone,
            Err(explained) => return Ok(explained),
        };
        let Some(api_key) = credentials.get(keys::NUMVERIFY) else {
            debug!("No Numverify key, skipping {}", phone);
            return Ok(ExecutionResult::explained("Skipping Numverify: No API Key provided."));
        };

        let mut result = ExecutionResult::explained(format!("Querying Numverify for {}...", phone));
        match self.providers.numverify_validate(phone, api_key).await {
            Ok(PhoneValidation::Valid(details)) => {
                let mut data = NodeData::new();
                data.insert_opt("country", details.country_name);
                data.insert_opt("location", details.location);
                data.insert_opt("carrier", details.carrier);
                data.insert_opt("line_type", details.line_type);
                data.insert("source", "numverify");
                result.attach(node, Node::satellite("numverify", NodeType::PhoneData, data, node));
            }
            Ok(PhoneValidation::Invalid) => result.log("Numverify reports the number as invalid."),
            Ok(PhoneValidation::Rejected(kind)) => result.log(format!("Numverify API Error: {}", kind)),
            Err(e) => {
                warn!("Numverify lookup for {} failed: {}", phone, e);
                result.log(format!("Numverify Request Failed: {}", e));
            }
        }
        Ok(result)
    }
}
