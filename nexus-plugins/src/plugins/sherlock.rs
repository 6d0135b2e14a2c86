//! Username search across social networks via the Sherlock tool
//!
//! Sherlock is run as an external process; its stdout is the only interface.
//! Everything that depends on the tool's output format lives in
//! [`parse_hits`].

use async_trait::async_trait;
use nexus_core::{Credentials, ExecutionResult, Node, NodeData, NodeType};
use nexus_transport::ProcessWorker;
use tracing::{info, warn};
use url::Url;

use super::search_value;
use crate::{Cost, OsintPlugin, PluginError};

/// Entry point relative to the tools directory
pub const SHERLOCK_SCRIPT: &str = "sherlock/sherlock/sherlock.py";

/// Per-site timeout handed to Sherlock, in seconds
const SITE_TIMEOUT_SECS: &str = "5";

/// Marker Sherlock prints in front of every found profile
const HIT_MARKER: &str = "[+]";

/// One profile reported by Sherlock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHit {
    pub service: String,
    pub url: String,
}

/// Parsed Sherlock output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SherlockHits {
    pub hits: Vec<ProfileHit>,
    /// Marker lines that could not be split into service and URL
    pub malformed: Vec<String>,
}

/// Extract profile hits from Sherlock's stdout
///
/// Hit lines look like `[+] Instagram: https://instagram.com/bob`. The line
/// is split on the first `": "`, so URLs containing that sequence survive.
pub fn parse_hits(stdout: &str) -> SherlockHits {
    let mut parsed = SherlockHits::default();

    for line in stdout.lines().filter(|l| l.contains(HIT_MARKER)) {
        match line.split_once(": ") {
            Some((service, url)) => {
                let service = service.replace(HIT_MARKER, "").trim().to_string();
                let url = url.trim().to_string();
                if service.is_empty() || url.is_empty() {
                    parsed.malformed.push(line.trim().to_string());
                } else {
                    parsed.hits.push(ProfileHit { service, url });
                }
            }
            None => parsed.malformed.push(line.trim().to_string()),
        }
    }

    parsed
}

pub struct SherlockPlugin {
    worker: ProcessWorker,
}

impl SherlockPlugin {
    pub fn new(worker: ProcessWorker) -> Self {
        Self { worker }
    }
}

fn profile_node(hit: &ProfileHit, anchor: &Node) -> Node {
    let mut data = NodeData::new();
    data.insert("url", hit.url.as_str());
    data.insert("title", format!("{} Profile", hit.service));
    data.insert_opt(
        "domain",
        Url::parse(&hit.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string)),
    );
    Node::satellite("url", NodeType::Url, data, anchor)
}

#[async_trait]
impl OsintPlugin for SherlockPlugin {
    fn name(&self) -> &str {
        "Sherlock"
    }

    fn description(&self) -> &str {
        "Search social networks for accounts matching a username"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn author(&self) -> &str {
        "Sherlock Project (Wrapped)"
    }

    fn accepted_types(&self) -> &[NodeType] {
        &[NodeType::Identity]
    }

    fn cost(&self) -> Cost {
        Cost::Free
    }

    async fn execute(&self, node: &Node, _credentials: &Credentials) -> Result<ExecutionResult, PluginError> {
        let username = match search_value(node) {
            Ok(username) => username,
            Err(explained) => return Ok(explained),
        };

        let args = vec![
            username.to_string(),
            "--timeout".to_string(),
            SITE_TIMEOUT_SECS.to_string(),
            "--print-found".to_string(),
            "--no-color".to_string(),
        ];
        let output = self.worker.execute(SHERLOCK_SCRIPT, &args).await;

        // Sherlock exits nonzero when some sites fail; hits printed so far still count
        if !output.success && output.stdout.trim().is_empty() {
            let reason = output
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| output.stderr.trim().to_string());
            return Err(PluginError::Worker(format!("Sherlock failed: {}", reason)));
        }
        let parsed = parse_hits(&output.stdout);
        let mut result = ExecutionResult::new();
        for line in &parsed.malformed {
            result.log(format!("Skipped unparseable Sherlock line: {}", line));
        }
        for hit in &parsed.hits {
            result.attach(node, profile_node(hit, node));
            result.log(format!("Found profile on {}: {}", hit.service, hit.url));
        }
        if parsed.hits.is_empty() {
            result.log("No matches found by Sherlock.");
        }
        if let Some(error) = &output.error {
            warn!("Sherlock ended with {}, using partial output", error);
            result.log(format!("Sherlock ended early ({}); results may be incomplete.", error));
        }

        info!("Sherlock found {} profiles for {}", parsed.hits.len(), username);
        Ok(result)
    }
}
