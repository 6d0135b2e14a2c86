//! Nexus CLI
//!
//! Runs enrichment pipelines and plugins from the command line and prints
//! JSON to stdout. Logs go to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nexus_core::{keys, Credentials, Node, NodeType};
use nexus_runtime::{Engine, EngineConfig};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(author, version, about = "Nexus: entity enrichment for OSINT graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, env = "NEXUS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    keys: KeyArgs,
}

/// Provider keys; each overrides the `[credentials]` table of the config file
#[derive(Args)]
struct KeyArgs {
    /// Shodan API key (or set NEXUS_SHODAN_KEY env var)
    #[arg(long, env = "NEXUS_SHODAN_KEY", global = true, hide_env_values = true)]
    shodan_key: Option<String>,

    /// AbuseIPDB API key (or set NEXUS_ABUSEIPDB_KEY env var)
    #[arg(long, env = "NEXUS_ABUSEIPDB_KEY", global = true, hide_env_values = true)]
    abuseipdb_key: Option<String>,

    /// VirusTotal API key (or set NEXUS_VIRUSTOTAL_KEY env var)
    #[arg(long, env = "NEXUS_VIRUSTOTAL_KEY", global = true, hide_env_values = true)]
    virustotal_key: Option<String>,

    /// Hunter.io API key (or set NEXUS_HUNTER_KEY env var)
    #[arg(long, env = "NEXUS_HUNTER_KEY", global = true, hide_env_values = true)]
    hunter_key: Option<String>,

    /// Numverify access key (or set NEXUS_NUMVERIFY_KEY env var)
    #[arg(long, env = "NEXUS_NUMVERIFY_KEY", global = true, hide_env_values = true)]
    numverify_key: Option<String>,
}

impl KeyArgs {
    /// Layer the command-line keys over `base`
    fn apply(self, mut base: Credentials) -> Credentials {
        let flags = [
            (keys::SHODAN, self.shodan_key),
            (keys::ABUSEIPDB, self.abuseipdb_key),
            (keys::VIRUSTOTAL, self.virustotal_key),
            (keys::HUNTER, self.hunter_key),
            (keys::NUMVERIFY, self.numverify_key),
        ];
        for (provider, secret) in flags {
            if let Some(secret) = secret {
                base.insert(provider, secret);
            }
        }
        base
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a raw value with the pipeline for its type
    Enrich {
        /// Node type (ip, domain, email, phone)
        #[arg(short = 't', long = "type")]
        node_type: NodeType,

        /// Value to look up
        #[arg(long)]
        value: String,
    },

    /// List plugins that accept a node type
    Plugins {
        /// Node type
        #[arg(short = 't', long = "type")]
        node_type: NodeType,
    },

    /// Run a plugin against a node read from a JSON file
    Run {
        /// Exact plugin name
        #[arg(short, long)]
        plugin: String,

        /// Path to the node JSON
        #[arg(short, long)]
        node: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let credentials = cli.keys.apply(std::mem::take(&mut config.credentials));
    info!(
        "Configured providers: {}",
        credentials.providers().collect::<Vec<_>>().join(", ")
    );

    let engine = Engine::from_config(&config)?;

    match cli.command {
        Commands::Enrich { node_type, value } => {
            let response = engine.enrich(&node_type, &value, &credentials).await;
            print_json(&response)?;
        }
        Commands::Plugins { node_type } => {
            print_json(&engine.list_plugins_for_type(&node_type))?;
        }
        Commands::Run { plugin, node: path } => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let node: Node = serde_json::from_str(&raw)
                .with_context(|| format!("parsing node from {}", path.display()))?;
            let result = engine.run_plugin(&plugin, &node, &credentials).await?;
            print_json(&result)?;
        }
    }

    Ok(())
}
