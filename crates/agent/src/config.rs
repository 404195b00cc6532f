// Agent configuration
// Optional config file layered with BENCHPRESS__* environment variables

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use benchpress_core::domain::Layout;
use benchpress_sdk::DEFAULT_PEER_API_PORT;

fn default_workload() -> String {
    "oltp".to_string()
}

fn default_local_address() -> String {
    "127.0.0.1".to_string()
}

fn default_peer_api_port() -> u16 {
    DEFAULT_PEER_API_PORT
}

/// Everything the agent needs for one run.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Workload type to run.
    #[serde(default = "default_workload")]
    pub workload: String,

    /// Path to the state database. Defaults to the platform data
    /// directory when unset.
    #[serde(default)]
    pub state_db: Option<String>,

    /// The address this machine appears under in the layout.
    #[serde(default = "default_local_address")]
    pub local_address: String,

    /// Port the peer coordination API listens on.
    #[serde(default = "default_peer_api_port")]
    pub peer_api_port: u16,

    /// Declared multi-machine layout; absent means single-machine mode.
    #[serde(default)]
    pub layout: Option<Layout>,

    /// Free-form profile parameters handed to the workload.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl AgentConfig {
    /// Load from the optional config file (path via `BENCHPRESS_CONFIG`,
    /// default `benchpress.toml` in the working directory) layered with
    /// `BENCHPRESS__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let file = std::env::var("BENCHPRESS_CONFIG").unwrap_or_else(|_| "benchpress".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix("BENCHPRESS").separator("__"))
            .build()
            .context("failed to assemble configuration")?;

        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Resolve the state database path, creating the parent directory.
    pub fn state_db_path(&self) -> anyhow::Result<PathBuf> {
        let path = match &self.state_db {
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => {
                let dirs = directories::ProjectDirs::from("", "", "benchpress")
                    .context("could not determine a data directory for the state database")?;
                dirs.data_local_dir().join("state.db")
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(path)
    }

    pub fn local_ip(&self) -> anyhow::Result<IpAddr> {
        self.local_address
            .parse()
            .with_context(|| format!("invalid local_address '{}'", self.local_address))
    }
}
