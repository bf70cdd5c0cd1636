use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::interop::errors::InteropError;
use crate::interop::retry::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/interop.yaml";

/// Connection details for one network, as seen from this node
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkProfile {
    /// Relay serving views for this network (host:port)
    pub relay_endpoint: String,
    pub channel: String,
    pub contract: String,
    /// Local ledger gateway, only needed for networks we invoke on
    #[serde(default)]
    pub gateway_url: String,
}

impl NetworkProfile {
    fn is_complete(&self) -> bool {
        !self.relay_endpoint.is_empty() && !self.channel.is_empty() && !self.contract.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts,
            base_delay_ms: cfg.base_delay_ms,
            max_jitter_ms: cfg.max_jitter_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    pub fetch_timeout_ms: u64,
    pub invoke_timeout_ms: u64,
    pub retry: RetryConfig,
    #[serde(default)]
    pub networks: HashMap<String, NetworkProfile>,
}

impl AppConfig {
    pub fn directory(&self) -> NetworkDirectory {
        NetworkDirectory::new(self.networks.clone())
    }
}

/// Resolves network ids to connection profiles
#[derive(Debug, Clone, Default)]
pub struct NetworkDirectory {
    profiles: HashMap<String, NetworkProfile>,
}

impl NetworkDirectory {
    pub fn new(profiles: HashMap<String, NetworkProfile>) -> Self {
        Self { profiles }
    }

    pub fn insert(&mut self, network: &str, profile: NetworkProfile) {
        self.profiles.insert(network.to_string(), profile);
    }

    fn lookup(&self, network: &str) -> Option<&NetworkProfile> {
        self.profiles.get(network).filter(|p| p.is_complete())
    }

    /// Profile of a network we query views from
    pub fn remote(&self, network: &str) -> Result<&NetworkProfile, InteropError> {
        self.lookup(network)
            .ok_or_else(|| InteropError::InvalidDestinationNetwork(network.to_string()))
    }

    /// Profile of the network we submit transactions to
    pub fn local(&self, network: &str) -> Result<&NetworkProfile, InteropError> {
        self.lookup(network).ok_or_else(|| {
            InteropError::Configuration(format!("no usable profile for local network {}", network))
        })
    }
}

fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/interop.log")?
        .set_default("fetch_timeout_ms", 30_000)?
        .set_default("invoke_timeout_ms", 60_000)?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.base_delay_ms", 500)?
        .set_default("retry.max_jitter_ms", 250)
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let s = builder_with_defaults()?
        // Add configuration from a file
        .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some()))
        // Add configuration from environment variables
        .add_source(Environment::with_prefix("INTEROP").separator("__"))
        .build()?;

    s.try_deserialize()
}

/// Load configuration from an in-memory YAML document (defaults still apply)
pub fn load_config_from_str(yaml: &str) -> Result<AppConfig, ConfigError> {
    builder_with_defaults()?
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()?
        .try_deserialize()
}
