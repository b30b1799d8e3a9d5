//! Mirror Configuration Module
//!
//! Loads the network description from a TOML file with `MIRROR_`-prefixed
//! environment variable overrides.

use crate::defaults;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Top-level configuration file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MirrorConfig {
    pub network: NetworkConfig,

    pub contracts: ContractsConfig,

    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,

    /// Accounts tracked for balances but never used to sign
    #[serde(default)]
    pub observers: Vec<String>,

    #[serde(default)]
    pub mirror: MirrorSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    pub rpc_address: String,

    #[serde(default = "default_gas_price")]
    pub gas_price: u64,

    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

/// Deployed contract addresses, in display (byte-reversed) hex
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContractsConfig {
    pub base_asset: String,
    pub factory: String,
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PairConfig {
    pub token: String,
    pub exchange: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParticipantConfig {
    pub label: String,
    pub address: String,
    /// Wallet index or raw key reference, resolved by the gateway
    pub key_ref: String,
}

/// Read fan-out, retry policy and fee accounting
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MirrorSettings {
    pub max_concurrent_reads: usize,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub base_asset_is_fee_asset: bool,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_reads: defaults::mirror::MAX_CONCURRENT_READS,
            max_retries: defaults::mirror::MAX_RETRIES,
            initial_backoff_ms: defaults::mirror::INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::mirror::MAX_BACKOFF_MS,
            base_asset_is_fee_asset: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

fn default_gas_price() -> u64 {
    defaults::network::GAS_PRICE
}

fn default_gas_limit() -> u64 {
    defaults::network::GAS_LIMIT
}

fn default_confirmation_timeout_secs() -> u64 {
    defaults::network::CONFIRMATION_TIMEOUT_SECS
}

impl MirrorConfig {
    /// Load from a TOML file with environment variable overrides
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading mirror config: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            // MIRROR_NETWORK__GAS_PRICE=0 overrides network.gas_price
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Parse a TOML document directly, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration TOML")
    }

    /// Expand environment variables in the RPC address
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.network.rpc_address)
            .context("Failed to expand RPC address")?;
        if expanded != self.network.rpc_address {
            debug!("Expanded RPC address to {}", expanded);
        }
        self.network.rpc_address = expanded.to_string();
        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.network.confirmation_timeout_secs)
    }
}

/// Load, then expand environment variables
pub fn load_config(path: impl AsRef<Path>) -> Result<MirrorConfig> {
    let mut config = MirrorConfig::load(path.as_ref())?;
    config.expand_env_vars()?;
    Ok(config)
}
