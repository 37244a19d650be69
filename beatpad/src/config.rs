use consensus_core::config::Params;
use metronome::MetronomeConfig;
use mining::MiningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::orchestrator::OrchestratorConfig;

/// OP_TRUE, paid to when no address is configured
pub const DEFAULT_PAY_SCRIPT: [u8; 1] = [0x51];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid pay address {0}: expected a hex script")]
    InvalidPayAddress(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub metronome: MetronomeConfig,
    pub mining: MinerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub threads: usize,
    /// Hex script the coinbase pays to
    pub pay_address: Option<String>,
    pub beat_poll_interval_ms: u64,
    /// Cumulative peer wait after which mining waits for a stable height
    pub resync_threshold_secs: u64,
    pub stability_window_secs: u64,
    /// Pause after a failed round
    pub round_backoff_ms: u64,
    /// Grace given to workers after a shutdown signal
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { network_id: "mainnet".to_string() }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            pay_address: None,
            beat_poll_interval_ms: 1_000,
            resync_threshold_secs: 600,
            stability_window_secs: 30,
            round_backoff_ms: 1_000,
            shutdown_grace_ms: 100,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data") }
    }
}

impl Config {
    /// Load configuration from a TOML file; missing sections and keys take defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load default configuration for network
    pub fn for_network(network: &str) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.network.network_id = network.to_string();
        config.params()?;
        Ok(config)
    }

    /// Override config with CLI arguments
    pub fn apply_cli_overrides(&mut self, args: &crate::cli::Args) {
        if let Some(network) = &args.network {
            self.network.network_id = network.clone();
        }

        if let Some(data_dir) = &args.data_dir {
            self.storage.data_dir = data_dir.clone();
        }

        if let Some(addr) = &args.metronome_addr {
            self.metronome.host = addr.clone();
        }
        if let Some(port) = args.metronome_port {
            self.metronome.port = port;
        }
        if let Some(user) = &args.metronome_user {
            self.metronome.user = user.clone();
        }
        if let Some(password) = &args.metronome_password {
            self.metronome.password = password.clone();
        }
        if let Some(wallet) = &args.metronome_wallet {
            self.metronome.wallet = Some(wallet.clone());
        }
        if let Some(timeout) = args.rpc_client_timeout {
            self.metronome.timeout_secs = timeout;
        }

        if let Some(threads) = args.threads {
            self.mining.threads = threads;
        }
        if let Some(pay_address) = &args.pay_address {
            self.mining.pay_address = Some(pay_address.clone());
        }
    }

    pub fn params(&self) -> Result<Params, ConfigError> {
        Params::for_network(&self.network.network_id)
            .map_err(|_| ConfigError::UnknownNetwork(self.network.network_id.clone()))
    }

    /// Script public key for coinbase outputs
    pub fn pay_script(&self) -> Result<Vec<u8>, ConfigError> {
        match self.mining.pay_address.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_PAY_SCRIPT.to_vec()),
            Some(address) => hex::decode(address).map_err(|_| ConfigError::InvalidPayAddress(address.to_string())),
        }
    }

    pub fn mining_config(&self) -> MiningConfig {
        MiningConfig { num_workers: self.mining.threads.max(1), ..MiningConfig::default() }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            beat_poll_interval: Duration::from_millis(self.mining.beat_poll_interval_ms),
            resync_threshold: Duration::from_secs(self.mining.resync_threshold_secs),
            stability_window: Duration::from_secs(self.mining.stability_window_secs),
            round_backoff: Duration::from_millis(self.mining.round_backoff_ms),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.mining.shutdown_grace_ms)
    }
}
