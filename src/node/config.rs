//! TOML configuration for the CLI. Every field has a default, so an empty
//! file (or no file) is valid.

use crate::chain::ChainConfig;
use crate::fixtures::DeployConfig;
use crate::node::dev_node::DevNodeConfig;
use crate::utils::serde_helpers::opt_hex;
use crate::verifier::{Registration, WaitConfig};
use alloy_primitives::{address, Address, Bytes};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Address registered by the reference scenario.
pub const DEFAULT_TARGET: Address = address!("0xc948453368e5ddc7bc00bb52b5809138217a068d");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub rpc_url: String,
    pub request_timeout_secs: u64,
    pub wait: WaitSection,
    pub deploy: DeploySection,
    pub registration: RegistrationSection,
    pub devnet: DevnetSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSection {
    /// confirmation budget for the registration transaction
    pub tx_max_wait_secs: u64,
    pub poll_interval_ms: u64,
    /// how long a freshly started node may take to answer RPC
    pub node_max_wait_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySection {
    pub max_wait_secs: u64,
    pub max_first_block_wait_secs: u64,
    pub wait_for_block: u64,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationSection {
    pub target: Address,
    #[serde(with = "opt_hex", skip_serializing_if = "Option::is_none")]
    pub expected_data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevnetSection {
    pub bind: String,
    pub block_time_ms: u64,
    pub chain_id: u64,
    pub accounts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_seed: Option<u64>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: 30,
            wait: WaitSection::default(),
            deploy: DeploySection::default(),
            registration: RegistrationSection::default(),
            devnet: DevnetSection::default(),
        }
    }
}

impl Default for WaitSection {
    fn default() -> Self {
        Self { tx_max_wait_secs: 60, poll_interval_ms: 500, node_max_wait_secs: 45 }
    }
}

impl Default for DeploySection {
    fn default() -> Self {
        Self { max_wait_secs: 15, max_first_block_wait_secs: 180, wait_for_block: 1, gas: 3_000_000 }
    }
}

impl Default for RegistrationSection {
    fn default() -> Self {
        Self { target: DEFAULT_TARGET, expected_data: None, from: None }
    }
}

impl Default for DevnetSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8545".to_string(),
            block_time_ms: 1_000,
            chain_id: 1337,
            accounts: 10,
            account_seed: None,
        }
    }
}

impl VerifierConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let cfg: VerifierConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait.poll_interval_ms)
    }

    pub fn tx_wait(&self) -> WaitConfig {
        WaitConfig::new(Duration::from_secs(self.wait.tx_max_wait_secs), self.poll_interval())
    }

    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            max_wait: Duration::from_secs(self.deploy.max_wait_secs),
            max_first_block_wait: Duration::from_secs(self.deploy.max_first_block_wait_secs),
            wait_for_block: self.deploy.wait_for_block,
            poll_interval: self.poll_interval(),
            gas: self.deploy.gas,
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            target: self.registration.target,
            expected: self.registration.expected_data.clone().map(Bytes::from),
            from: self.registration.from,
        }
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            chain_id: self.devnet.chain_id,
            accounts: self.devnet.accounts,
            account_seed: self.devnet.account_seed,
            default_gas: self.deploy.gas,
            ..ChainConfig::default()
        }
    }

    pub fn dev_node_config(&self) -> Result<DevNodeConfig> {
        ensure!(self.devnet.block_time_ms > 0, "devnet block_time_ms must be greater than zero");
        let bind = self
            .devnet
            .bind
            .parse()
            .with_context(|| format!("invalid devnet bind address {:?}", self.devnet.bind))?;
        Ok(DevNodeConfig {
            bind,
            block_time: Duration::from_millis(self.devnet.block_time_ms),
            chain: self.chain_config(),
            node_max_wait: Duration::from_secs(self.wait.node_max_wait_secs),
            poll_interval: self.poll_interval(),
        })
    }
}
