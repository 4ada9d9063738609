//! Deployment fixture: deploy named contracts and hand out their addresses.

use crate::contracts::{alarm, registry, AlarmContract, RegistryContract};
use crate::rpc::{ChainRpc, TransactionRequest, TxHash};
use crate::utils::errors::RpcError;
use crate::verifier::wait::{wait_for_block, wait_for_transaction, WaitConfig, WaitError};
use alloy_primitives::Address;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// per-deployment confirmation budget
    pub max_wait: Duration,
    /// budget for the chain to produce block 1 before deploying
    pub max_first_block_wait: Duration,
    /// extra blocks to wait after the deployments are mined
    pub wait_for_block: u64,
    pub poll_interval: Duration,
    pub gas: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(15),
            max_first_block_wait: Duration::from_secs(180),
            wait_for_block: 1,
            poll_interval: Duration::from_millis(500),
            gas: 3_000_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("waiting for deployment: {0}")]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("deployment of {name} ({tx_hash}) reverted")]
    Reverted { name: String, tx_hash: TxHash },
    #[error("receipt for {name} has no contract address")]
    MissingAddress { name: String },
}

/// Addresses of contracts deployed for one test environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployedContracts {
    addresses: BTreeMap<String, Address>,
    deployer: Address,
}

impl DeployedContracts {
    /// Deploy each contract in `names` from the node's first account.
    pub async fn deploy<C: ChainRpc + ?Sized>(
        client: &C,
        names: &[&str],
        cfg: &DeployConfig,
    ) -> Result<Self, DeployError> {
        let deployer = client.coinbase().await?;

        let first_block = WaitConfig::new(cfg.max_first_block_wait, cfg.poll_interval);
        wait_for_block(client, 1, &first_block).await?;

        let mut sent = Vec::with_capacity(names.len());
        for name in names {
            let req = TransactionRequest::deploy(name).from(deployer).gas(cfg.gas);
            let tx_hash = client.send_transaction(&req).await?;
            info!(%name, %tx_hash, "deployment sent");
            sent.push((name.to_string(), tx_hash));
        }

        let confirm = WaitConfig::new(cfg.max_wait, cfg.poll_interval);
        let receipts = try_join_all(
            sent.iter().map(|(_, hash)| wait_for_transaction(client, *hash, &confirm)),
        )
        .await?;

        let mut addresses = BTreeMap::new();
        let mut last_block = 0;
        for ((name, tx_hash), receipt) in sent.into_iter().zip(receipts) {
            if !receipt.succeeded() {
                return Err(DeployError::Reverted { name, tx_hash });
            }
            let address = receipt
                .contract_address
                .ok_or_else(|| DeployError::MissingAddress { name: name.clone() })?;
            info!(%name, %address, block = receipt.block(), "deployed");
            last_block = last_block.max(receipt.block());
            addresses.insert(name, address);
        }

        if cfg.wait_for_block > 0 {
            wait_for_block(client, last_block + cfg.wait_for_block, &confirm).await?;
        }

        Ok(Self { addresses, deployer })
    }

    /// Deploy the Alarm / TestDataRegistry pair.
    pub async fn deploy_registration_pair<C: ChainRpc + ?Sized>(
        client: &C,
        cfg: &DeployConfig,
    ) -> Result<Self, DeployError> {
        Self::deploy(client, &[alarm::NAME, registry::NAME], cfg).await
    }

    pub fn get(&self, name: &str) -> Option<Address> {
        self.addresses.get(name).copied()
    }

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.addresses.keys().map(String::as_str)
    }

    pub fn alarm<'a, C: ChainRpc + ?Sized>(&self, client: &'a C) -> Option<AlarmContract<'a, C>> {
        self.get(alarm::NAME).map(|a| AlarmContract::new(client, a))
    }

    pub fn registry<'a, C: ChainRpc + ?Sized>(&self, client: &'a C) -> Option<RegistryContract<'a, C>> {
        self.get(registry::NAME).map(|a| RegistryContract::new(client, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{miner::run_miner, ChainConfig, DevChain};
    use crate::rpc::LocalClient;
    use std::sync::Arc;
    use tokio::sync::watch;

    fn fast() -> DeployConfig {
        DeployConfig {
            max_wait: Duration::from_secs(2),
            max_first_block_wait: Duration::from_secs(2),
            wait_for_block: 1,
            poll_interval: Duration::from_millis(5),
            gas: 1_000_000,
        }
    }

    #[tokio::test]
    async fn test_deploy_pair_with_running_miner() {
        let chain = Arc::new(DevChain::new(ChainConfig::default()));
        let (stop, rx) = watch::channel(false);
        let miner = tokio::spawn(run_miner(chain.clone(), Duration::from_millis(10), rx));
        let client = LocalClient::new(chain.clone());

        let deployed = DeployedContracts::deploy_registration_pair(&client, &fast()).await.unwrap();
        let alarm_addr = deployed.get(alarm::NAME).unwrap();
        let registry_addr = deployed.get(registry::NAME).unwrap();
        assert_ne!(alarm_addr, registry_addr);
        assert_eq!(chain.code_at(&alarm_addr).as_deref(), Some(alarm::NAME));
        assert_eq!(deployed.deployer(), chain.accounts()[0]);
        assert_eq!(deployed.names().count(), 2);

        let registry = deployed.registry(&client).unwrap();
        assert_eq!(registry.was_successful().await.unwrap(), registry::NOT_YET_SUCCEEDED);

        stop.send(true).unwrap();
        miner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_deploy_unknown_contract_reverts() {
        let chain = Arc::new(DevChain::new(ChainConfig::default()));
        let (stop, rx) = watch::channel(false);
        let miner = tokio::spawn(run_miner(chain.clone(), Duration::from_millis(10), rx));
        let client = LocalClient::new(chain);

        let err = DeployedContracts::deploy(&client, &["Nope"], &fast()).await.unwrap_err();
        assert!(matches!(err, DeployError::Reverted { ref name, .. } if name == "Nope"));

        stop.send(true).unwrap();
        miner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_no_first_block_times_out() {
        let chain = Arc::new(DevChain::new(ChainConfig::default()));
        let client = LocalClient::new(chain);
        let cfg = DeployConfig { max_first_block_wait: Duration::from_millis(30), ..fast() };
        let err = DeployedContracts::deploy_registration_pair(&client, &cfg).await.unwrap_err();
        assert!(matches!(err, DeployError::Wait(WaitError::Timeout { .. })));
    }
}
