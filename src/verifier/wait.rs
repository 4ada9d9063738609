//! Bounded polling helpers: transaction confirmation, block height, endpoint liveness.

use crate::rpc::{ChainRpc, TransactionReceipt, TxHash};
use crate::utils::errors::RpcError;
use crate::utils::metrics::{METRICS, RECEIPT_POLLS};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(max_wait: Duration, poll_interval: Duration) -> Self {
        Self { max_wait, poll_interval }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self { max_wait: Duration::from_secs(60), poll_interval: Duration::from_millis(500) }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined.
pub async fn wait_for_transaction<C: ChainRpc + ?Sized>(
    client: &C,
    hash: TxHash,
    cfg: &WaitConfig,
) -> Result<TransactionReceipt, WaitError> {
    let started = Instant::now();
    let poll = async {
        loop {
            METRICS.inc_counter(RECEIPT_POLLS);
            if let Some(receipt) = client.transaction_receipt(hash).await? {
                return Ok::<_, RpcError>(receipt);
            }
            debug!(%hash, elapsed = ?started.elapsed(), "transaction pending");
            tokio::time::sleep(cfg.poll_interval).await;
        }
    };
    match tokio::time::timeout(cfg.max_wait, poll).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(WaitError::Timeout { what: format!("transaction {hash}"), waited: started.elapsed() }),
    }
}

/// Poll `eth_blockNumber` until it reaches `target`; returns the observed height.
pub async fn wait_for_block<C: ChainRpc + ?Sized>(
    client: &C,
    target: u64,
    cfg: &WaitConfig,
) -> Result<u64, WaitError> {
    let started = Instant::now();
    let poll = async {
        loop {
            let current = client.block_number().await?;
            if current >= target {
                return Ok::<_, RpcError>(current);
            }
            debug!(current, target, "waiting for block");
            tokio::time::sleep(cfg.poll_interval).await;
        }
    };
    match tokio::time::timeout(cfg.max_wait, poll).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(WaitError::Timeout { what: format!("block {target}"), waited: started.elapsed() }),
    }
}

/// Poll until the endpoint answers `eth_blockNumber`. Transport errors are
/// expected while the node boots and are retried until `max_wait`.
pub async fn wait_for_rpc<C: ChainRpc + ?Sized>(client: &C, cfg: &WaitConfig) -> Result<u64, WaitError> {
    let started = Instant::now();
    let poll = async {
        loop {
            match client.block_number().await {
                Ok(n) => return n,
                Err(e) => debug!(err = %e, "rpc endpoint not ready"),
            }
            tokio::time::sleep(cfg.poll_interval).await;
        }
    };
    tokio::time::timeout(cfg.max_wait, poll)
        .await
        .map_err(|_| WaitError::Timeout { what: "rpc endpoint".to_string(), waited: started.elapsed() })
}
