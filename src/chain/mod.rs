//! Devchain: an in-process chain that executes native contracts.
//!
//! - state: accounts and contract storage
//! - types: Transaction + hashing, contract address derivation
//! - executor: message calls with per-frame rollback
//! - txpool: pending transactions
//! - ledger: blocks and receipts
//! - miner: interval block production
//!
//! `DevChain` is the shared handle (wrap in `Arc`) used by the RPC server,
//! the in-process client and the miner task.

pub mod state;
pub mod types;
pub mod executor;
pub mod txpool;
pub mod ledger;
pub mod miner;

pub use executor::ExecError;
pub use ledger::Block;
pub use state::{Account, WorldState};
pub use txpool::TxPoolError;
pub use types::{Transaction, TxHash};

use crate::rpc::types::{TransactionReceipt, TransactionRequest};
use crate::utils::metrics::{METRICS, BLOCKS_MINED, TRANSACTIONS_MINED};
use alloy_primitives::{Address, Bytes, U256, U64};
use parking_lot::{Mutex, RwLock};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("account {0} is not unlocked on this node")]
    LockedAccount(Address),
    #[error("node has no dev accounts")]
    NoAccounts,
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error(transparent)]
    Pool(#[from] TxPoolError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// number of unlocked, pre-funded dev accounts
    pub accounts: usize,
    pub account_balance: U256,
    /// fixed seed for reproducible dev account addresses
    pub account_seed: Option<u64>,
    pub max_pending: usize,
    pub max_block_txs: usize,
    pub default_gas: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1337,
            accounts: 10,
            // 1000 ether
            account_balance: U256::from(10u64).pow(U256::from(21u64)),
            account_seed: None,
            max_pending: 10_000,
            max_block_txs: 1_000,
            default_gas: 3_000_000,
        }
    }
}

#[derive(Debug, Clone)]
struct ChainInner {
    state: WorldState,
    pool: txpool::PendingPool,
    ledger: ledger::Ledger,
    /// next nonce per sender including not-yet-mined transactions
    pending_nonces: HashMap<Address, u64>,
}

pub struct DevChain {
    config: ChainConfig,
    accounts: Vec<Address>,
    inner: RwLock<ChainInner>,
    snapshots: Mutex<Vec<ChainInner>>,
}

impl DevChain {
    pub fn new(config: ChainConfig) -> Self {
        let accounts = dev_accounts(config.accounts, config.account_seed);
        let mut state = WorldState::new();
        for addr in &accounts {
            state.insert(*addr, Account::funded(config.account_balance));
        }
        let inner = ChainInner {
            state,
            pool: txpool::PendingPool::new(config.max_pending),
            ledger: ledger::Ledger::new(unix_now()),
            pending_nonces: HashMap::new(),
        };
        Self { config, accounts, inner: RwLock::new(inner), snapshots: Mutex::new(Vec::new()) }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    pub fn block_number(&self) -> u64 {
        self.inner.read().ledger.block_number()
    }

    pub fn block(&self, number: u64) -> Option<Block> {
        self.inner.read().ledger.block(number).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.read().pool.len()
    }

    pub fn code_at(&self, address: &Address) -> Option<String> {
        self.inner.read().state.code(address).map(str::to_string)
    }

    /// `eth_call`: execute against a throwaway copy of the latest state.
    pub fn call(&self, req: &TransactionRequest) -> Result<Bytes, ChainError> {
        let to = req.to.ok_or(ChainError::InvalidRequest("eth_call requires `to`"))?;
        let mut state = self.inner.read().state.clone();
        Ok(executor::execute_call(&mut state, to, &req.data, 0)?)
    }

    /// `eth_sendTransaction`: queue a transaction from an unlocked dev account.
    pub fn send_transaction(&self, req: &TransactionRequest) -> Result<TxHash, ChainError> {
        let from = match req.from {
            Some(from) => from,
            None => *self.accounts.first().ok_or(ChainError::NoAccounts)?,
        };
        if !self.accounts.contains(&from) {
            return Err(ChainError::LockedAccount(from));
        }

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let nonce = inner
            .pending_nonces
            .get(&from)
            .copied()
            .unwrap_or_else(|| inner.state.nonce(&from));
        let tx = Transaction {
            from,
            to: req.to,
            data: req.data.clone(),
            nonce,
            gas: req.gas.map(|g| g.to::<u64>()).unwrap_or(self.config.default_gas),
            value: req.value.unwrap_or_default(),
        };
        let hash = inner.pool.insert(tx)?;
        inner.pending_nonces.insert(from, nonce + 1);
        debug!(%hash, %from, nonce, "transaction queued");
        Ok(hash)
    }

    /// Receipt once mined, `None` while pending or unknown.
    pub fn transaction_receipt(&self, hash: &TxHash) -> Option<TransactionReceipt> {
        self.inner.read().ledger.receipt(hash).cloned()
    }

    /// Seal the next block from pending transactions.
    pub fn mine_block(&self) -> Block {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let pending = inner.pool.drain(self.config.max_block_txs);
        let parent = inner.ledger.latest().clone();
        let number = parent.number + 1;
        let block = Block::seal(
            number,
            parent.hash,
            unix_now().max(parent.timestamp),
            pending.iter().map(|(h, _)| *h).collect(),
        );

        let mut mined = Vec::with_capacity(pending.len());
        for (index, (hash, tx)) in pending.into_iter().enumerate() {
            let outcome = executor::apply_transaction(&mut inner.state, &tx);
            if let Some(err) = &outcome.error {
                debug!(%hash, %err, "transaction reverted");
            }
            let receipt = TransactionReceipt {
                transaction_hash: hash,
                transaction_index: U64::from(index),
                block_hash: block.hash,
                block_number: U64::from(number),
                from: tx.from,
                to: tx.to,
                contract_address: outcome.contract_address,
                gas_used: U64::from(outcome.gas_used),
                status: Some(U64::from(u8::from(outcome.success))),
            };
            mined.push(receipt);
        }

        METRICS.inc_counter(BLOCKS_MINED);
        METRICS.add_counter(TRANSACTIONS_MINED, mined.len() as u64);
        inner.ledger.append_block(block.clone(), mined);
        block
    }

    /// Save the whole chain; returns an id for `revert`.
    pub fn snapshot(&self) -> U256 {
        let mut snaps = self.snapshots.lock();
        snaps.push(self.inner.read().clone());
        U256::from(snaps.len())
    }

    /// Restore snapshot `id`. The snapshot and any taken after it are consumed.
    pub fn revert(&self, id: U256) -> bool {
        let mut snaps = self.snapshots.lock();
        let Ok(id) = usize::try_from(id) else { return false };
        if id == 0 || id > snaps.len() {
            return false;
        }
        snaps.truncate(id);
        match snaps.pop() {
            Some(saved) => {
                *self.inner.write() = saved;
                true
            }
            None => false,
        }
    }
}

fn dev_accounts(n: usize, seed: Option<u64>) -> Vec<Address> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..n)
        .map(|_| {
            let mut raw = [0u8; 20];
            rng.fill(&mut raw);
            Address::from(raw)
        })
        .collect()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
