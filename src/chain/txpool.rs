//! Pending pool: transactions accepted by `eth_sendTransaction` and not yet mined.
//!
//! FIFO in submission order, deduplicated by hash, bounded by `max_size`.

use crate::chain::types::{Transaction, TxHash};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxPoolError {
    #[error("duplicate tx {0}")]
    Duplicate(TxHash),
    #[error("pool full ({0} pending)")]
    PoolFull(usize),
}

#[derive(Debug, Clone)]
pub struct PendingPool {
    queue: VecDeque<(TxHash, Transaction)>,
    index: HashSet<TxHash>,
    pub max_size: usize,
}

impl PendingPool {
    pub fn new(max_size: usize) -> Self {
        Self { queue: VecDeque::new(), index: HashSet::new(), max_size }
    }

    pub fn insert(&mut self, tx: Transaction) -> Result<TxHash, TxPoolError> {
        let hash = tx.hash();
        if self.index.contains(&hash) {
            return Err(TxPoolError::Duplicate(hash));
        }
        if self.queue.len() >= self.max_size {
            return Err(TxPoolError::PoolFull(self.queue.len()));
        }
        self.index.insert(hash);
        self.queue.push_back((hash, tx));
        Ok(hash)
    }

    /// Remove up to `limit` transactions in submission order.
    pub fn drain(&mut self, limit: usize) -> Vec<(TxHash, Transaction)> {
        let n = limit.min(self.queue.len());
        let out: Vec<_> = self.queue.drain(..n).collect();
        for (hash, _) in &out {
            self.index.remove(hash);
        }
        out
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.index.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};

    fn tx(nonce: u64) -> Transaction {
        Transaction {
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            data: Bytes::new(),
            nonce,
            gas: 21_000,
            value: U256::ZERO,
        }
    }

    #[test]
    fn test_dedup() {
        let mut pool = PendingPool::new(10);
        let h = pool.insert(tx(1)).unwrap();
        assert!(pool.contains(&h));
        assert_eq!(pool.insert(tx(1)).unwrap_err(), TxPoolError::Duplicate(h));
    }

    #[test]
    fn test_full_and_fifo_drain() {
        let mut pool = PendingPool::new(2);
        pool.insert(tx(1)).unwrap();
        pool.insert(tx(2)).unwrap();
        assert_eq!(pool.insert(tx(3)).unwrap_err(), TxPoolError::PoolFull(2));

        let drained = pool.drain(5);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].1.nonce, 1);
        assert_eq!(drained[1].1.nonce, 2);
        assert!(pool.is_empty());
        assert!(!pool.contains(&drained[0].0));
    }
}
