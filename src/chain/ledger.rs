//! Ledger: mined blocks and receipts by hash.

use crate::chain::types::TxHash;
use crate::rpc::types::TransactionReceipt;
use alloy_primitives::{keccak256, B256};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub transactions: Vec<TxHash>,
}

impl Block {
    pub fn seal(number: u64, parent_hash: B256, timestamp: u64, transactions: Vec<TxHash>) -> Self {
        let mut buf = Vec::with_capacity(48 + transactions.len() * 32);
        buf.extend_from_slice(parent_hash.as_slice());
        buf.extend_from_slice(&number.to_be_bytes());
        buf.extend_from_slice(&timestamp.to_be_bytes());
        for h in &transactions {
            buf.extend_from_slice(h.as_slice());
        }
        Self { number, hash: keccak256(&buf), parent_hash, timestamp, transactions }
    }
}

/// Ledger service that stores mined blocks and provides lookup APIs
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
    receipts: HashMap<TxHash, TransactionReceipt>,
}

impl Ledger {
    /// Ledger holding only the genesis block.
    pub fn new(genesis_timestamp: u64) -> Self {
        Self {
            blocks: vec![Block::seal(0, B256::ZERO, genesis_timestamp, vec![])],
            receipts: HashMap::new(),
        }
    }

    pub fn latest(&self) -> &Block {
        // genesis is pushed in `new` and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn block_number(&self) -> u64 {
        self.latest().number
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        usize::try_from(number).ok().and_then(|n| self.blocks.get(n))
    }

    pub fn append_block(&mut self, block: Block, receipts: Vec<TransactionReceipt>) {
        for receipt in receipts {
            self.receipts.insert(receipt.transaction_hash, receipt);
        }
        self.blocks.push(block);
    }

    pub fn receipt(&self, hash: &TxHash) -> Option<&TransactionReceipt> {
        self.receipts.get(hash)
    }
}
