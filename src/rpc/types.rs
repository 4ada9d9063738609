//! JSON-RPC wire types (geth field names, hex quantities).

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

pub use crate::chain::types::TxHash;

/// Parameter object of `eth_call` and `eth_sendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, alias = "input")]
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn call(to: Address, data: Bytes) -> Self {
        Self { to: Some(to), data, ..Default::default() }
    }

    /// Deployment of a native contract by name.
    pub fn deploy(contract: &str) -> Self {
        Self { data: Bytes::copy_from_slice(contract.as_bytes()), ..Default::default() }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(U64::from(gas));
        self
    }
}

/// Result of `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub block_hash: B256,
    pub block_number: U64,
    pub from: Address,
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    pub gas_used: U64,
    /// 1 success, 0 reverted; absent on pre-Byzantium receipts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Receipts without a status field are treated as successful.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }

    pub fn block(&self) -> u64 {
        self.block_number.to::<u64>()
    }
}
