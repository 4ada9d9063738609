use crate::chain::DevChain;
use crate::rpc::handlers::chain_error_object;
use crate::rpc::provider::ChainRpc;
use crate::rpc::types::{TransactionReceipt, TransactionRequest, TxHash};
use crate::utils::errors::{RpcError, RpcResult};
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;

/// In-process client: same semantics as the HTTP endpoint, no transport.
#[derive(Clone)]
pub struct LocalClient {
    chain: Arc<DevChain>,
}

impl LocalClient {
    pub fn new(chain: Arc<DevChain>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<DevChain> {
        &self.chain
    }
}

fn to_rpc_error(err: crate::chain::ChainError) -> RpcError {
    let obj = chain_error_object(&err);
    RpcError::Server { code: obj.code(), message: obj.message().to_string() }
}

#[async_trait]
impl ChainRpc for LocalClient {
    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        Ok(self.chain.accounts().to_vec())
    }

    async fn block_number(&self) -> RpcResult<u64> {
        Ok(self.chain.block_number())
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        self.chain.call(request).map_err(to_rpc_error)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<TxHash> {
        self.chain.send_transaction(request).map_err(to_rpc_error)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> RpcResult<Option<TransactionReceipt>> {
        Ok(self.chain.transaction_receipt(&hash))
    }

    async fn snapshot(&self) -> RpcResult<U256> {
        Ok(self.chain.snapshot())
    }

    async fn revert(&self, id: U256) -> RpcResult<bool> {
        Ok(self.chain.revert(id))
    }
}
