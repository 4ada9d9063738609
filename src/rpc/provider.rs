use crate::rpc::types::{TransactionReceipt, TransactionRequest, TxHash};
use crate::utils::errors::{RpcError, RpcResult};
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;

/// The node capabilities the verifier and fixtures depend on.
///
/// Implemented by `HttpRpcClient` (any JSON-RPC node) and `LocalClient`
/// (in-process devchain); tests may supply their own.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_accounts`
    async fn accounts(&self) -> RpcResult<Vec<Address>>;

    /// `eth_blockNumber`
    async fn block_number(&self) -> RpcResult<u64>;

    /// `eth_call` against the latest block
    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes>;

    /// `eth_sendTransaction`
    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<TxHash>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending
    async fn transaction_receipt(&self, hash: TxHash) -> RpcResult<Option<TransactionReceipt>>;

    /// `evm_snapshot`
    async fn snapshot(&self) -> RpcResult<U256>;

    /// `evm_revert`
    async fn revert(&self, id: U256) -> RpcResult<bool>;

    /// First unlocked account, the default sender.
    async fn coinbase(&self) -> RpcResult<Address> {
        self.accounts().await?.first().copied().ok_or(RpcError::NoAccounts)
    }
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for Arc<T> {
    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        (**self).accounts().await
    }

    async fn block_number(&self) -> RpcResult<u64> {
        (**self).block_number().await
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        (**self).call(request).await
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<TxHash> {
        (**self).send_transaction(request).await
    }

    async fn transaction_receipt(&self, hash: TxHash) -> RpcResult<Option<TransactionReceipt>> {
        (**self).transaction_receipt(hash).await
    }

    async fn snapshot(&self) -> RpcResult<U256> {
        (**self).snapshot().await
    }

    async fn revert(&self, id: U256) -> RpcResult<bool> {
        (**self).revert(id).await
    }
}
