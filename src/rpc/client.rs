//! JSON-RPC over HTTP client for any Ethereum-style node.

use crate::rpc::provider::ChainRpc;
use crate::rpc::types::{TransactionReceipt, TransactionRequest, TxHash};
use crate::utils::errors::RpcResult;
use alloy_primitives::{Address, Bytes, U256, U64};
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;
use tracing::trace;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpRpcClient {
    inner: HttpClient,
    url: String,
}

impl HttpRpcClient {
    pub fn new(url: &str, request_timeout: Duration) -> RpcResult<Self> {
        let inner = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(url)?;
        Ok(Self { inner, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpcClient").field("url", &self.url).finish()
    }
}

#[async_trait]
impl ChainRpc for HttpRpcClient {
    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        Ok(self.inner.request("eth_accounts", rpc_params![]).await?)
    }

    async fn block_number(&self) -> RpcResult<u64> {
        let n: U64 = self.inner.request("eth_blockNumber", rpc_params![]).await?;
        Ok(n.to::<u64>())
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        trace!(to = ?request.to, "eth_call");
        Ok(self.inner.request("eth_call", rpc_params![request, "latest"]).await?)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<TxHash> {
        Ok(self.inner.request("eth_sendTransaction", rpc_params![request]).await?)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> RpcResult<Option<TransactionReceipt>> {
        Ok(self.inner.request("eth_getTransactionReceipt", rpc_params![hash]).await?)
    }

    async fn snapshot(&self) -> RpcResult<U256> {
        Ok(self.inner.request("evm_snapshot", rpc_params![]).await?)
    }

    async fn revert(&self, id: U256) -> RpcResult<bool> {
        Ok(self.inner.request("evm_revert", rpc_params![id]).await?)
    }
}
