use crate::chain::DevChain;
use crate::rpc::handlers::EthApi;
use jsonrpsee::server::{RpcModule, Server, ServerHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// RpcServer exposes a DevChain over JSON-RPC 2.0 (HTTP and WebSocket on one port).
pub struct RpcServer {
    addr: SocketAddr,
    chain: Arc<DevChain>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, chain: Arc<DevChain>) -> Self {
        Self { addr, chain }
    }

    /// Build the method table.
    pub fn module(chain: Arc<DevChain>) -> anyhow::Result<RpcModule<EthApi>> {
        let mut module = RpcModule::new(EthApi::new(chain));
        module.register_method("eth_accounts", |_, api, _| api.accounts())?;
        module.register_method("eth_blockNumber", |_, api, _| api.block_number())?;
        module.register_method("eth_chainId", |_, api, _| api.chain_id())?;
        module.register_method("eth_call", |params, api, _| api.call(params))?;
        module.register_method("eth_sendTransaction", |params, api, _| api.send_transaction(params))?;
        module.register_method("eth_getTransactionReceipt", |params, api, _| {
            api.transaction_receipt(params)
        })?;
        module.register_method("evm_snapshot", |_, api, _| api.snapshot())?;
        module.register_method("evm_revert", |params, api, _| api.revert(params))?;
        module.register_method("evm_mine", |_, api, _| api.mine())?;
        module.register_method("web3_clientVersion", |_, api, _| api.client_version())?;
        Ok(module)
    }

    /// Bind and spawn the server. Returns the bound address (useful with port 0)
    /// and the handle used to stop it.
    pub async fn start(self) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let server = Server::builder().build(self.addr).await?;
        let local_addr = server.local_addr()?;
        let module = Self::module(self.chain)?;
        let handle = server.start(module);
        info!("Starting RPC server on {}", local_addr);
        Ok((local_addr, handle))
    }
}
