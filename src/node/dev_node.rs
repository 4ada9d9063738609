//! Node fixture: a devchain with its miner and JSON-RPC server, torn down as a unit.

use crate::chain::miner::run_miner;
use crate::chain::{ChainConfig, DevChain};
use crate::node::service_handle::ServiceHandle;
use crate::rpc::client::DEFAULT_REQUEST_TIMEOUT;
use crate::rpc::{HttpRpcClient, LocalClient, RpcServer};
use crate::utils::errors::RpcResult;
use crate::verifier::wait::{wait_for_rpc, WaitConfig};
use anyhow::{ensure, Result};
use jsonrpsee::server::ServerHandle;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DevNodeConfig {
    /// port 0 picks a free port
    pub bind: SocketAddr,
    pub block_time: Duration,
    pub chain: ChainConfig,
    pub node_max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for DevNodeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            block_time: Duration::from_secs(1),
            chain: ChainConfig::default(),
            node_max_wait: Duration::from_secs(45),
            poll_interval: Duration::from_millis(100),
        }
    }
}

pub struct DevNode {
    chain: Arc<DevChain>,
    rpc_addr: SocketAddr,
    services: ServiceHandle,
    server: ServerHandle,
}

impl DevNode {
    /// Start chain, miner and RPC server, then wait for the endpoint to answer.
    pub async fn spawn(cfg: DevNodeConfig) -> Result<Self> {
        ensure!(!cfg.block_time.is_zero(), "devnode block time must be non-zero");
        let chain = Arc::new(DevChain::new(cfg.chain.clone()));

        let (mut services, shutdown_rx) = ServiceHandle::new();
        services.attach(tokio::spawn(run_miner(chain.clone(), cfg.block_time, shutdown_rx)));

        let (rpc_addr, server) = match RpcServer::new(cfg.bind, chain.clone()).start().await {
            Ok(started) => started,
            Err(e) => {
                services.shutdown().await?;
                return Err(e);
            }
        };
        let node = Self { chain, rpc_addr, services, server };

        let ready = async {
            let client = node.client()?;
            let wait = WaitConfig::new(cfg.node_max_wait, cfg.poll_interval);
            Ok::<_, anyhow::Error>(wait_for_rpc(&client, &wait).await?)
        };
        let ready = ready.await;
        match ready {
            Ok(height) => {
                info!(endpoint = %node.endpoint(), height, "devnode ready");
                Ok(node)
            }
            Err(e) => {
                warn!("devnode did not become ready: {e}");
                node.shutdown().await?;
                Err(e)
            }
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.rpc_addr)
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    pub fn chain(&self) -> &Arc<DevChain> {
        &self.chain
    }

    /// HTTP client for this node's endpoint.
    pub fn client(&self) -> RpcResult<HttpRpcClient> {
        HttpRpcClient::new(&self.endpoint(), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn local_client(&self) -> LocalClient {
        LocalClient::new(self.chain.clone())
    }

    /// Stop the RPC server and the miner.
    pub async fn shutdown(self) -> Result<()> {
        if self.server.stop().is_ok() {
            self.server.stopped().await;
        }
        self.services.shutdown().await?;
        info!(endpoint = %format!("http://{}", self.rpc_addr), "devnode stopped");
        Ok(())
    }
}
