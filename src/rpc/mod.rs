//! RPC module
//!
//! - `ChainRpc`: the provider capability the verifier depends on
//! - `HttpRpcClient`: jsonrpsee HTTP client for a live node
//! - `LocalClient`: direct in-process access to a devchain
//! - `RpcServer`: serves a devchain's `eth_*` / `evm_*` subset

pub mod types;
pub mod provider;
pub mod client;
pub mod local;
pub mod handlers;
pub mod server;

pub use client::HttpRpcClient;
pub use local::LocalClient;
pub use provider::ChainRpc;
pub use server::RpcServer;
pub use types::{TransactionReceipt, TransactionRequest, TxHash};
