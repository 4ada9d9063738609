//! Method handlers backing the JSON-RPC server. Each one maps onto a
//! `DevChain` operation and converts chain errors into JSON-RPC error objects.

use crate::chain::{ChainError, DevChain};
use crate::rpc::types::{TransactionReceipt, TransactionRequest, TxHash};
use crate::utils::metrics::{METRICS, RPC_REQUESTS};
use alloy_primitives::{Address, Bytes, U256, U64};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use std::sync::Arc;

pub const INVALID_PARAMS: i32 = -32602;
/// geth's code for execution / transaction errors
pub const EXECUTION_ERROR: i32 = -32000;

pub const CLIENT_VERSION: &str = concat!("alarm-calldata-devchain/v", env!("CARGO_PKG_VERSION"));

pub fn chain_error_object(err: &ChainError) -> ErrorObjectOwned {
    let code = match err {
        ChainError::InvalidRequest(_) => INVALID_PARAMS,
        _ => EXECUTION_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

type HandlerResult<T> = Result<T, ErrorObjectOwned>;

/// Context object registered with the RpcModule.
pub struct EthApi {
    chain: Arc<DevChain>,
}

impl EthApi {
    pub fn new(chain: Arc<DevChain>) -> Self {
        Self { chain }
    }

    fn count(&self) {
        METRICS.inc_counter(RPC_REQUESTS);
    }

    pub fn accounts(&self) -> HandlerResult<Vec<Address>> {
        self.count();
        Ok(self.chain.accounts().to_vec())
    }

    pub fn block_number(&self) -> HandlerResult<U64> {
        self.count();
        Ok(U64::from(self.chain.block_number()))
    }

    pub fn chain_id(&self) -> HandlerResult<U64> {
        self.count();
        Ok(U64::from(self.chain.chain_id()))
    }

    /// params: `[request, block?]`; only the latest block is served
    pub fn call(&self, params: Params<'_>) -> HandlerResult<Bytes> {
        self.count();
        let mut seq = params.sequence();
        let req: TransactionRequest = seq.next()?;
        let _block: Option<String> = seq.optional_next()?;
        self.chain.call(&req).map_err(|e| chain_error_object(&e))
    }

    pub fn send_transaction(&self, params: Params<'_>) -> HandlerResult<TxHash> {
        self.count();
        let req: TransactionRequest = params.one()?;
        self.chain.send_transaction(&req).map_err(|e| chain_error_object(&e))
    }

    pub fn transaction_receipt(&self, params: Params<'_>) -> HandlerResult<Option<TransactionReceipt>> {
        self.count();
        let hash: TxHash = params.one()?;
        Ok(self.chain.transaction_receipt(&hash))
    }

    pub fn snapshot(&self) -> HandlerResult<U256> {
        self.count();
        Ok(self.chain.snapshot())
    }

    pub fn revert(&self, params: Params<'_>) -> HandlerResult<bool> {
        self.count();
        let id: U256 = params.one()?;
        Ok(self.chain.revert(id))
    }

    /// `evm_mine`: seal a block immediately, returns "0x0" like ganache
    pub fn mine(&self) -> HandlerResult<String> {
        self.count();
        self.chain.mine_block();
        Ok("0x0".to_string())
    }

    pub fn client_version(&self) -> HandlerResult<&'static str> {
        self.count();
        Ok(CLIENT_VERSION)
    }
}
