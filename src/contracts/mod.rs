//! Contracts: native implementations executed by the devchain, plus typed
//! handles that talk to deployed instances through any `ChainRpc`.
//!
//! - abi: selector + word codec
//! - alarm: `Alarm`, records the data it was called with
//! - registry: `TestDataRegistry`, forwards an address to an alarm and flags the result

pub mod abi;
pub mod alarm;
pub mod registry;

pub use alarm::{Alarm, AlarmContract};
pub use registry::{RegistryContract, TestDataRegistry};

use crate::chain::executor::{CallFrame, ExecError};
use crate::utils::errors::RpcError;
use alloy_primitives::Bytes;
use thiserror::Error;

/// A contract whose code is Rust instead of EVM bytecode.
pub trait NativeContract: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Execute calldata `input` in `frame`. Returning `Err` reverts the frame.
    fn execute(&self, frame: &mut CallFrame<'_>, input: &[u8]) -> Result<Bytes, ExecError>;
}

static ALARM: Alarm = Alarm;
static REGISTRY: TestDataRegistry = TestDataRegistry;

/// Names accepted as deployment data.
pub const BUILTIN_NAMES: &[&str] = &[alarm::NAME, registry::NAME];

/// Resolve a deployable contract by name.
pub fn builtin(name: &str) -> Option<&'static dyn NativeContract> {
    match name {
        alarm::NAME => Some(&ALARM),
        registry::NAME => Some(&REGISTRY),
        _ => None,
    }
}

/// Errors from the client-side contract handles.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("abi decode: {0}")]
    Abi(#[from] abi::AbiError),
}
