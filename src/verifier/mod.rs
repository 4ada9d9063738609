//! Verifier: confirmation polling and the registration check.

pub mod wait;
pub mod registration;

pub use registration::{expected_encoding, Registration, RegistrationVerifier, VerificationReport};
pub use wait::{wait_for_block, wait_for_rpc, wait_for_transaction, WaitConfig, WaitError};

use crate::contracts::ContractError;
use crate::contracts::abi::AbiError;
use crate::rpc::TxHash;
use crate::utils::errors::RpcError;
use std::time::Duration;
use thiserror::Error;

/// Why a verification run failed. Every variant is fatal.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("precondition failed: {check} expected {expected}, got {actual}")]
    Precondition { check: &'static str, expected: String, actual: String },

    #[error("transaction {tx_hash} not mined within {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    #[error("transaction {tx_hash} reverted")]
    TransactionFailed { tx_hash: TxHash },

    #[error("postcondition failed: {check} expected {expected}, got {actual}")]
    Postcondition { check: &'static str, expected: String, actual: String },

    #[error("postcondition failed: getLastDataHash returned no hash")]
    MissingDataHash,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("abi decode: {0}")]
    Abi(#[from] AbiError),
}

impl From<ContractError> for VerifyError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Rpc(e) => VerifyError::Rpc(e),
            ContractError::Abi(e) => VerifyError::Abi(e),
        }
    }
}
