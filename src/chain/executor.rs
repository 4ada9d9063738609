//! Executor
//!
//! Applies transactions to the WorldState by dispatching into native contracts.
//! Every call runs against a snapshot so a revert at any depth discards only
//! that frame's writes.

use crate::chain::state::{Account, WorldState};
use crate::chain::types::{create_address, Transaction};
use crate::contracts::{self, abi::AbiError};
use alloy_primitives::{Address, Bytes, B256};
use thiserror::Error;

pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("execution reverted: {0}")]
    Revert(String),
    #[error("max call depth {0} exceeded")]
    CallDepth(usize),
    #[error("unknown contract code {0:?}")]
    UnknownCode(String),
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    #[error("abi: {0}")]
    Abi(#[from] AbiError),
}

/// View of the world handed to a native contract while it executes.
pub struct CallFrame<'a> {
    state: &'a mut WorldState,
    address: Address,
    depth: usize,
}

impl<'a> CallFrame<'a> {
    /// Whether `address` holds contract code (Solidity's `extcodesize > 0` check).
    pub fn has_code(&self, address: Address) -> bool {
        self.state.code(&address).is_some()
    }

    pub fn sload(&self, slot: B256) -> Bytes {
        self.state.sload(&self.address, slot)
    }

    pub fn sstore(&mut self, slot: B256, value: Bytes) {
        self.state.sstore(self.address, slot, value);
    }

    /// Message call from this contract. On error the callee's writes are rolled back.
    pub fn call(&mut self, to: Address, input: &[u8]) -> Result<Bytes, ExecError> {
        call_with_rollback(self.state, to, input, self.depth + 1)
    }
}

fn call_with_rollback(
    state: &mut WorldState,
    to: Address,
    input: &[u8],
    depth: usize,
) -> Result<Bytes, ExecError> {
    let snapshot = state.clone();
    let res = execute_call(state, to, input, depth);
    if res.is_err() {
        *state = snapshot;
    }
    res
}

/// Run `input` against the code at `to`. Calls to accounts without code succeed
/// with empty output, matching EVM message-call semantics.
pub fn execute_call(
    state: &mut WorldState,
    to: Address,
    input: &[u8],
    depth: usize,
) -> Result<Bytes, ExecError> {
    if depth > MAX_CALL_DEPTH {
        return Err(ExecError::CallDepth(MAX_CALL_DEPTH));
    }
    let Some(name) = state.code(&to).map(str::to_string) else {
        return Ok(Bytes::new());
    };
    let contract = contracts::builtin(&name).ok_or(ExecError::UnknownCode(name))?;
    let mut frame = CallFrame { state, address: to, depth };
    contract.execute(&mut frame, input)
}

/// Result of applying one transaction to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub output: Bytes,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub error: Option<ExecError>,
}

/// Apply `tx`. The sender nonce is consumed even when execution reverts.
pub fn apply_transaction(state: &mut WorldState, tx: &Transaction) -> Outcome {
    let nonce = state.nonce(&tx.from);
    state.account_mut(tx.from).nonce = nonce + 1;
    let gas_used = tx.intrinsic_gas();

    let snapshot = state.clone();
    let res = match tx.to {
        Some(to) => transfer(state, tx)
            .and_then(|_| execute_call(state, to, &tx.data, 0))
            .map(|out| (out, None)),
        None => deploy(state, tx, nonce).map(|addr| (Bytes::new(), Some(addr))),
    };

    match res {
        Ok((output, contract_address)) => Outcome { success: true, output, contract_address, gas_used, error: None },
        Err(e) => {
            *state = snapshot;
            Outcome { success: false, output: Bytes::new(), contract_address: None, gas_used, error: Some(e) }
        }
    }
}

fn transfer(state: &mut WorldState, tx: &Transaction) -> Result<(), ExecError> {
    let Some(to) = tx.to else { return Ok(()) };
    if tx.value.is_zero() {
        return Ok(());
    }
    let from_balance = state.balance(&tx.from);
    if from_balance < tx.value {
        return Err(ExecError::InsufficientBalance);
    }
    state.account_mut(tx.from).balance = from_balance - tx.value;
    let to_acc = state.account_mut(to);
    to_acc.balance = to_acc.balance.saturating_add(tx.value);
    Ok(())
}

fn deploy(state: &mut WorldState, tx: &Transaction, nonce: u64) -> Result<Address, ExecError> {
    let name = String::from_utf8(tx.data.to_vec())
        .map_err(|_| ExecError::Revert("deployment data is not a contract name".into()))?;
    if contracts::builtin(&name).is_none() {
        return Err(ExecError::UnknownCode(name));
    }
    let address = create_address(tx.from, nonce);
    if state.account(&address).is_some_and(Account::is_contract) {
        return Err(ExecError::Revert(format!("contract already deployed at {address}")));
    }
    let mut account = Account::contract(&name);
    account.balance = tx.value;
    if !tx.value.is_zero() {
        let from_balance = state.balance(&tx.from);
        if from_balance < tx.value {
            return Err(ExecError::InsufficientBalance);
        }
        state.account_mut(tx.from).balance = from_balance - tx.value;
    }
    state.insert(address, account);
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{abi, alarm, registry};
    use alloy_primitives::U256;

    fn sender() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn deploy_tx(name: &str, nonce: u64) -> Transaction {
        Transaction {
            from: sender(),
            to: None,
            data: Bytes::copy_from_slice(name.as_bytes()),
            nonce,
            gas: 1_000_000,
            value: U256::ZERO,
        }
    }

    #[test]
    fn test_deploy_and_call_unknown_selector_reverts() {
        let mut st = WorldState::new();
        let out = apply_transaction(&mut st, &deploy_tx(alarm::NAME, 0));
        assert!(out.success);
        let alarm_addr = out.contract_address.unwrap();
        assert_eq!(st.code(&alarm_addr), Some(alarm::NAME));

        let bad = Transaction {
            from: sender(),
            to: Some(alarm_addr),
            data: abi::encode_call("nope()", &[]),
            nonce: 1,
            gas: 100_000,
            value: U256::ZERO,
        };
        let out = apply_transaction(&mut st, &bad);
        assert!(!out.success);
        assert!(matches!(out.error, Some(ExecError::Revert(_))));
        // nonce consumed even on revert
        assert_eq!(st.nonce(&sender()), 2);
    }

    #[test]
    fn test_deploy_unknown_contract_fails() {
        let mut st = WorldState::new();
        let out = apply_transaction(&mut st, &deploy_tx("Mystery", 0));
        assert_eq!(out.error, Some(ExecError::UnknownCode("Mystery".into())));
        assert!(out.contract_address.is_none());
    }

    #[test]
    fn test_call_to_account_without_code_is_empty_success() {
        let mut st = WorldState::new();
        let out = execute_call(&mut st, Address::repeat_byte(3), &[1, 2, 3], 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut st = WorldState::new();
        let res = execute_call(&mut st, Address::ZERO, &[], MAX_CALL_DEPTH + 1);
        assert_eq!(res, Err(ExecError::CallDepth(MAX_CALL_DEPTH)));
    }

    #[test]
    fn test_transfer_requires_balance() {
        let mut st = WorldState::new();
        st.insert(sender(), Account::funded(U256::from(10)));
        let mut tx = deploy_tx(registry::NAME, 0);
        tx.to = Some(Address::repeat_byte(5));
        tx.data = Bytes::new();
        tx.value = U256::from(11);
        let out = apply_transaction(&mut st, &tx);
        assert_eq!(out.error, Some(ExecError::InsufficientBalance));
        assert_eq!(st.balance(&sender()), U256::from(10));

        tx.value = U256::from(4);
        tx.nonce = 1;
        assert!(apply_transaction(&mut st, &tx).success);
        assert_eq!(st.balance(&Address::repeat_byte(5)), U256::from(4));
    }
}
