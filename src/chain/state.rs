//! World state of the devchain.
//! - Account struct (nonce, balance, native code name, storage)
//! - WorldState (address -> Account), cloned wholesale for snapshots and eth_call

use alloy_primitives::{Address, Bytes, B256, U256};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    /// name of the native contract deployed here, `None` for externally owned accounts
    pub code: Option<String>,
    /// raw contract storage: slot -> value
    pub storage: BTreeMap<B256, Bytes>,
}

impl Account {
    pub fn funded(balance: U256) -> Self {
        Self { balance, ..Default::default() }
    }

    pub fn contract(name: &str) -> Self {
        Self { code: Some(name.to_string()), ..Default::default() }
    }

    pub fn is_contract(&self) -> bool {
        self.code.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorldState {
    accounts: HashMap<Address, Account>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Mutable access, creating an empty account on first touch.
    pub fn account_mut(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_default()
    }

    pub fn insert(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.account(address).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.account(address).map(|a| a.balance).unwrap_or_default()
    }

    pub fn code(&self, address: &Address) -> Option<&str> {
        self.account(address).and_then(|a| a.code.as_deref())
    }

    /// Unset slots read as empty bytes.
    pub fn sload(&self, address: &Address, slot: B256) -> Bytes {
        self.account(address)
            .and_then(|a| a.storage.get(&slot).cloned())
            .unwrap_or_default()
    }

    pub fn sstore(&mut self, address: Address, slot: B256, value: Bytes) {
        self.account_mut(address).storage.insert(slot, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_defaults_and_writes() {
        let mut st = WorldState::new();
        let addr = Address::repeat_byte(0x11);
        assert!(st.sload(&addr, B256::ZERO).is_empty());
        assert_eq!(st.nonce(&addr), 0);

        st.sstore(addr, B256::ZERO, Bytes::from(vec![1]));
        assert_eq!(st.sload(&addr, B256::ZERO), Bytes::from(vec![1]));
        assert!(!st.account(&addr).unwrap().is_contract());

        st.insert(addr, Account::contract("Alarm"));
        assert_eq!(st.code(&addr), Some("Alarm"));
        assert!(st.sload(&addr, B256::ZERO).is_empty());
    }
}
