use crate::chain::executor::{CallFrame, ExecError};
use crate::chain::types::TxHash;
use crate::contracts::abi::{self, Token};
use crate::contracts::{alarm, ContractError, NativeContract};
use crate::rpc::{ChainRpc, TransactionRequest};
use alloy_primitives::{Address, Bytes, B256, U256};
use tracing::debug;

pub const NAME: &str = "TestDataRegistry";

pub const REGISTER_ADDRESS: &str = "registerAddress(address,address)";
pub const WAS_SUCCESSFUL: &str = "wasSuccessful()";

/// `wasSuccessful` before any registration
pub const NOT_YET_SUCCEEDED: u8 = 0;
/// nested `registerData()` call succeeded
pub const SUCCEEDED: u8 = 1;
/// nested call reverted
pub const FAILED: u8 = 2;

const WAS_SUCCESSFUL_SLOT: B256 = B256::ZERO;

/// Forwards an address to `to.registerData()` and records whether that call went through.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestDataRegistry;

impl NativeContract for TestDataRegistry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, frame: &mut CallFrame<'_>, input: &[u8]) -> Result<Bytes, ExecError> {
        let (sel, args) = abi::split_selector(input)?;

        if sel == abi::selector(WAS_SUCCESSFUL) {
            let flag = frame.sload(WAS_SUCCESSFUL_SLOT).first().copied().unwrap_or(NOT_YET_SUCCEEDED);
            Ok(abi::encode_tokens(&[Token::Uint(U256::from(flag))]).into())
        } else if sel == abi::selector(REGISTER_ADDRESS) {
            let to = abi::decode_address(args, 0)?;
            let value = abi::decode_address(args, 1)?;
            let call = abi::encode_call(alarm::REGISTER_DATA, &[Token::Address(value)]);
            let flag = match frame.call(to, &call) {
                Ok(_) if !frame.has_code(to) => {
                    debug!(%to, "registerData target has no code");
                    FAILED
                }
                Ok(_) => SUCCEEDED,
                Err(e) => {
                    debug!(%to, err = %e, "registerData call failed");
                    FAILED
                }
            };
            frame.sstore(WAS_SUCCESSFUL_SLOT, Bytes::from(vec![flag]));
            Ok(Bytes::new())
        } else {
            Err(ExecError::Revert(format!("TestDataRegistry: unknown selector 0x{}", hex::encode(sel))))
        }
    }
}

/// Handle for a deployed TestDataRegistry.
pub struct RegistryContract<'a, C: ?Sized> {
    client: &'a C,
    address: Address,
}

impl<'a, C: ChainRpc + ?Sized> RegistryContract<'a, C> {
    pub fn new(client: &'a C, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `wasSuccessful()`
    pub async fn was_successful(&self) -> Result<u8, ContractError> {
        let req = TransactionRequest::call(self.address, abi::encode_call(WAS_SUCCESSFUL, &[]));
        let out = self.client.call(&req).await?;
        Ok(abi::decode_u8(&out, 0)?)
    }

    /// Send `registerAddress(alarm, value)`; the caller must wait for the receipt.
    pub async fn register_address(
        &self,
        alarm: Address,
        value: Address,
        from: Address,
    ) -> Result<TxHash, ContractError> {
        let data = abi::encode_call(REGISTER_ADDRESS, &[Token::Address(alarm), Token::Address(value)]);
        let req = TransactionRequest::call(self.address, data).from(from);
        Ok(self.client.send_transaction(&req).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::executor::execute_call;
    use crate::chain::state::{Account, WorldState};

    fn registry_addr() -> Address {
        Address::repeat_byte(0x01)
    }

    fn alarm_addr() -> Address {
        Address::repeat_byte(0x02)
    }

    fn setup() -> WorldState {
        let mut st = WorldState::new();
        st.insert(registry_addr(), Account::contract(NAME));
        st.insert(alarm_addr(), Account::contract(alarm::NAME));
        st
    }

    fn flag(st: &mut WorldState) -> u8 {
        let out = execute_call(st, registry_addr(), &abi::encode_call(WAS_SUCCESSFUL, &[]), 0).unwrap();
        abi::decode_u8(&out, 0).unwrap()
    }

    fn register(st: &mut WorldState, to: Address, value: Address) {
        let call = abi::encode_call(REGISTER_ADDRESS, &[Token::Address(to), Token::Address(value)]);
        execute_call(st, registry_addr(), &call, 0).unwrap();
    }

    #[test]
    fn test_register_sets_success_and_alarm_data() {
        let mut st = setup();
        assert_eq!(flag(&mut st), NOT_YET_SUCCEEDED);

        let value = Address::repeat_byte(0x99);
        register(&mut st, alarm_addr(), value);
        assert_eq!(flag(&mut st), SUCCEEDED);

        let out = execute_call(&mut st, alarm_addr(), &abi::encode_call(alarm::GET_LAST_DATA, &[]), 0).unwrap();
        assert_eq!(&abi::decode_bytes(&out, 0).unwrap()[..], value.into_word().as_slice());
    }

    #[test]
    fn test_reverting_target_sets_failed() {
        let mut st = setup();
        // the registry itself has no registerData(), so the nested call reverts
        register(&mut st, registry_addr(), Address::repeat_byte(0x99));
        assert_eq!(flag(&mut st), FAILED);
    }

    #[test]
    fn test_target_without_code_sets_failed() {
        let mut st = setup();
        register(&mut st, Address::repeat_byte(0x55), Address::repeat_byte(0x99));
        assert_eq!(flag(&mut st), FAILED);
    }

    #[test]
    fn test_dirty_address_argument_reverts() {
        let mut st = setup();
        let mut call = abi::selector(REGISTER_ADDRESS).to_vec();
        call.extend_from_slice(&[0xff; 64]);
        let res = execute_call(&mut st, registry_addr(), &call, 0);
        assert!(matches!(res, Err(ExecError::Abi(abi::AbiError::DirtyAddress))));
    }
}
