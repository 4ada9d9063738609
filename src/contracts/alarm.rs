use crate::chain::executor::{CallFrame, ExecError};
use crate::contracts::abi::{self, Token};
use crate::contracts::{ContractError, NativeContract};
use crate::rpc::{ChainRpc, TransactionRequest};
use alloy_primitives::{keccak256, Address, Bytes, B256};

pub const NAME: &str = "Alarm";

pub const REGISTER_DATA: &str = "registerData()";
pub const GET_LAST_DATA: &str = "getLastData()";
pub const GET_LAST_DATA_HASH: &str = "getLastDataHash()";

const LAST_DATA_SLOT: B256 = B256::ZERO;
const LAST_DATA_HASH_SLOT: B256 = B256::with_last_byte(1);

/// Stores whatever follows the selector of the last `registerData()` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct Alarm;

impl NativeContract for Alarm {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, frame: &mut CallFrame<'_>, input: &[u8]) -> Result<Bytes, ExecError> {
        let (sel, args) = abi::split_selector(input)?;

        if sel == abi::selector(REGISTER_DATA) {
            let hash = keccak256(args);
            frame.sstore(LAST_DATA_SLOT, Bytes::copy_from_slice(args));
            frame.sstore(LAST_DATA_HASH_SLOT, Bytes::copy_from_slice(hash.as_slice()));
            Ok(Bytes::new())
        } else if sel == abi::selector(GET_LAST_DATA) {
            let data = frame.sload(LAST_DATA_SLOT);
            Ok(abi::encode_tokens(&[Token::Bytes(data)]).into())
        } else if sel == abi::selector(GET_LAST_DATA_HASH) {
            let raw = frame.sload(LAST_DATA_HASH_SLOT);
            let word = if raw.len() == 32 { B256::from_slice(&raw) } else { B256::ZERO };
            Ok(abi::encode_tokens(&[Token::FixedBytes(word)]).into())
        } else {
            Err(ExecError::Revert(format!("Alarm: unknown selector 0x{}", hex::encode(sel))))
        }
    }
}

/// Handle for a deployed Alarm.
pub struct AlarmContract<'a, C: ?Sized> {
    client: &'a C,
    address: Address,
}

impl<'a, C: ChainRpc + ?Sized> AlarmContract<'a, C> {
    pub fn new(client: &'a C, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `getLastDataHash()`; an all-zero hash means nothing was recorded.
    pub async fn last_data_hash(&self) -> Result<Option<B256>, ContractError> {
        let out = self.read(GET_LAST_DATA_HASH).await?;
        let hash = abi::decode_word(&out, 0)?;
        Ok((!hash.is_zero()).then_some(hash))
    }

    /// `getLastData()`
    pub async fn last_data(&self) -> Result<Bytes, ContractError> {
        let out = self.read(GET_LAST_DATA).await?;
        Ok(abi::decode_bytes(&out, 0)?)
    }

    async fn read(&self, signature: &str) -> Result<Bytes, ContractError> {
        let req = TransactionRequest::call(self.address, abi::encode_call(signature, &[]));
        Ok(self.client.call(&req).await?)
    }
}
