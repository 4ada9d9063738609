//! Minimal Solidity ABI word codec.
//!
//! Covers what the alarm/registry contracts exchange: function selectors,
//! static words (`address`, `uint*`, `bytes32`) and one dynamic type (`bytes`).

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use thiserror::Error;

pub const WORD: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("input too short: need {need} bytes, have {have}")]
    ShortInput { need: usize, have: usize },
    #[error("dynamic offset {0} out of bounds")]
    BadOffset(usize),
    #[error("length {0} does not fit in usize")]
    LengthOverflow(U256),
    #[error("value {value} does not fit in {ty}")]
    OutOfRange { value: U256, ty: &'static str },
    #[error("address word has non-zero padding")]
    DirtyAddress,
}

/// One ABI argument or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    FixedBytes(B256),
    Bytes(Bytes),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::Bytes(_))
    }

    fn head_word(&self) -> B256 {
        match self {
            Token::Address(a) => a.into_word(),
            Token::Uint(v) => uint_word(*v),
            Token::FixedBytes(b) => *b,
            Token::Bytes(_) => B256::ZERO,
        }
    }
}

/// Big-endian 32 byte word of `value`.
pub fn uint_word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Left-pads an address into a 32 byte word: `00 * 12 || address`.
pub fn encode_address(address: Address) -> B256 {
    address.into_word()
}

/// Head/tail encoding of `tokens` (return data or call arguments without selector).
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Bytes(data) => {
                let offset = U256::from(head_len + tail.len());
                head.extend_from_slice(uint_word(offset).as_slice());
                tail.extend_from_slice(uint_word(U256::from(data.len())).as_slice());
                tail.extend_from_slice(data);
                let pad = (WORD - data.len() % WORD) % WORD;
                tail.resize(tail.len() + pad, 0);
            }
            other => {
                debug_assert!(!other.is_dynamic());
                head.extend_from_slice(other.head_word().as_slice());
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Calldata for `signature` called with `tokens`.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Bytes {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode_tokens(tokens));
    out.into()
}

/// Splits calldata into selector and argument bytes.
pub fn split_selector(input: &[u8]) -> Result<([u8; 4], &[u8]), AbiError> {
    if input.len() < 4 {
        return Err(AbiError::ShortInput { need: 4, have: input.len() });
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&input[..4]);
    Ok((sel, &input[4..]))
}

/// Word at position `index` (0-based) of `data`.
pub fn decode_word(data: &[u8], index: usize) -> Result<B256, AbiError> {
    let start = index * WORD;
    let end = start + WORD;
    if data.len() < end {
        return Err(AbiError::ShortInput { need: end, have: data.len() });
    }
    Ok(B256::from_slice(&data[start..end]))
}

pub fn decode_uint(data: &[u8], index: usize) -> Result<U256, AbiError> {
    Ok(U256::from_be_bytes(decode_word(data, index)?.0))
}

pub fn decode_u8(data: &[u8], index: usize) -> Result<u8, AbiError> {
    let value = decode_uint(data, index)?;
    u8::try_from(value).map_err(|_| AbiError::OutOfRange { value, ty: "uint8" })
}

pub fn decode_address(data: &[u8], index: usize) -> Result<Address, AbiError> {
    let word = decode_word(data, index)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyAddress);
    }
    Ok(Address::from_word(word))
}

/// Dynamic `bytes` whose offset word sits at `index`.
pub fn decode_bytes(data: &[u8], index: usize) -> Result<Bytes, AbiError> {
    let offset = to_usize(decode_uint(data, index)?)?;
    if offset % WORD != 0 || offset.checked_add(WORD).map_or(true, |end| end > data.len()) {
        return Err(AbiError::BadOffset(offset));
    }
    let len = to_usize(U256::from_be_slice(&data[offset..offset + WORD]))?;
    let start = offset + WORD;
    let end = start.checked_add(len).ok_or(AbiError::LengthOverflow(U256::from(len)))?;
    if data.len() < end {
        return Err(AbiError::ShortInput { need: end, have: data.len() });
    }
    Ok(Bytes::copy_from_slice(&data[start..end]))
}

fn to_usize(v: U256) -> Result<usize, AbiError> {
    usize::try_from(v).map_err(|_| AbiError::LengthOverflow(v))
}
