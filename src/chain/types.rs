use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

/// Transaction hash, the handle returned by `eth_sendTransaction`.
pub type TxHash = B256;

/// A transaction accepted by the devchain. Signing is implicit: only the
/// node's own dev accounts may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    /// `None` deploys the native contract named by `data`
    pub to: Option<Address>,
    pub data: Bytes,
    pub nonce: u64,
    pub gas: u64,
    pub value: U256,
}

impl Transaction {
    pub fn hash(&self) -> TxHash {
        let mut buf = Vec::with_capacity(20 + 21 + 8 + 8 + 32 + self.data.len());
        buf.extend_from_slice(self.from.as_slice());
        match self.to {
            Some(to) => {
                buf.push(1);
                buf.extend_from_slice(to.as_slice());
            }
            None => buf.push(0),
        }
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.gas.to_be_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes::<32>());
        buf.extend_from_slice(&self.data);
        keccak256(&buf)
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Flat intrinsic cost: base + calldata bytes (+ creation surcharge).
    pub fn intrinsic_gas(&self) -> u64 {
        let data: u64 = self
            .data
            .iter()
            .map(|b| if *b == 0 { 4 } else { 16 })
            .sum();
        let create = if self.is_create() { 32_000 } else { 0 };
        21_000 + data + create
    }
}

/// Address of a contract created by `sender` at `nonce`.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let mut buf = [0u8; 28];
    buf[..20].copy_from_slice(sender.as_slice());
    buf[20..].copy_from_slice(&nonce.to_be_bytes());
    Address::from_word(keccak256(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(nonce: u64) -> Transaction {
        Transaction {
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            data: Bytes::from(vec![0, 1]),
            nonce,
            gas: 100_000,
            value: U256::ZERO,
        }
    }

    #[test]
    fn test_hash_depends_on_nonce() {
        assert_eq!(tx(0).hash(), tx(0).hash());
        assert_ne!(tx(0).hash(), tx(1).hash());
    }

    #[test]
    fn test_intrinsic_gas() {
        assert_eq!(tx(0).intrinsic_gas(), 21_000 + 4 + 16);
        let mut create = tx(0);
        create.to = None;
        assert_eq!(create.intrinsic_gas(), 21_000 + 4 + 16 + 32_000);
    }

    #[test]
    fn test_create_address_unique_per_nonce() {
        let sender = Address::repeat_byte(9);
        assert_ne!(create_address(sender, 0), create_address(sender, 1));
    }
}
