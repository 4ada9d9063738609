//! Contract-registration verifier.
//!
//! One request/verify cycle against a deployed TestDataRegistry + Alarm pair:
//! precondition read, `registerAddress` write, confirmation poll, then the
//! three postcondition reads. Any failed check ends the run.

use crate::contracts::abi;
use crate::contracts::registry::{NOT_YET_SUCCEEDED, SUCCEEDED};
use crate::contracts::{AlarmContract, RegistryContract};
use crate::rpc::{ChainRpc, TxHash};
use crate::verifier::wait::{wait_for_transaction, WaitConfig, WaitError};
use crate::verifier::VerifyError;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use tracing::{info, warn};

/// What to register and what the alarm must end up holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub target: Address,
    /// overrides the default `00 * 12 || target`
    pub expected: Option<Bytes>,
    /// sender; the node's first account when `None`
    pub from: Option<Address>,
}

impl Registration {
    pub fn new(target: Address) -> Self {
        Self { target, expected: None, from: None }
    }

    pub fn expected_data(&self) -> Bytes {
        self.expected
            .clone()
            .unwrap_or_else(|| Bytes::copy_from_slice(&expected_encoding(self.target)))
    }
}

/// Storage encoding of an address argument: left-padded to one 32 byte word.
pub fn expected_encoding(address: Address) -> [u8; 32] {
    abi::encode_address(address).0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub data_hash: B256,
    pub data: Bytes,
    /// `data_hash == keccak256(data)`; informational only
    pub hash_consistent: bool,
}

pub struct RegistrationVerifier<'a, C: ?Sized> {
    registry: RegistryContract<'a, C>,
    alarm: AlarmContract<'a, C>,
    client: &'a C,
    wait: WaitConfig,
}

impl<'a, C: ChainRpc + ?Sized> RegistrationVerifier<'a, C> {
    pub fn new(client: &'a C, registry: Address, alarm: Address, wait: WaitConfig) -> Self {
        Self {
            registry: RegistryContract::new(client, registry),
            alarm: AlarmContract::new(client, alarm),
            client,
            wait,
        }
    }

    pub async fn verify(&self, registration: &Registration) -> Result<VerificationReport, VerifyError> {
        let flag = self.registry.was_successful().await?;
        if flag != NOT_YET_SUCCEEDED {
            return Err(VerifyError::Precondition {
                check: "wasSuccessful",
                expected: NOT_YET_SUCCEEDED.to_string(),
                actual: flag.to_string(),
            });
        }

        // nodes other than the devchain require `from` on eth_sendTransaction
        let from = match registration.from {
            Some(from) => from,
            None => self.client.coinbase().await?,
        };
        let tx_hash = self
            .registry
            .register_address(self.alarm.address(), registration.target, from)
            .await?;
        info!(%tx_hash, %from, target = %registration.target, "registerAddress sent");

        let receipt = match wait_for_transaction(self.client, tx_hash, &self.wait).await {
            Ok(r) => r,
            Err(WaitError::Timeout { waited, .. }) => {
                return Err(VerifyError::ConfirmationTimeout { tx_hash, waited })
            }
            Err(WaitError::Rpc(e)) => return Err(e.into()),
        };
        if !receipt.succeeded() {
            return Err(VerifyError::TransactionFailed { tx_hash });
        }
        let block_number = receipt.block();
        info!(%tx_hash, block_number, "registerAddress mined");

        let flag = self.registry.was_successful().await?;
        if flag != SUCCEEDED {
            return Err(VerifyError::Postcondition {
                check: "wasSuccessful",
                expected: SUCCEEDED.to_string(),
                actual: flag.to_string(),
            });
        }

        let data_hash = self.alarm.last_data_hash().await?.ok_or(VerifyError::MissingDataHash)?;

        let data = self.alarm.last_data().await?;
        let expected = registration.expected_data();
        if data != expected {
            return Err(VerifyError::Postcondition {
                check: "getLastData",
                expected: format!("0x{}", hex::encode(&expected)),
                actual: format!("0x{}", hex::encode(&data)),
            });
        }

        let hash_consistent = keccak256(&data) == data_hash;
        if !hash_consistent {
            warn!(%data_hash, "last data hash is not keccak256 of last data");
        }

        info!(%tx_hash, "registration verified");
        Ok(VerificationReport { tx_hash, block_number, data_hash, data, hash_consistent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_expected_encoding_literal() {
        let target = address!("0xc948453368e5ddc7bc00bb52b5809138217a068d");
        let expected: [u8; 32] = [
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xc9, 0x48, 0x45, 0x33, 0x68, 0xe5, 0xdd, 0xc7,
            0xbc, 0x00, 0xbb, 0x52, 0xb5, 0x80, 0x91, 0x38, 0x21, 0x7a, 0x06, 0x8d,
        ];
        assert_eq!(expected_encoding(target), expected);
        assert_eq!(Registration::new(target).expected_data(), Bytes::copy_from_slice(&expected));
    }

    #[test]
    fn test_expected_override() {
        let mut reg = Registration::new(Address::ZERO);
        reg.expected = Some(Bytes::from(vec![1, 2]));
        assert_eq!(reg.expected_data(), Bytes::from(vec![1, 2]));
    }
}
