//! Integration tests: bring up a devnode, deploy the contract pair, run the registration check.

use crate::chain::{ChainConfig, DevChain};
use crate::contracts::{alarm, registry, abi};
use crate::fixtures::{DeployConfig, DeployedContracts};
use crate::node::{DevNode, DevNodeConfig};
use crate::rpc::{ChainRpc, LocalClient, TransactionReceipt, TransactionRequest, TxHash};
use crate::utils::errors::RpcResult;
use crate::verifier::{Registration, RegistrationVerifier, VerifyError, WaitConfig};
use alloy_primitives::{address, Address, Bytes, U256, U64};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Duration;

const TARGET: Address = address!("0xc948453368e5ddc7bc00bb52b5809138217a068d");

fn fast_deploy() -> DeployConfig {
    DeployConfig {
        max_wait: Duration::from_secs(5),
        max_first_block_wait: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

fn fast_wait() -> WaitConfig {
    WaitConfig::new(Duration::from_secs(5), Duration::from_millis(10))
}

async fn spawn_node() -> DevNode {
    DevNode::spawn(DevNodeConfig {
        block_time: Duration::from_millis(20),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    })
    .await
    .unwrap()
}

/// Deploys both contracts on a chain nobody mines automatically.
fn deploy_without_miner(chain: &DevChain) -> (Address, Address) {
    let alarm_tx = chain.send_transaction(&TransactionRequest::deploy(alarm::NAME)).unwrap();
    let registry_tx = chain.send_transaction(&TransactionRequest::deploy(registry::NAME)).unwrap();
    chain.mine_block();
    let addr = |tx: &TxHash| chain.transaction_receipt(tx).unwrap().contract_address.unwrap();
    (addr(&registry_tx), addr(&alarm_tx))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registration_over_http() {
    let node = spawn_node().await;
    let client = node.client().unwrap();

    let deployed = DeployedContracts::deploy_registration_pair(&client, &fast_deploy()).await.unwrap();
    let registry_addr = deployed.get(registry::NAME).unwrap();
    let alarm_addr = deployed.get(alarm::NAME).unwrap();

    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    let report = verifier.verify(&Registration::new(TARGET)).await.unwrap();

    let mut expected = [0u8; 32];
    expected[12..].copy_from_slice(&hex::decode("c948453368e5ddc7bc00bb52b5809138217a068d").unwrap());
    assert_eq!(&report.data[..], &expected[..]);
    assert!(report.hash_consistent);
    assert!(report.block_number >= 1);

    let reg = deployed.registry(&client).unwrap();
    assert_eq!(reg.was_successful().await.unwrap(), registry::SUCCEEDED);
    let hash = deployed.alarm(&client).unwrap().last_data_hash().await.unwrap();
    assert_eq!(hash, Some(report.data_hash));

    node.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_run_fails_precondition_until_revert() {
    let node = spawn_node().await;
    let client = node.client().unwrap();
    let deployed = DeployedContracts::deploy_registration_pair(&client, &fast_deploy()).await.unwrap();
    let verifier = RegistrationVerifier::new(
        &client,
        deployed.get(registry::NAME).unwrap(),
        deployed.get(alarm::NAME).unwrap(),
        fast_wait(),
    );

    let snap = client.snapshot().await.unwrap();
    verifier.verify(&Registration::new(TARGET)).await.unwrap();

    let err = verifier.verify(&Registration::new(TARGET)).await.unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Precondition { check: "wasSuccessful", ref actual, .. } if actual == "1"
    ));

    assert!(client.revert(snap).await.unwrap());
    verifier.verify(&Registration::new(TARGET)).await.unwrap();

    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unmined_registration_times_out() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let client = LocalClient::new(chain.clone());

    let wait = WaitConfig::new(Duration::from_millis(100), Duration::from_millis(10));
    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, wait);
    let err = verifier.verify(&Registration::new(TARGET)).await.unwrap_err();
    match err {
        VerifyError::ConfirmationTimeout { waited, .. } => assert!(waited >= Duration::from_millis(100)),
        other => panic!("expected timeout, got {other}"),
    }
    assert_eq!(chain.pending_count(), 1);
}

#[tokio::test]
async fn test_expected_override_mismatch() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let client = LocalClient::new(chain.clone());

    let miner = {
        let chain = chain.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                tokio::time::sleep(Duration::from_millis(10)).await;
                chain.mine_block();
            }
        })
    };

    let mut registration = Registration::new(TARGET);
    // the raw 20 bytes, without left padding
    registration.expected = Some(Bytes::copy_from_slice(TARGET.as_slice()));
    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    let err = verifier.verify(&registration).await.unwrap_err();
    assert!(matches!(err, VerifyError::Postcondition { check: "getLastData", .. }));
    miner.abort();
}

/// Wraps a devchain and mines on every send; records sent requests and can fake failures.
struct Scripted {
    inner: LocalClient,
    sent: Mutex<Vec<TransactionRequest>>,
    zero_data_hash: bool,
    revert_receipts: bool,
}

impl Scripted {
    fn new(chain: Arc<DevChain>) -> Self {
        Self {
            inner: LocalClient::new(chain),
            sent: Mutex::new(Vec::new()),
            zero_data_hash: false,
            revert_receipts: false,
        }
    }
}

#[async_trait]
impl ChainRpc for Scripted {
    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        self.inner.accounts().await
    }

    async fn block_number(&self) -> RpcResult<u64> {
        self.inner.block_number().await
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        if self.zero_data_hash && request.data.starts_with(&abi::selector(alarm::GET_LAST_DATA_HASH)) {
            return Ok(Bytes::from(vec![0u8; 32]));
        }
        self.inner.call(request).await
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<TxHash> {
        self.sent.lock().push(request.clone());
        let hash = self.inner.send_transaction(request).await?;
        self.inner.chain().mine_block();
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> RpcResult<Option<TransactionReceipt>> {
        let receipt = self.inner.transaction_receipt(hash).await?;
        Ok(receipt.map(|mut r| {
            if self.revert_receipts {
                r.status = Some(U64::ZERO);
            }
            r
        }))
    }

    async fn snapshot(&self) -> RpcResult<U256> {
        self.inner.snapshot().await
    }

    async fn revert(&self, id: U256) -> RpcResult<bool> {
        self.inner.revert(id).await
    }
}

#[tokio::test]
async fn test_zero_data_hash_is_missing() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let mut client = Scripted::new(chain);
    client.zero_data_hash = true;

    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    let err = verifier.verify(&Registration::new(TARGET)).await.unwrap_err();
    assert!(matches!(err, VerifyError::MissingDataHash));
}

#[tokio::test]
async fn test_reverted_receipt_fails() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let mut client = Scripted::new(chain);
    client.revert_receipts = true;

    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    let err = verifier.verify(&Registration::new(TARGET)).await.unwrap_err();
    assert!(matches!(err, VerifyError::TransactionFailed { .. }));
}

#[tokio::test]
async fn test_registry_pointed_at_wrong_alarm() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, _) = deploy_without_miner(&chain);
    let client = Scripted::new(chain);

    // nested registerData() reverts inside the registry, so the flag ends up FAILED
    let verifier = RegistrationVerifier::new(&client, registry_addr, registry_addr, fast_wait());
    let err = verifier.verify(&Registration::new(TARGET)).await.unwrap_err();
    match err {
        VerifyError::Postcondition { check, actual, .. } => {
            assert_eq!(check, "wasSuccessful");
            assert_eq!(actual, registry::FAILED.to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_register_address_sent_from_coinbase() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let client = Scripted::new(chain.clone());

    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    verifier.verify(&Registration::new(TARGET)).await.unwrap();

    let sent = client.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, Some(chain.accounts()[0]));
    assert_eq!(sent[0].to, Some(registry_addr));
}

#[tokio::test]
async fn test_register_address_sent_from_explicit_sender() {
    let chain = Arc::new(DevChain::new(ChainConfig::default()));
    let (registry_addr, alarm_addr) = deploy_without_miner(&chain);
    let client = Scripted::new(chain.clone());

    let mut registration = Registration::new(TARGET);
    registration.from = Some(chain.accounts()[1]);
    let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, fast_wait());
    verifier.verify(&registration).await.unwrap();

    assert_eq!(client.sent.lock()[0].from, Some(chain.accounts()[1]));
}
