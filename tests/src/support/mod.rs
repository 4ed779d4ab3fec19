//! Shared fixtures: an in-memory indexer, a recording builder, and a
//! tempdir-backed machine fixture.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use vend_chain::{ChainError, ChainIndexer, TxDetail, TxInput, TxOutput};
use vend_engine::{ExclusionSet, MintConfig, MintPolicy, VendingMachine};
use vend_metadata::MetadataPool;
use vend_txbuild::{BuildError, SignedTx, TxBuilder, TxDraft};
use vend_types::{Address, Lovelace, Network, PolicyId, TxId, Unit, Utxo};

pub const PRICE: Lovelace = 10_000_000;
pub const BUYER: &str = "addr_test1qbuyer";

pub fn policy_hex() -> String {
    "ab".repeat(28)
}

pub fn policy_id() -> PolicyId {
    PolicyId::new(policy_hex()).unwrap()
}

pub fn tx(byte: &str) -> TxId {
    TxId::new(byte.repeat(32)).unwrap()
}

pub fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

pub fn payment(byte: &str, lovelace: Lovelace) -> Utxo {
    Utxo {
        tx_id: tx(byte),
        output_index: 0,
        lovelace,
        assets: BTreeMap::new(),
    }
}

/// In-memory stand-in for the ledger indexer.
#[derive(Default)]
pub struct MockChain {
    pub utxos: Mutex<Vec<Utxo>>,
    pub details: Mutex<HashMap<TxId, TxDetail>>,
    pub aux: Mutex<HashMap<TxId, Value>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
    /// Number of submit calls to fail transiently before succeeding.
    pub submit_failures: AtomicU32,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a payment UTXO whose transaction spent one input owned
    /// by `sender`.
    pub fn add_payment(&self, utxo: Utxo, sender: &str) {
        self.details.lock().unwrap().insert(
            utxo.tx_id.clone(),
            TxDetail {
                inputs: vec![TxInput {
                    address: addr(sender),
                    reference: false,
                    collateral: false,
                }],
                outputs: vec![],
            },
        );
        self.utxos.lock().unwrap().push(utxo);
    }

    /// Adds native-asset units to a payment transaction's outputs, as if
    /// the buyer's wallet returned the assets to itself as change.
    pub fn add_output_units(&self, payment: &TxId, owner: &str, units: &[Unit]) {
        let mut details = self.details.lock().unwrap();
        let detail = details.entry(payment.clone()).or_default();
        detail.outputs.push(TxOutput {
            address: addr(owner),
            amounts: units.iter().map(|u| (u.clone(), 1)).collect(),
        });
    }

    pub fn set_aux(&self, payment: &TxId, aux: Value) {
        self.aux.lock().unwrap().insert(payment.clone(), aux);
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

/// Shared handle over a [`MockChain`]; the machine owns the handle while
/// the test keeps the `Arc` for inspection.
#[derive(Clone)]
pub struct ChainHandle(pub Arc<MockChain>);

#[async_trait]
impl ChainIndexer for ChainHandle {
    async fn utxos_at(
        &self,
        _address: &Address,
        exclude: &HashSet<TxId>,
    ) -> Result<Vec<Utxo>, ChainError> {
        Ok(self
            .0
            .utxos
            .lock()
            .unwrap()
            .iter()
            .filter(|u| !exclude.contains(&u.tx_id))
            .cloned()
            .collect())
    }

    async fn tx_detail(&self, tx_id: &TxId) -> Result<TxDetail, ChainError> {
        Ok(self
            .0
            .details
            .lock()
            .unwrap()
            .get(tx_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn tx_metadata_json(&self, tx_id: &TxId) -> Result<Option<Value>, ChainError> {
        Ok(self.0.aux.lock().unwrap().get(tx_id).cloned())
    }

    async fn protocol_parameters(&self) -> Result<Value, ChainError> {
        Ok(json!({ "min_fee_a": 44, "min_fee_b": 155381 }))
    }

    async fn submit(&self, signed_cbor: &[u8]) -> Result<TxId, ChainError> {
        if self
            .0
            .submit_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ChainError::RetriesExhausted {
                attempts: 3,
                last: Box::new(ChainError::RateLimited),
            });
        }
        let mut submitted = self.0.submitted.lock().unwrap();
        submitted.push(signed_cbor.to_vec());
        Ok(TxId::new(format!("{:064x}", submitted.len())).unwrap())
    }
}

/// Builder that records every draft and charges a flat fee.
pub struct RecordingBuilder {
    pub fee: Lovelace,
    pub drafts: Mutex<Vec<TxDraft>>,
}

impl RecordingBuilder {
    pub fn new(fee: Lovelace) -> Arc<Self> {
        Arc::new(Self {
            fee,
            drafts: Mutex::new(Vec::new()),
        })
    }

    /// The final (fee-bearing) draft of the most recent build.
    pub fn last_draft(&self) -> TxDraft {
        self.drafts.lock().unwrap().last().cloned().unwrap()
    }
}

/// Shared handle over a [`RecordingBuilder`], same split as [`ChainHandle`].
#[derive(Clone)]
pub struct BuilderHandle(pub Arc<RecordingBuilder>);

#[async_trait]
impl TxBuilder for BuilderHandle {
    async fn min_fee(&self, _draft: &TxDraft, _witnesses: u32) -> Result<Lovelace, BuildError> {
        Ok(self.0.fee)
    }

    async fn build_and_sign(
        &self,
        draft: &TxDraft,
        _signing_keys: &[&Path],
    ) -> Result<SignedTx, BuildError> {
        self.0.drafts.lock().unwrap().push(draft.clone());
        Ok(SignedTx {
            cbor: draft.input_ref().into_bytes(),
            path: PathBuf::from("signed.tx"),
        })
    }
}

/// A tempdir-backed machine environment with the standard test pricing:
/// 10 ADA per mint, vend cap 5, deterministic selection.
pub struct Fixture {
    pub dir: TempDir,
    pub config: MintConfig,
}

impl Fixture {
    pub fn new(items: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let metadata_dir = dir.path().join("nfts");
        fs::create_dir_all(&metadata_dir).unwrap();
        for i in 0..items {
            let body = format!(
                r#"{{"721": {{"{}": {{"Item {i}": {{"image": "ipfs://{i}"}}}}}}}}"#,
                policy_hex()
            );
            fs::write(metadata_dir.join(format!("item{i:03}.json")), body).unwrap();
        }

        let key_body = r#"{"type": "PaymentSigningKeyShelley_ed25519", "cborHex": "5820ab"}"#;
        let payment_key = dir.path().join("payment.skey");
        let policy_key = dir.path().join("policy.skey");
        let script = dir.path().join("policy.script");
        fs::write(&payment_key, key_body).unwrap();
        fs::write(&policy_key, key_body).unwrap();
        fs::write(&script, r#"{"type": "sig", "keyHash": "00"}"#).unwrap();

        let mut prices = BTreeMap::new();
        prices.insert(Unit::lovelace(), PRICE);
        let config = MintConfig {
            network: Network::Preprod,
            payment_address: addr("addr_test1qpayment"),
            payment_signing_key_file: payment_key,
            profit_address: addr("addr_test1qprofit"),
            prices,
            single_vend_max: 5,
            vend_randomly: false,
            dev_fee_bps: 0,
            dev_address: None,
            bogo: None,
            policies: vec![MintPolicy {
                policy_id: policy_id(),
                script_file: script,
                signing_key_file: policy_key,
            }],
        };

        Self { dir, config }
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.dir.path().join("nfts")
    }

    pub fn in_proc_dir(&self) -> PathBuf {
        self.dir.path().join("in_proc")
    }

    pub fn minted_dir(&self) -> PathBuf {
        self.dir.path().join("minted")
    }

    pub fn whitelist_dir(&self) -> PathBuf {
        let path = self.dir.path().join("whitelist");
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn consumed_dir(&self) -> PathBuf {
        let path = self.dir.path().join("wl_consumed");
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn pool(&self) -> MetadataPool {
        MetadataPool::open(self.metadata_dir(), self.in_proc_dir(), self.minted_dir()).unwrap()
    }

    pub fn exclusions(&self) -> ExclusionSet {
        ExclusionSet::open(self.dir.path().join("exclusions.log")).unwrap()
    }

    pub fn machine(
        &self,
        chain: &Arc<MockChain>,
        builder: &Arc<RecordingBuilder>,
        whitelist: vend_whitelist::Whitelist,
    ) -> VendingMachine<ChainHandle, BuilderHandle> {
        VendingMachine::new(
            self.config.clone(),
            ChainHandle(Arc::clone(chain)),
            BuilderHandle(Arc::clone(builder)),
            self.pool(),
            whitelist,
        )
    }

    /// Items still waiting in the available pool, counted off disk.
    pub fn available_count(&self) -> usize {
        fs::read_dir(self.metadata_dir())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".json")
            })
            .count()
    }
}
