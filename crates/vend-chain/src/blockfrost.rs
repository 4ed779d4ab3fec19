//! Blockfrost adapter for the [`ChainIndexer`] port.
//!
//! Read calls get a larger retry budget than submission: re-reading is
//! harmless, re-submitting is bounded so a flapping connection cannot hold
//! a cycle hostage. Backoff is linear (`attempt * unit`) and a 429 is
//! handled like any other transient fault; there is no proactive throttle,
//! so the poll interval must be sized against the indexer's rate limits.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use vend_types::{Address, Network, TxId, Unit, Utxo};

use crate::error::ChainError;
use crate::ports::{ChainIndexer, TxDetail, TxInput, TxOutput};

/// Indexer pagination page size.
const PAGE_SIZE: usize = 100;

/// Linear backoff unit between retry attempts.
const BACKOFF_UNIT: Duration = Duration::from_secs(10);

/// Retry budget for read operations.
const MAX_READ_ATTEMPTS: u32 = 5;

/// Retry budget for submission. Lower: a submit that keeps failing should
/// surface quickly and let the cooldown take over.
const MAX_SUBMIT_ATTEMPTS: u32 = 3;

/// Blockfrost HTTP client.
pub struct BlockfrostClient {
    client: Client,
    base_url: String,
    project_id: String,
}

impl BlockfrostClient {
    /// Creates a client for the given network and project id.
    pub fn new(project_id: impl Into<String>, network: Network) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ChainError::Http)?;

        Ok(Self {
            client,
            base_url: Self::base_url_for(network).to_string(),
            project_id: project_id.into(),
        })
    }

    /// Overrides the endpoint, for self-hosted instances and tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn base_url_for(network: Network) -> &'static str {
        match network {
            Network::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
            Network::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
            Network::Preview => "https://cardano-preview.blockfrost.io/api/v0",
        }
    }

    /// Runs `op` up to `max_attempts` times, sleeping `attempt * unit`
    /// between transient failures. Permanent failures break out at once.
    async fn with_retry<T, F, Fut>(
        &self,
        what: &str,
        max_attempts: u32,
        op: F,
    ) -> Result<T, ChainError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        let mut last: Option<ChainError> = None;
        for attempt in 1..=max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let wait = BACKOFF_UNIT * attempt;
                    warn!(
                        "[chain] {what} attempt {attempt}/{max_attempts} failed ({err}); \
                         retrying in {}s",
                        wait.as_secs()
                    );
                    tokio::time::sleep(wait).await;
                    last = Some(err);
                }
                Err(err) if err.is_transient() => {
                    return Err(ChainError::RetriesExhausted {
                        attempts: max_attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        // Unreachable with max_attempts >= 1; keep the compiler satisfied.
        Err(last.unwrap_or(ChainError::RateLimited))
    }

    /// GET a JSON document. `Ok(None)` on 404 (absent data / end of page).
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ChainError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("project_id", &self.project_id)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => Err(ChainError::RateLimited),
            status if status.is_success() => {
                let value = response
                    .json::<T>()
                    .await
                    .map_err(|e| ChainError::Decode(e.to_string()))?;
                Ok(Some(value))
            }
            status => Err(ChainError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// One entry of an address UTXO listing.
#[derive(Debug, Deserialize)]
struct BfUtxo {
    tx_hash: String,
    output_index: u32,
    amount: Vec<BfAmount>,
}

/// A single unit/quantity pair; quantities arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct BfAmount {
    unit: String,
    quantity: String,
}

impl BfAmount {
    fn quantity_u64(&self) -> Result<u64, ChainError> {
        self.quantity
            .parse::<u64>()
            .map_err(|_| ChainError::Decode(format!("bad quantity {:?}", self.quantity)))
    }
}

#[derive(Debug, Deserialize)]
struct BfTxUtxos {
    inputs: Vec<BfTxInput>,
    outputs: Vec<BfTxOutput>,
}

#[derive(Debug, Deserialize)]
struct BfTxInput {
    address: String,
    #[serde(default)]
    reference: bool,
    #[serde(default)]
    collateral: bool,
}

#[derive(Debug, Deserialize)]
struct BfTxOutput {
    address: String,
    amount: Vec<BfAmount>,
}

#[derive(Debug, Deserialize)]
struct BfMetadataEntry {
    label: String,
    json_metadata: serde_json::Value,
}

fn convert_utxo(raw: BfUtxo) -> Result<Utxo, ChainError> {
    let tx_id =
        TxId::new(&raw.tx_hash).map_err(|e| ChainError::Decode(e.to_string()))?;
    let mut lovelace = 0u64;
    let mut assets = BTreeMap::new();
    for amount in &raw.amount {
        let quantity = amount.quantity_u64()?;
        let unit =
            Unit::parse(&amount.unit).map_err(|e| ChainError::Decode(e.to_string()))?;
        if unit.is_lovelace() {
            lovelace = quantity;
        } else {
            assets.insert(unit, quantity);
        }
    }
    Ok(Utxo {
        tx_id,
        output_index: raw.output_index,
        lovelace,
        assets,
    })
}

#[async_trait]
impl ChainIndexer for BlockfrostClient {
    async fn utxos_at(
        &self,
        address: &Address,
        exclude: &HashSet<TxId>,
    ) -> Result<Vec<Utxo>, ChainError> {
        let mut utxos = Vec::new();
        let mut page = 1usize;
        loop {
            let path =
                format!("/addresses/{}/utxos?count={PAGE_SIZE}&page={page}", address);
            let batch: Vec<BfUtxo> = self
                .with_retry("utxos_at", MAX_READ_ATTEMPTS, || async {
                    Ok(self.get_json(&path).await?.unwrap_or_default())
                })
                .await?;
            let short_page = batch.len() < PAGE_SIZE;
            for raw in batch {
                let utxo = convert_utxo(raw)?;
                if !exclude.contains(&utxo.tx_id) {
                    utxos.push(utxo);
                }
            }
            if short_page {
                break;
            }
            page += 1;
        }
        debug!("[chain] {} candidate UTXOs at {}", utxos.len(), address);
        Ok(utxos)
    }

    async fn tx_detail(&self, tx_id: &TxId) -> Result<TxDetail, ChainError> {
        let path = format!("/txs/{tx_id}/utxos");
        let raw: BfTxUtxos = self
            .with_retry("tx_detail", MAX_READ_ATTEMPTS, || async {
                // The listing showed this transaction; a 404 here is a
                // momentary read inconsistency, not a terminal answer.
                self.get_json(&path).await?.ok_or_else(|| ChainError::NotIndexed {
                    what: format!("transaction {tx_id}"),
                })
            })
            .await?;

        let mut detail = TxDetail::default();
        for input in raw.inputs {
            detail.inputs.push(TxInput {
                address: Address::new(input.address)
                    .map_err(|e| ChainError::Decode(e.to_string()))?,
                reference: input.reference,
                collateral: input.collateral,
            });
        }
        for output in raw.outputs {
            let mut amounts = BTreeMap::new();
            for amount in &output.amount {
                let unit = Unit::parse(&amount.unit)
                    .map_err(|e| ChainError::Decode(e.to_string()))?;
                amounts.insert(unit, amount.quantity_u64()?);
            }
            detail.outputs.push(TxOutput {
                address: Address::new(output.address)
                    .map_err(|e| ChainError::Decode(e.to_string()))?,
                amounts,
            });
        }
        Ok(detail)
    }

    async fn tx_metadata_json(
        &self,
        tx_id: &TxId,
    ) -> Result<Option<serde_json::Value>, ChainError> {
        let path = format!("/txs/{tx_id}/metadata");
        let entries: Option<Vec<BfMetadataEntry>> = self
            .with_retry("tx_metadata", MAX_READ_ATTEMPTS, || async {
                self.get_json(&path).await
            })
            .await?;

        Ok(entries.map(|entries| {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .into_iter()
                .map(|entry| (entry.label, entry.json_metadata))
                .collect();
            serde_json::Value::Object(map)
        }))
    }

    async fn protocol_parameters(&self) -> Result<serde_json::Value, ChainError> {
        self.with_retry("protocol_parameters", MAX_READ_ATTEMPTS, || async {
            self.get_json("/epochs/latest/parameters")
                .await?
                .ok_or_else(|| ChainError::NotIndexed {
                    what: "protocol parameters".into(),
                })
        })
        .await
    }

    async fn submit(&self, signed_cbor: &[u8]) -> Result<TxId, ChainError> {
        let body = signed_cbor.to_vec();
        self.with_retry("submit", MAX_SUBMIT_ATTEMPTS, || {
            let body = body.clone();
            async move {
                let response = self
                    .client
                    .post(format!("{}/tx/submit", self.base_url))
                    .header("project_id", &self.project_id)
                    .header("Content-Type", "application/cbor")
                    .body(body)
                    .send()
                    .await?;

                match response.status() {
                    StatusCode::TOO_MANY_REQUESTS => Err(ChainError::RateLimited),
                    status if status.is_success() => {
                        let hash: String = response
                            .json()
                            .await
                            .map_err(|e| ChainError::Decode(e.to_string()))?;
                        TxId::new(&hash).map_err(|e| ChainError::Decode(e.to_string()))
                    }
                    status if status.is_server_error() => Err(ChainError::Api {
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    }),
                    status => {
                        // The node evaluated and refused the transaction.
                        let reason = response.text().await.unwrap_or_default();
                        Err(ChainError::Rejected(format!("HTTP {status}: {reason}")))
                    }
                }
            }
        })
        .await
    }
}
