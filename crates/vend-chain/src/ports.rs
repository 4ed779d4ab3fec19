//! Outbound port: what the vending engine needs from a ledger indexer.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use vend_types::{Address, TxId, Unit, Utxo};

use crate::error::ChainError;

/// One input of an on-chain transaction, as the indexer reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub address: Address,
    /// True for reference inputs: read, not spent.
    pub reference: bool,
    /// True for collateral inputs: only spent on script failure.
    pub collateral: bool,
}

/// One output of an on-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Address,
    /// Per-unit amounts, lovelace included under the lovelace unit.
    pub amounts: BTreeMap<Unit, u64>,
}

/// Inputs and outputs of a transaction.
#[derive(Debug, Clone, Default)]
pub struct TxDetail {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl TxDetail {
    /// The payer address set: owners of the inputs the transaction
    /// actually spent. Reference and collateral inputs never identify the
    /// payer and are skipped.
    pub fn sender_addresses(&self) -> BTreeSet<Address> {
        self.inputs
            .iter()
            .filter(|input| !input.reference && !input.collateral)
            .map(|input| input.address.clone())
            .collect()
    }

    /// Units of every native asset the transaction produced.
    pub fn output_units(&self) -> BTreeSet<Unit> {
        self.outputs
            .iter()
            .flat_map(|out| out.amounts.keys())
            .filter(|unit| !unit.is_lovelace())
            .cloned()
            .collect()
    }
}

/// Ledger indexer port.
///
/// Implementations retry transient faults internally with bounded backoff;
/// an `Err` returned here is already past its retry budget.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    /// UTXOs currently at `address`, in the indexer's stable pagination
    /// order, minus those whose creating transaction is in `exclude`.
    async fn utxos_at(
        &self,
        address: &Address,
        exclude: &HashSet<TxId>,
    ) -> Result<Vec<Utxo>, ChainError>;

    /// Full input/output detail for one transaction.
    async fn tx_detail(&self, tx_id: &TxId) -> Result<TxDetail, ChainError>;

    /// Auxiliary metadata attached to a transaction, if any.
    ///
    /// Returns the label-keyed JSON document; `None` when the transaction
    /// carries no metadata (a 404 from the indexer).
    async fn tx_metadata_json(
        &self,
        tx_id: &TxId,
    ) -> Result<Option<serde_json::Value>, ChainError>;

    /// Current protocol parameters as the raw indexer document, consumed
    /// verbatim by the external transaction builder.
    async fn protocol_parameters(&self) -> Result<serde_json::Value, ChainError>;

    /// Submits a signed transaction; returns the accepted transaction id.
    async fn submit(&self, signed_cbor: &[u8]) -> Result<TxId, ChainError>;
}
