//! Ledger entities observed through the indexer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::units::{Lovelace, Unit, UnitError};

/// Target network, selecting address prefixes and indexer endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preprod,
    Preview,
}

impl Network {
    /// The bech32 human-readable prefix operator addresses must carry.
    pub fn address_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => "addr1",
            Network::Preprod | Network::Preview => "addr_test1",
        }
    }

    pub fn is_mainnet(self) -> bool {
        matches!(self, Network::Mainnet)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Preprod => f.write_str("preprod"),
            Network::Preview => f.write_str("preview"),
        }
    }
}

/// A ledger transaction identifier: 32 bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(hex: impl Into<String>) -> Result<Self, UnitError> {
        let hex = hex.into();
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UnitError::BadUnit(hex));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unspent output sitting at the payment address: one payment instance.
///
/// Immutable once fetched; the engine re-derives one each poll cycle and
/// discards it when the cycle ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction that created this output. Doubles as the payment
    /// identifier in the exclusion set.
    pub tx_id: TxId,
    /// Index of this output within that transaction.
    pub output_index: u32,
    /// Base-currency value carried by the output.
    pub lovelace: Lovelace,
    /// Native-asset quantities carried alongside, keyed by unit.
    pub assets: BTreeMap<Unit, u64>,
}

impl Utxo {
    /// Quantity of a unit in this output, lovelace included.
    pub fn quantity_of(&self, unit: &Unit) -> u64 {
        if unit.is_lovelace() {
            self.lovelace
        } else {
            self.assets.get(unit).copied().unwrap_or(0)
        }
    }

    /// `tx_id#index`, the conventional UTXO reference spelling.
    pub fn reference(&self) -> String {
        format!("{}#{}", self.tx_id, self.output_index)
    }
}
