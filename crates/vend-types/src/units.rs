//! Currency units, policy identifiers, and addresses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base-currency amount in lovelace (1 ADA = 1_000_000 lovelace).
pub type Lovelace = u64;

/// The base-currency unit string used by the indexer.
pub const LOVELACE: &str = "lovelace";

/// Length of a hex-encoded minting policy id (28 bytes).
const POLICY_ID_HEX_LEN: usize = 56;

/// Errors raised when constructing validated primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("Policy id must be {POLICY_ID_HEX_LEN} hex chars, got {0:?}")]
    BadPolicyId(String),

    #[error("Asset unit {0:?} is neither lovelace nor policy-id ++ asset-name hex")]
    BadUnit(String),

    #[error("Address {address:?} does not match the {expected:?} network prefix")]
    WrongNetwork { address: String, expected: String },

    #[error("Address {0:?} is not bech32 text")]
    BadAddress(String),
}

/// A minting policy identifier: 28 bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    pub fn new(hex: impl Into<String>) -> Result<Self, UnitError> {
        let hex = hex.into();
        if hex.len() != POLICY_ID_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UnitError::BadPolicyId(hex));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An asset unit as the indexer reports it: `"lovelace"` for the base
/// currency, otherwise the policy id immediately followed by the
/// hex-encoded asset name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(String);

impl Unit {
    pub fn lovelace() -> Self {
        Self(LOVELACE.to_string())
    }

    pub fn parse(raw: impl Into<String>) -> Result<Self, UnitError> {
        let raw = raw.into();
        if raw == LOVELACE {
            return Ok(Self(raw));
        }
        if raw.len() < POLICY_ID_HEX_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UnitError::BadUnit(raw));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Builds the unit for an asset under a known policy.
    pub fn from_parts(policy: &PolicyId, asset_name_hex: &str) -> Self {
        Self(format!("{}{}", policy.as_str(), asset_name_hex.to_ascii_lowercase()))
    }

    pub fn is_lovelace(&self) -> bool {
        self.0 == LOVELACE
    }

    /// The policy id component, absent for the base currency.
    pub fn policy_id(&self) -> Option<PolicyId> {
        if self.is_lovelace() {
            return None;
        }
        PolicyId::new(&self.0[..POLICY_ID_HEX_LEN]).ok()
    }

    /// The hex-encoded asset name component, absent for the base currency.
    pub fn asset_name_hex(&self) -> Option<&str> {
        if self.is_lovelace() {
            None
        } else {
            Some(&self.0[POLICY_ID_HEX_LEN..])
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bech32 payment address, checked against the expected network prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Accepts any bech32-looking address without a network check.
    ///
    /// Used for addresses observed on chain; operator-supplied addresses
    /// go through [`Address::for_network`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UnitError> {
        let raw = raw.into();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(UnitError::BadAddress(raw));
        }
        Ok(Self(raw))
    }

    /// Accepts an address only if it carries the given network's prefix.
    pub fn for_network(
        raw: impl Into<String>,
        network: crate::Network,
    ) -> Result<Self, UnitError> {
        let addr = Self::new(raw)?;
        let expected = network.address_prefix();
        if !addr.0.starts_with(expected) {
            return Err(UnitError::WrongNetwork {
                address: addr.0,
                expected: expected.to_string(),
            });
        }
        // Mainnet's "addr1" prefix is a prefix of nothing else, but the
        // testnet prefix check must not accept a mainnet address.
        Ok(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
