//! Operator configuration, loaded once at startup and validated before the
//! first cycle runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use vend_types::{Address, Lovelace, Network, PolicyId, Unit};

use crate::bogo::Bogo;
use crate::pricing::{FEE_HEADROOM, MIN_ADA_ONLY_UTXO};
use crate::rebate::worst_case_single_rebate;

/// Basis-point denominator for the dev fee rate.
const BPS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{role} file {path} is missing")]
    MissingFile { role: &'static str, path: PathBuf },

    #[error("{path} is not a {expected} envelope")]
    BadEnvelope { path: PathBuf, expected: &'static str },

    #[error(
        "base price {price} cannot cover the worst-case rebate plus the \
         profit floor ({floor} lovelace after the dev fee)"
    )]
    PriceTooLow { price: Lovelace, floor: Lovelace },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One minting policy this machine signs for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintPolicy {
    pub policy_id: PolicyId,
    /// Native script file handed to the builder's mint section.
    pub script_file: PathBuf,
    /// Signing key witnessing the script.
    pub signing_key_file: PathBuf,
}

fn default_true() -> bool {
    true
}

/// The full operator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    pub network: Network,
    /// Address buyers pay into.
    pub payment_address: Address,
    /// Key spending the payment address.
    pub payment_signing_key_file: PathBuf,
    /// Address the profit share is swept to.
    pub profit_address: Address,
    /// Unit price per mint, keyed by payment currency.
    pub prices: BTreeMap<Unit, Lovelace>,
    /// Paid mints granted to one payment, at most.
    pub single_vend_max: u64,
    /// Uniform-random item selection instead of lexicographic.
    #[serde(default = "default_true")]
    pub vend_randomly: bool,
    /// Dev fee as basis points of each payment's total.
    #[serde(default)]
    pub dev_fee_bps: u32,
    #[serde(default)]
    pub dev_address: Option<Address>,
    #[serde(default)]
    pub bogo: Option<Bogo>,
    pub policies: Vec<MintPolicy>,
}

impl MintConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        info!("[config] loaded {} with {} policies", path.display(), config.policies.len());
        Ok(config)
    }

    /// Full structural validation, run before the first cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policies.is_empty() {
            return Err(ConfigError::Invalid("no minting policies configured".into()));
        }
        if self.single_vend_max == 0 {
            return Err(ConfigError::Invalid("single_vend_max must be at least 1".into()));
        }
        if self.payment_address == self.profit_address {
            return Err(ConfigError::Invalid(
                "payment and profit addresses must differ".into(),
            ));
        }

        self.check_address("payment_address", &self.payment_address)?;
        self.check_address("profit_address", &self.profit_address)?;

        match (&self.dev_address, self.dev_fee_bps) {
            (None, 0) => {}
            (Some(addr), bps) if bps > 0 => {
                self.check_address("dev_address", addr)?;
                if addr == &self.payment_address || addr == &self.profit_address {
                    return Err(ConfigError::Invalid(
                        "dev address must differ from payment and profit addresses".into(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "dev_address and dev_fee_bps must be set together".into(),
                ));
            }
        }

        if let Some(bogo) = &self.bogo {
            if bogo.threshold == 0 || bogo.additional == 0 {
                return Err(ConfigError::Invalid(
                    "bogo threshold and additional must be at least 1".into(),
                ));
            }
        }

        self.check_prices()?;

        self.check_envelope(&self.payment_signing_key_file, "SigningKey")?;
        for policy in &self.policies {
            self.check_envelope(&policy.signing_key_file, "SigningKey")?;
            self.check_script(&policy.script_file)?;
        }

        info!("[config] validation passed");
        Ok(())
    }

    fn check_address(&self, role: &str, addr: &Address) -> Result<(), ConfigError> {
        Address::for_network(addr.as_str(), self.network)
            .map_err(|e| ConfigError::Invalid(format!("{role}: {e}")))?;
        Ok(())
    }

    fn check_prices(&self) -> Result<(), ConfigError> {
        if self.prices.is_empty() {
            return Err(ConfigError::Invalid("no prices configured".into()));
        }
        for (unit, price) in &self.prices {
            if *price == 0 {
                return Err(ConfigError::Invalid(format!("price for {unit} is zero")));
            }
        }
        // A single full-price mint must still cover its own rebate, the
        // minimum profit output, and the worst miner fee once the dev fee
        // is taken off the top. An asset-priced machine has no base price
        // to check; its payments are judged per vend instead.
        if let Some(price) = self.lovelace_price() {
            let dev_share = price * u64::from(self.dev_fee_bps) / BPS;
            let floor =
                worst_case_single_rebate() + MIN_ADA_ONLY_UTXO + FEE_HEADROOM + dev_share;
            if price < floor {
                return Err(ConfigError::PriceTooLow { price, floor });
            }
        }
        Ok(())
    }

    /// Checks a cardano-cli text envelope: must exist, parse as json, and
    /// carry the expected `type` tag plus a `cborHex` payload.
    fn check_envelope(&self, path: &Path, expected: &'static str) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            role: "signing key",
            path: path.to_path_buf(),
        })?;
        let doc: Value = serde_json::from_str(&raw)
            .map_err(|_| ConfigError::BadEnvelope { path: path.to_path_buf(), expected })?;
        let type_ok = doc
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.contains(expected));
        let has_payload = doc.get("cborHex").and_then(Value::as_str).is_some();
        if !type_ok || !has_payload {
            return Err(ConfigError::BadEnvelope { path: path.to_path_buf(), expected });
        }
        Ok(())
    }

    fn check_script(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            role: "minting script",
            path: path.to_path_buf(),
        })?;
        let doc: Value = serde_json::from_str(&raw).map_err(|_| ConfigError::BadEnvelope {
            path: path.to_path_buf(),
            expected: "script",
        })?;
        if doc.get("type").is_none() {
            return Err(ConfigError::BadEnvelope {
                path: path.to_path_buf(),
                expected: "script",
            });
        }
        Ok(())
    }

    pub fn lovelace_price(&self) -> Option<Lovelace> {
        self.prices.get(&Unit::lovelace()).copied()
    }

    pub fn policy_ids(&self) -> Vec<PolicyId> {
        self.policies.iter().map(|p| p.policy_id.clone()).collect()
    }

    /// Script files in policy order, for the draft's mint section.
    pub fn script_files(&self) -> Vec<PathBuf> {
        self.policies.iter().map(|p| p.script_file.clone()).collect()
    }

    /// Every key that signs a mint: the payment key, then one per policy.
    pub fn signing_key_files(&self) -> Vec<&Path> {
        std::iter::once(self.payment_signing_key_file.as_path())
            .chain(self.policies.iter().map(|p| p.signing_key_file.as_path()))
            .collect()
    }

    /// Witness count the fee estimate must account for.
    pub fn witness_count(&self) -> u32 {
        1 + self.policies.len() as u32
    }
}
