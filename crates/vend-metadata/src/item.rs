//! One mintable item descriptor: a single-asset CIP-25 fragment on disk.

use std::path::{Path, PathBuf};

use serde_json::Value;
use vend_types::PolicyId;

use crate::error::PoolError;

/// On-chain asset names are capped at 32 bytes.
const MAX_ASSET_NAME_BYTES: usize = 32;

/// CIP-25 top-level metadata label.
pub(crate) const CIP25_LABEL: &str = "721";

/// A parsed item descriptor.
///
/// Each pool file holds exactly one asset under exactly one policy:
/// `{"721": {"<policy>": {"<asset name>": { ...attributes }}}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftItem {
    /// File name within the pool, stable across state moves.
    pub file_name: String,
    /// Current location of the descriptor file.
    pub path: PathBuf,
    pub policy: PolicyId,
    /// UTF-8 asset name, the key under the policy object.
    pub asset_name: String,
    /// The attribute object minted under the asset name.
    pub attributes: Value,
}

impl NftItem {
    /// Parses a descriptor file, enforcing the single-policy single-asset
    /// shape and the on-chain asset name limit.
    pub fn parse(path: &Path) -> Result<Self, PoolError> {
        let malformed = |reason: &str| PoolError::Malformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let text = std::fs::read_to_string(path)?;
        let doc: Value =
            serde_json::from_str(&text).map_err(|e| malformed(&e.to_string()))?;

        let policies = doc
            .get(CIP25_LABEL)
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("missing \"721\" object"))?;
        if policies.len() != 1 {
            return Err(malformed("expected exactly one policy"));
        }
        let (policy_hex, assets) = policies
            .iter()
            .next()
            .ok_or_else(|| malformed("expected exactly one policy"))?;
        let policy = PolicyId::new(policy_hex)
            .map_err(|e| malformed(&e.to_string()))?;

        let assets = assets
            .as_object()
            .ok_or_else(|| malformed("policy value is not an object"))?;
        if assets.len() != 1 {
            return Err(malformed("expected exactly one asset"));
        }
        let (asset_name, attributes) = assets
            .iter()
            .next()
            .ok_or_else(|| malformed("expected exactly one asset"))?;
        if asset_name.is_empty() || asset_name.len() > MAX_ASSET_NAME_BYTES {
            return Err(malformed("asset name must be 1..=32 bytes"));
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| malformed("no file name"))?
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            file_name,
            path: path.to_path_buf(),
            policy,
            asset_name: asset_name.clone(),
            attributes: attributes.clone(),
        })
    }

    /// Hex spelling of the asset name, as mint instructions want it.
    pub fn asset_name_hex(&self) -> String {
        hex::encode(self.asset_name.as_bytes())
    }
}
