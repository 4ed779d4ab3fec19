//! Outbound port: what the vending engine needs from a transaction builder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vend_types::Lovelace;

use crate::draft::TxDraft;
use crate::error::BuildError;

/// A signed transaction ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTx {
    /// Raw CBOR bytes accepted by the submission endpoint.
    pub cbor: Vec<u8>,
    /// Where the signed envelope was written, kept for the audit trail.
    pub path: PathBuf,
}

/// Transaction builder port.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    /// Minimum fee for the draft with the given witness count.
    async fn min_fee(&self, draft: &TxDraft, witnesses: u32) -> Result<Lovelace, BuildError>;

    /// Builds the final draft and signs it with the given key files.
    async fn build_and_sign(
        &self,
        draft: &TxDraft,
        signing_keys: &[&Path],
    ) -> Result<SignedTx, BuildError>;
}
