//! `cardano-cli` adapter for the [`TxBuilder`] port.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;
use vend_types::{Lovelace, Network};

use crate::draft::TxDraft;
use crate::error::BuildError;
use crate::ports::{SignedTx, TxBuilder};

/// Signed transaction envelope as `cardano-cli` writes it.
#[derive(Debug, Deserialize)]
struct TxEnvelope {
    #[serde(rename = "cborHex")]
    cbor_hex: String,
}

/// Drives the external `cardano-cli` binary.
pub struct CardanoCli {
    binary: String,
    network: Network,
    /// Protocol parameters document fetched from the indexer at startup.
    protocol_params_file: PathBuf,
    /// Where body and signed envelope files are written.
    txn_dir: PathBuf,
}

impl CardanoCli {
    pub fn new(
        network: Network,
        protocol_params_file: impl Into<PathBuf>,
        txn_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: "cardano-cli".to_string(),
            network,
            protocol_params_file: protocol_params_file.into(),
            txn_dir: txn_dir.into(),
        }
    }

    /// Overrides the binary, for wrappers and tests.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn network_args(&self) -> Vec<String> {
        match self.network {
            Network::Mainnet => vec!["--mainnet".into()],
            Network::Preprod => vec!["--testnet-magic".into(), "1".into()],
            Network::Preview => vec!["--testnet-magic".into(), "2".into()],
        }
    }

    async fn run(&self, args: &[String]) -> Result<Output, BuildError> {
        debug!("[txbuild] {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(BuildError::Spawn)?;
        if !output.status.success() {
            return Err(BuildError::Rejected {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }

    /// `transaction build-raw` for the draft, into `out_file`.
    async fn build_raw(&self, draft: &TxDraft, out_file: &Path) -> Result<(), BuildError> {
        let mut args: Vec<String> = vec![
            "transaction".into(),
            "build-raw".into(),
            "--fee".into(),
            draft.fee.to_string(),
            "--tx-in".into(),
            draft.input_ref(),
        ];
        for output in &draft.outputs {
            args.push("--tx-out".into());
            args.push(output.render());
        }
        if let Some(mint) = draft.render_mint() {
            args.push("--mint".into());
            args.push(mint);
            for script in &draft.scripts {
                args.push("--minting-script-file".into());
                args.push(script.display().to_string());
            }
        }
        if let Some(metadata) = &draft.metadata_file {
            args.push("--metadata-json-file".into());
            args.push(metadata.display().to_string());
        }
        args.push("--out-file".into());
        args.push(out_file.display().to_string());
        self.run(&args).await?;
        Ok(())
    }

    fn body_file(&self, draft: &TxDraft, suffix: &str) -> PathBuf {
        self.txn_dir.join(format!("{}.{suffix}", draft.input.0))
    }

    /// Parses `"123456 Lovelace"` from `calculate-min-fee` stdout.
    fn parse_fee(stdout: &str) -> Result<Lovelace, BuildError> {
        stdout
            .split_whitespace()
            .next()
            .and_then(|word| word.parse::<Lovelace>().ok())
            .ok_or_else(|| BuildError::MinFeeParse(stdout.trim().to_string()))
    }
}

#[async_trait]
impl TxBuilder for CardanoCli {
    async fn min_fee(&self, draft: &TxDraft, witnesses: u32) -> Result<Lovelace, BuildError> {
        let body = self.body_file(draft, "draft");
        self.build_raw(draft, &body).await?;

        let mut args: Vec<String> = vec![
            "transaction".into(),
            "calculate-min-fee".into(),
            "--tx-body-file".into(),
            body.display().to_string(),
            "--tx-in-count".into(),
            "1".into(),
            "--tx-out-count".into(),
            draft.outputs.len().to_string(),
            "--witness-count".into(),
            witnesses.to_string(),
            "--protocol-params-file".into(),
            self.protocol_params_file.display().to_string(),
        ];
        args.extend(self.network_args());
        let output = self.run(&args).await?;
        Self::parse_fee(&String::from_utf8_lossy(&output.stdout))
    }

    async fn build_and_sign(
        &self,
        draft: &TxDraft,
        signing_keys: &[&Path],
    ) -> Result<SignedTx, BuildError> {
        let body = self.body_file(draft, "raw");
        self.build_raw(draft, &body).await?;

        let signed = self.body_file(draft, "signed");
        let mut args: Vec<String> = vec![
            "transaction".into(),
            "sign".into(),
            "--tx-body-file".into(),
            body.display().to_string(),
        ];
        for key in signing_keys {
            args.push("--signing-key-file".into());
            args.push(key.display().to_string());
        }
        args.extend(self.network_args());
        args.push("--out-file".into());
        args.push(signed.display().to_string());
        self.run(&args).await?;

        let envelope_text = tokio::fs::read_to_string(&signed).await?;
        let envelope: TxEnvelope = serde_json::from_str(&envelope_text)
            .map_err(|e| BuildError::Envelope(e.to_string()))?;
        let cbor = hex::decode(envelope.cbor_hex.trim())
            .map_err(|e| BuildError::Envelope(e.to_string()))?;

        Ok(SignedTx { cbor, path: signed })
    }
}
