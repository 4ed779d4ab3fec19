//! Draft transaction values handed to the external builder.

use std::path::PathBuf;

use vend_types::{Address, Lovelace, PolicyId, TxId, Unit};

/// One output of a draft transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOutput {
    pub address: Address,
    pub lovelace: Lovelace,
    /// Native assets carried by the output.
    pub assets: Vec<(Unit, u64)>,
}

impl DraftOutput {
    pub fn lovelace_only(address: Address, lovelace: Lovelace) -> Self {
        Self {
            address,
            lovelace,
            assets: Vec::new(),
        }
    }

    /// The `address+lovelace+"qty policy.name"` spelling the builder takes.
    pub fn render(&self) -> String {
        let mut rendered = format!("{}+{}", self.address, self.lovelace);
        for (unit, quantity) in &self.assets {
            let policy = unit.policy_id().map(|p| p.to_string()).unwrap_or_default();
            let name = unit.asset_name_hex().unwrap_or_default();
            rendered.push_str(&format!("+{quantity} {policy}.{name}"));
        }
        rendered
    }
}

/// One asset minted by the transaction. NFT quantities are always 1 but
/// the builder syntax is quantity-generic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSpec {
    pub policy: PolicyId,
    pub asset_name_hex: String,
    pub quantity: u64,
}

impl MintSpec {
    fn render(&self) -> String {
        format!("{} {}.{}", self.quantity, self.policy, self.asset_name_hex)
    }
}

/// A draft transaction: exactly one spent input (the payment UTXO), the
/// outputs decided by the pricing breakdown, and the mint section.
#[derive(Debug, Clone)]
pub struct TxDraft {
    /// The payment UTXO being consumed, as its creating tx id and index.
    pub input: (TxId, u32),
    pub outputs: Vec<DraftOutput>,
    pub mints: Vec<MintSpec>,
    /// Minting script files, one per policy represented in `mints`.
    pub scripts: Vec<PathBuf>,
    /// CIP-25 metadata document for the minted batch.
    pub metadata_file: Option<PathBuf>,
    pub fee: Lovelace,
}

impl TxDraft {
    /// `tx_id#index` input reference.
    pub fn input_ref(&self) -> String {
        format!("{}#{}", self.input.0, self.input.1)
    }

    /// The builder's `--mint` value: mint specs joined with `+`.
    pub fn render_mint(&self) -> Option<String> {
        if self.mints.is_empty() {
            return None;
        }
        Some(
            self.mints
                .iter()
                .map(MintSpec::render)
                .collect::<Vec<_>>()
                .join("+"),
        )
    }
}
