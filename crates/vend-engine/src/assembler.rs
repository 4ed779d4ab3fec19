//! Turns a priced payment into a signed mint transaction.
//!
//! Assembly is two-pass: a zero-fee draft is priced by the builder, the
//! breakdown absorbs the real fee, and the final draft is built and signed.
//!
//! Overpayment is handled asymmetrically by currency. Overpaid lovelace
//! comes back to the buyer as change; native assets paid in are swept to
//! the profit output in full, including any quantity beyond the granted
//! mints. Asset prices are per-unit with no divisible change, and
//! returning surplus assets would need its own min-UTXO funding, so the
//! surplus is treated as payment.

use std::path::Path;

use tracing::debug;
use vend_metadata::ReservedBatch;
use vend_txbuild::{DraftOutput, MintSpec, SignedTx, TxBuilder, TxDraft};
use vend_types::{Address, Lovelace, Unit, Utxo};

use crate::config::MintConfig;
use crate::error::VendError;
use crate::pricing::PricingBreakdown;

/// Lays out the draft for one vend: the payment UTXO spent whole, the
/// buyer's return, the profit sweep, and the optional dev fee output.
pub fn compose_draft(
    utxo: &Utxo,
    recipient: &Address,
    breakdown: &PricingBreakdown,
    batch: &ReservedBatch,
    metadata_file: &Path,
    config: &MintConfig,
    fee: Lovelace,
) -> TxDraft {
    let minted: Vec<(Unit, u64)> = batch
        .items
        .iter()
        .map(|item| (Unit::from_parts(&item.policy, &item.asset_name_hex()), 1))
        .collect();

    let mut outputs = vec![DraftOutput {
        address: recipient.clone(),
        lovelace: breakdown.user_return(),
        assets: minted,
    }];

    // Native assets the buyer paid with ride along to the profit address
    // so the transaction balances without a separate consolidation step.
    let paid_assets: Vec<(Unit, u64)> =
        utxo.assets.iter().map(|(u, q)| (u.clone(), *q)).collect();
    outputs.push(DraftOutput {
        address: config.profit_address.clone(),
        lovelace: breakdown.profit,
        assets: paid_assets,
    });

    if breakdown.dev_fee > 0 {
        if let Some(dev) = &config.dev_address {
            outputs.push(DraftOutput::lovelace_only(dev.clone(), breakdown.dev_fee));
        }
    }

    let mints = batch
        .items
        .iter()
        .map(|item| MintSpec {
            policy: item.policy.clone(),
            asset_name_hex: item.asset_name_hex(),
            quantity: 1,
        })
        .collect();

    TxDraft {
        input: (utxo.tx_id.clone(), utxo.output_index),
        outputs,
        mints,
        scripts: config.script_files(),
        metadata_file: Some(metadata_file.to_path_buf()),
        fee,
    }
}

/// Estimates the fee, re-prices, builds, and signs.
///
/// Returns the signed transaction together with the fee-adjusted breakdown
/// the final draft was composed from.
pub async fn assemble<B: TxBuilder + ?Sized>(
    builder: &B,
    utxo: &Utxo,
    recipient: &Address,
    breakdown: PricingBreakdown,
    batch: &ReservedBatch,
    metadata_file: &Path,
    config: &MintConfig,
) -> Result<(SignedTx, PricingBreakdown), VendError> {
    let unpriced = compose_draft(utxo, recipient, &breakdown, batch, metadata_file, config, 0);
    let fee = builder.min_fee(&unpriced, config.witness_count()).await?;
    let breakdown = breakdown.with_fee(fee)?;
    debug!("[assemble] {} fee {fee} for {} mints", utxo.tx_id, breakdown.minted());

    let draft = compose_draft(utxo, recipient, &breakdown, batch, metadata_file, config, fee);
    let signed = builder
        .build_and_sign(&draft, &config.signing_key_files())
        .await?;
    Ok((signed, breakdown))
}
