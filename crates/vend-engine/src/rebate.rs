//! Minimum-UTXO rebate calculation.
//!
//! The minted bundle rides back to the buyer inside one output, and the
//! ledger requires that output to carry lovelace proportional to its
//! serialized size. That cost is owed back to the buyer: they paid for
//! NFTs, not for the ADA locked alongside them. The word-cost model here
//! mirrors the ledger's min-UTXO formula for multi-asset outputs.

use vend_types::Lovelace;

/// Lovelace per 8-byte word of UTXO size.
const COST_PER_WORD: Lovelace = 34_482;

/// Fixed word overhead of any output, value size excluded.
const UTXO_WORDS_WITHOUT_VALUE: u64 = 27;

/// Serialized bytes per policy id in the bundle.
const POLICY_ID_BYTES: u64 = 28;

/// Serialized overhead bytes per asset entry.
const BYTES_PER_ASSET: u64 = 12;

const WORD_BYTES: u64 = 8;

/// On-chain asset names are capped at 32 bytes; the worst case for sizing.
const MAX_ASSET_NAME_BYTES: u64 = 32;

/// Rebate owed for a bundle of `num_assets` minted assets spanning
/// `num_policies` distinct policies with `total_name_chars` total asset
/// name length. Zero for an empty bundle.
pub fn calculate_rebate(
    num_policies: usize,
    num_assets: usize,
    total_name_chars: usize,
) -> Lovelace {
    if num_assets == 0 {
        return 0;
    }
    let value_bytes = BYTES_PER_ASSET * num_assets as u64
        + total_name_chars as u64
        + POLICY_ID_BYTES * num_policies as u64;
    let value_words = value_bytes.div_ceil(WORD_BYTES);
    COST_PER_WORD * (UTXO_WORDS_WITHOUT_VALUE + value_words)
}

/// Upper bound on the rebate a single minted item can incur, used by the
/// startup price-floor validation.
pub fn worst_case_single_rebate() -> Lovelace {
    calculate_rebate(1, 1, MAX_ASSET_NAME_BYTES as usize)
}
