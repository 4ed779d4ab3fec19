//! # Whitelists
//!
//! Access control over who a payment may mint for. A closed set of four
//! variants behind one tagged union:
//!
//! - [`Whitelist::None`]: open mint, unbounded availability.
//! - [`Whitelist::SingleUseAsset`]: holding a whitelisted asset grants
//!   access once; consumption retires the asset's marker.
//! - [`Whitelist::UnlimitedAsset`]: holding a whitelisted asset grants
//!   access every time; consumption changes nothing.
//! - [`Whitelist::Wallet`]: per-address allowances, claimed with a signed
//!   ownership proof carried in the payment's auxiliary metadata.
//!
//! `available` never mutates state and `consume` runs only after a
//! submission succeeded, so an aborted cycle leaves the whitelist exactly
//! as it found it. Consumption is idempotent per payment identifier.

pub mod asset;
pub mod error;
pub mod proof;
pub mod wallet;

use std::collections::BTreeSet;

use vend_types::{Address, TxId, Unit};

pub use asset::AssetWhitelist;
pub use error::WhitelistError;
pub use proof::{WalletProof, OWNERSHIP_METADATA_LABEL};
pub use wallet::WalletWhitelist;

/// Availability reported when a variant imposes no numeric bound.
pub const UNBOUNDED: u64 = u64::MAX;

/// Everything a whitelist may inspect about one payment.
#[derive(Debug, Clone, Copy)]
pub struct WhitelistContext<'a> {
    /// The payment identifier, the idempotency key for consumption.
    pub payment: &'a TxId,
    /// Addresses that funded the payment (spent inputs only).
    pub senders: &'a BTreeSet<Address>,
    /// Native-asset units present in the payment transaction's outputs.
    pub output_units: &'a BTreeSet<Unit>,
    /// Auxiliary metadata attached to the payment transaction, if any.
    pub aux_metadata: Option<&'a serde_json::Value>,
}

/// The four whitelist variants, fixed at compile time.
pub enum Whitelist {
    None,
    SingleUseAsset(AssetWhitelist),
    UnlimitedAsset(AssetWhitelist),
    Wallet(WalletWhitelist),
}

impl Whitelist {
    /// How many mints this payment's sender may be granted. Zero means the
    /// payment is rejected outright (permanently) unless another cap
    /// already did.
    pub fn available(&self, ctx: &WhitelistContext<'_>) -> Result<u64, WhitelistError> {
        match self {
            Whitelist::None => Ok(UNBOUNDED),
            Whitelist::SingleUseAsset(wl) | Whitelist::UnlimitedAsset(wl) => wl.available(ctx),
            Whitelist::Wallet(wl) => wl.available(ctx),
        }
    }

    /// Records a successful vend of `count` mints against this payment.
    /// Called at most once per finalized payment; replaying the same
    /// payment identifier is a no-op.
    pub fn consume(&self, ctx: &WhitelistContext<'_>, count: u64) -> Result<(), WhitelistError> {
        match self {
            Whitelist::None => Ok(()),
            Whitelist::SingleUseAsset(wl) => wl.consume_single_use(ctx),
            Whitelist::UnlimitedAsset(_) => Ok(()),
            Whitelist::Wallet(wl) => wl.consume(ctx, count),
        }
    }

    /// Whether `available` needs the payment's auxiliary metadata fetched.
    pub fn needs_proof(&self) -> bool {
        matches!(self, Whitelist::Wallet(_))
    }

    /// Startup validation of the variant's backing state.
    pub fn validate(&self) -> Result<(), WhitelistError> {
        match self {
            Whitelist::None => Ok(()),
            Whitelist::SingleUseAsset(wl) | Whitelist::UnlimitedAsset(wl) => wl.validate(),
            Whitelist::Wallet(wl) => wl.validate(),
        }
    }

    /// Short tag for logs and the configuration dump.
    pub fn mode(&self) -> &'static str {
        match self {
            Whitelist::None => "none",
            Whitelist::SingleUseAsset(_) => "single-use-asset",
            Whitelist::UnlimitedAsset(_) => "unlimited-asset",
            Whitelist::Wallet(_) => "wallet",
        }
    }
}
