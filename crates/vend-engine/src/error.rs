use thiserror::Error;
use vend_types::{FailureKind, Lovelace, Unit};

use crate::config::ConfigError;

/// Anything that can stop a payment from vending.
///
/// Permanent errors condemn the payment: it is excluded and never looked at
/// again. Transient errors abort the whole cycle so the same payment is
/// retried after the cooldown.
#[derive(Debug, Error)]
pub enum VendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] vend_chain::ChainError),

    #[error(transparent)]
    Build(#[from] vend_txbuild::BuildError),

    #[error(transparent)]
    Pool(#[from] vend_metadata::PoolError),

    #[error(transparent)]
    Whitelist(#[from] vend_whitelist::WhitelistError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The payment carries a native asset no price is configured for.
    #[error("payment carries unpriced unit {unit}")]
    UnrecognizedUnit { unit: Unit },

    /// Priced value present, but not enough for even one mint.
    #[error("payment of {lovelace} lovelace buys zero mints")]
    Underfunded { lovelace: Lovelace },

    /// The transaction has no resolvable sender to return value to.
    #[error("payment has no sender address")]
    NoSender,

    #[error("sender holds no whitelist allowance")]
    WhitelistRefused,

    /// Every cap resolved to zero mints despite a sufficient payment.
    #[error("no metadata remains to grant")]
    SoldOut,

    /// The payment cannot cover its own return plus the profit floor.
    #[error("payment of {total} lovelace cannot cover {deductions} in deductions")]
    UnpayableProfit { total: Lovelace, deductions: Lovelace },
}

impl VendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) => FailureKind::Permanent,
            Self::Chain(e) => e.kind(),
            Self::Build(e) => e.kind(),
            Self::Pool(e) => e.kind(),
            Self::Whitelist(e) => e.kind(),
            Self::Io(_) => FailureKind::Transient,
            Self::UnrecognizedUnit { .. }
            | Self::Underfunded { .. }
            | Self::NoSender
            | Self::WhitelistRefused
            | Self::SoldOut
            | Self::UnpayableProfit { .. } => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
