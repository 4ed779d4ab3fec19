//! # Shared Types
//!
//! The shared vocabulary for every vending machine crate: currency units,
//! ledger identifiers, addresses, the UTXO entity observed at the payment
//! address, and the two-tier failure taxonomy tag.
//!
//! Identifier newtypes (`TxId`, `PolicyId`, `Address`) are constructor
//! checked: once a value exists, downstream code may rely on its shape.

pub mod entities;
pub mod units;

pub use entities::{Network, TxId, Utxo};
pub use units::{Address, Lovelace, PolicyId, Unit, LOVELACE};

/// Disposition of a failed operation under the two-tier error taxonomy.
///
/// Permanent failures finalize a payment (it is excluded and never
/// reconsidered); transient failures abort the current cycle and the same
/// payment is retried after the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Terminal outcome: exclude the payment, release held resources.
    Permanent,
    /// Retryable outcome: abort the cycle, keep the payment eligible.
    Transient,
}

impl FailureKind {
    pub fn is_transient(self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}
