//! Reservation store errors.

use std::path::PathBuf;

use thiserror::Error;
use vend_types::FailureKind;

/// Errors raised by the metadata pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Fewer items available than the reservation asked for.
    #[error("Insufficient metadata: requested {requested}, available {available}")]
    Insufficient { requested: usize, available: usize },

    /// An item file that does not parse as a single-asset CIP-25 fragment.
    #[error("Malformed metadata item {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// An item under a policy this machine is not configured to mint.
    #[error("Item {path} uses unconfigured policy {policy}")]
    UnknownPolicy { path: PathBuf, policy: String },

    /// Another process already holds the pool.
    #[error("Metadata pool at {0} is locked by another process")]
    LockHeld(PathBuf),

    #[error("Pool I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolError {
    /// An exhausted pool finalizes the payment; a broken item file or an
    /// I/O fault is an operator problem, the payment stays eligible.
    pub fn kind(&self) -> FailureKind {
        match self {
            PoolError::Insufficient { .. } => FailureKind::Permanent,
            PoolError::Malformed { .. }
            | PoolError::UnknownPolicy { .. }
            | PoolError::LockHeld(_)
            | PoolError::Io(_) => FailureKind::Transient,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
