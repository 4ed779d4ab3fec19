//! Whitelist errors.
//!
//! A payment that simply is not whitelisted is not an error: `available`
//! reports 0 and the engine rejects the payment. Errors here mean the
//! whitelist's own state could not be read or written.

use std::path::PathBuf;

use thiserror::Error;
use vend_types::FailureKind;

#[derive(Debug, Error)]
pub enum WhitelistError {
    #[error("Whitelist I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An allowance file whose content is not a decimal count.
    #[error("Malformed allowance file {0}")]
    BadAllowance(PathBuf),

    /// An allowance file whose name is not an address.
    #[error("Allowance file name {0} is not an address")]
    BadAllowanceName(PathBuf),
}

impl WhitelistError {
    /// All whitelist errors are operator problems with the backing files,
    /// never a verdict on the payment; the payment stays eligible.
    pub fn kind(&self) -> FailureKind {
        FailureKind::Transient
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
