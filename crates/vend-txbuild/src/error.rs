//! Builder error type and its transient/permanent classification.

use thiserror::Error;
use vend_types::FailureKind;

/// Errors raised while driving the external transaction builder.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The builder binary could not be spawned or reached.
    #[error("Failed to run the transaction builder: {0}")]
    Spawn(#[source] std::io::Error),

    /// The builder evaluated the draft and refused it.
    #[error("Builder rejected the transaction: {stderr}")]
    Rejected { stderr: String },

    /// Could not parse the builder's fee estimate.
    #[error("Unparseable fee estimate: {0:?}")]
    MinFeeParse(String),

    /// The signed envelope file was malformed.
    #[error("Malformed signed transaction envelope: {0}")]
    Envelope(String),

    /// Reading or writing a working file failed.
    #[error("Builder I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// A rejected draft will be rejected again; everything else is worth a
    /// retry on the next cycle.
    pub fn kind(&self) -> FailureKind {
        match self {
            BuildError::Spawn(_) | BuildError::Io(_) => FailureKind::Transient,
            BuildError::Rejected { .. }
            | BuildError::MinFeeParse(_)
            | BuildError::Envelope(_) => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
