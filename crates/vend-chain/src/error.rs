//! Indexer error type and its transient/permanent classification.

use thiserror::Error;
use vend_types::FailureKind;

/// Errors raised by indexer adapters.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The indexer throttled us.
    #[error("Rate limited by the indexer (HTTP 429)")]
    RateLimited,

    /// Unexpected status from the indexer.
    #[error("Indexer returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Data the indexer should hold is not there yet. Listings and detail
    /// reads can disagree for a moment; the candidate is retried.
    #[error("Indexer has not indexed {what} yet")]
    NotIndexed { what: String },

    /// A response we could not decode.
    #[error("Failed to decode indexer response: {0}")]
    Decode(String),

    /// The node rejected a submitted transaction.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// All retry attempts for an operation were exhausted.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ChainError>,
    },
}

impl ChainError {
    /// Two-tier classification. Rejection by the node and undecodable
    /// payloads are terminal; everything reachable by waiting is not.
    pub fn kind(&self) -> FailureKind {
        match self {
            ChainError::Http(_) | ChainError::RateLimited | ChainError::NotIndexed { .. } => {
                FailureKind::Transient
            }
            ChainError::Api { status, .. } if *status >= 500 => FailureKind::Transient,
            ChainError::Api { .. } => FailureKind::Permanent,
            ChainError::Decode(_) | ChainError::Rejected(_) => FailureKind::Permanent,
            ChainError::RetriesExhausted { last, .. } => last.kind(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
