//! # Ledger Indexer
//!
//! Read and submit access to the chain, observed through a remote indexing
//! service. The engine only sees the [`ChainIndexer`] port; the shipped
//! adapter is [`BlockfrostClient`].
//!
//! ## Failure classification
//!
//! Every error carries a [`vend_types::FailureKind`] via
//! [`ChainError::kind`]: network faults, timeouts and rate limiting are
//! transient (the cycle aborts and retries after the cooldown), while a
//! submission rejected by the node is permanent. "Not found" responses are
//! benign and never surface as errors: they mean absent auxiliary data or
//! the end of a paginated listing.

pub mod blockfrost;
pub mod error;
pub mod ports;

pub use blockfrost::BlockfrostClient;
pub use error::ChainError;
pub use ports::{ChainIndexer, TxDetail, TxInput, TxOutput};
