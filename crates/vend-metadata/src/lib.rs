//! # Metadata Reservation Store
//!
//! Owns the pool of not-yet-minted item descriptors and guarantees that no
//! item is ever handed to two mints. Every item is in exactly one of three
//! states, each a directory:
//!
//! ```text
//! [available] ──reserve──→ [locked] ──finalize──→ [minted]
//!                             │
//!                             └────── release ──→ [available]
//! ```
//!
//! Transitions are single `rename` calls, atomic within one filesystem, so
//! a claim either fully happens or fully does not. The pool additionally
//! takes an exclusive advisory lock on the available directory at
//! construction: two processes can never share one pool.

pub mod error;
pub mod item;
pub mod pool;

pub use error::PoolError;
pub use item::NftItem;
pub use pool::{MetadataPool, ReservedBatch};
