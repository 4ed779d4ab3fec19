//! # Vending Engine
//!
//! The per-cycle pipeline that turns an observed payment into a validated,
//! priced, and submitted mint.
//!
//! ## Cycle algorithm
//!
//! For each candidate payment at the payment address, in indexer order:
//!
//! ```text
//! excluded? ──→ skip
//!     │
//! derive senders from spent inputs
//! reject unpriced currency           (permanent)
//! requested = Σ floor(amount/price)
//! granted   = min(vend cap, metadata, requested, whitelist)
//! bonus     = BOGO, re-capped by metadata
//!     │
//! reserve ──→ price ──→ assemble ──→ submit
//!     │                                │
//!     │ any permanent failure          │ success
//!     ▼                                ▼
//! release batch, exclude,         finalize batch, consume
//! continue with next candidate    whitelist, exclude
//! ```
//!
//! A transient failure anywhere aborts the remainder of the cycle without
//! excluding the candidate; the driver waits out the cooldown and the same
//! payment is retried from validation on the next cycle.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | No payment processed twice | `ExclusionSet`, appended only on terminal outcomes |
//! | No item minted twice | `MetadataPool` reserve/finalize, exclusive claims |
//! | No state change before submission succeeds | whitelist consume and pool finalize run after `submit` |
//! | Conservation of value | `PricingBreakdown`: user return + dev fee + profit + fee == total |

pub mod assembler;
pub mod bogo;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod machine;
pub mod pricing;
pub mod rebate;

pub use bogo::Bogo;
pub use config::{ConfigError, MintConfig, MintPolicy};
pub use error::VendError;
pub use exclusions::ExclusionSet;
pub use machine::{CycleReport, VendingMachine};
pub use pricing::PricingBreakdown;
