//! # Transaction Builder
//!
//! Draft-to-signed-transaction plumbing. The engine composes a [`TxDraft`]
//! (inputs, outputs, mint instructions, metadata document) and hands it to
//! the [`TxBuilder`] port; the shipped adapter, [`CardanoCli`], drives the
//! external `cardano-cli` binary through the fee loop: build with a zero
//! fee, ask for the minimum fee, rebuild with the real fee, sign.
//!
//! Builder rejection of a structurally invalid draft is permanent; failing
//! to reach the tool at all is transient and leaves no state behind.

pub mod cli;
pub mod draft;
pub mod error;
pub mod ports;

pub use cli::CardanoCli;
pub use draft::{DraftOutput, MintSpec, TxDraft};
pub use error::BuildError;
pub use ports::{SignedTx, TxBuilder};
