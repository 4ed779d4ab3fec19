//! # Vending Machine Test Suite
//!
//! Unified integration crate exercising the full vend pipeline over
//! in-memory ports and tempdir-backed state.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support/          # Mock indexer, recording builder, fixtures
//! └── integration/
//!     ├── vending.rs    # End-to-end vend scenarios and pricing
//!     ├── durability.rs # Exclusion replay, reservation exclusivity
//!     └── whitelists.rs # Whitelist gating across full cycles
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vend-tests
//! cargo test -p vend-tests integration::vending::
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
