//! Cross-crate integration scenarios over mock ports.

pub mod durability;
pub mod vending;
pub mod whitelists;
