//! Wallet ownership proof.
//!
//! A wallet-whitelisted buyer includes a proof in their payment's
//! auxiliary metadata: the claimed address, the ed25519 public key behind
//! it, and a signature over the address text. The signature binds the
//! claim cryptographically; the engine separately requires the claimed
//! address to be among the payment's spent-input senders, so a proof
//! cannot be replayed from someone else's wallet.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Deserialize;
use tracing::debug;
use vend_types::Address;

/// Metadata label the proof document is filed under.
pub const OWNERSHIP_METADATA_LABEL: &str = "8903";

/// The proof document as it appears under the metadata label.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletProof {
    pub address: String,
    /// Hex, 32 bytes.
    pub public_key: String,
    /// Hex, 64 bytes, over the UTF-8 address text.
    pub signature: String,
}

impl WalletProof {
    /// Extracts the proof from a transaction's auxiliary metadata.
    pub fn from_aux(aux: &serde_json::Value) -> Option<Self> {
        let doc = aux.get(OWNERSHIP_METADATA_LABEL)?;
        serde_json::from_value(doc.clone()).ok()
    }

    /// Verifies the signature and returns the proven address.
    ///
    /// `None` on any defect: the payment is simply not whitelisted, which
    /// the caller reports as zero availability.
    pub fn verify(&self) -> Option<Address> {
        let key_bytes: [u8; 32] = hex::decode(&self.public_key).ok()?.try_into().ok()?;
        let sig_bytes: [u8; 64] = hex::decode(&self.signature).ok()?.try_into().ok()?;

        let key = VerifyingKey::from_bytes(&key_bytes).ok()?;
        let signature = Signature::from_bytes(&sig_bytes);
        if key.verify(self.address.as_bytes(), &signature).is_err() {
            debug!("[whitelist] ownership proof signature failed for {}", self.address);
            return None;
        }
        Address::new(&self.address).ok()
    }
}
