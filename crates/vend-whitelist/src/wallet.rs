//! Wallet whitelist: per-address mint allowances.
//!
//! The whitelist directory holds one file per whitelisted address whose
//! content is the remaining allowance as a decimal count. Availability
//! requires a verified ownership proof (see [`crate::proof`]) naming an
//! address that actually funded the payment. Consumption decrements the
//! allowance and drops a per-payment marker so a replay of the same
//! payment cannot decrement twice.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vend_types::Address;

use crate::error::WhitelistError;
use crate::proof::WalletProof;
use crate::WhitelistContext;

pub struct WalletWhitelist {
    whitelist_dir: PathBuf,
    consumed_dir: PathBuf,
}

impl WalletWhitelist {
    pub fn new(
        whitelist_dir: impl Into<PathBuf>,
        consumed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            whitelist_dir: whitelist_dir.into(),
            consumed_dir: consumed_dir.into(),
        }
    }

    /// The address this payment proves ownership of, if the proof holds
    /// and the address really funded the payment.
    fn proven_sender(&self, ctx: &WhitelistContext<'_>) -> Option<Address> {
        let aux = ctx.aux_metadata?;
        let proof = WalletProof::from_aux(aux)?;
        let address = proof.verify()?;
        if !ctx.senders.contains(&address) {
            debug!(
                "[whitelist] proof address {address} is not a sender of {}",
                ctx.payment
            );
            return None;
        }
        Some(address)
    }

    fn allowance_path(&self, address: &Address) -> PathBuf {
        self.whitelist_dir.join(address.as_str())
    }

    fn read_allowance(&self, path: &Path) -> Result<u64, WhitelistError> {
        let text = fs::read_to_string(path)?;
        text.trim()
            .parse::<u64>()
            .map_err(|_| WhitelistError::BadAllowance(path.to_path_buf()))
    }

    pub fn available(&self, ctx: &WhitelistContext<'_>) -> Result<u64, WhitelistError> {
        let Some(address) = self.proven_sender(ctx) else {
            return Ok(0);
        };
        let path = self.allowance_path(&address);
        if !path.is_file() {
            return Ok(0);
        }
        self.read_allowance(&path)
    }

    /// Decrements the proven sender's allowance by `count`. The payment id
    /// marker makes this a no-op when replayed.
    pub fn consume(&self, ctx: &WhitelistContext<'_>, count: u64) -> Result<(), WhitelistError> {
        let Some(address) = self.proven_sender(ctx) else {
            // Consume is only reached after available() granted mints, so a
            // vanished proof means the aux data changed under us.
            warn!("[whitelist] consume without a provable sender for {}", ctx.payment);
            return Ok(());
        };

        let marker = self
            .consumed_dir
            .join(format!("{}.{}", address, ctx.payment));
        if marker.exists() {
            return Ok(());
        }

        let path = self.allowance_path(&address);
        let remaining = self.read_allowance(&path)?;
        let updated = remaining.saturating_sub(count);
        fs::write(&path, updated.to_string())?;
        fs::write(&marker, count.to_string())?;
        debug!(
            "[whitelist] {address}: allowance {remaining} -> {updated} for {}",
            ctx.payment
        );
        Ok(())
    }

    /// Startup validation: every allowance file must name an address and
    /// hold a decimal count.
    pub fn validate(&self) -> Result<(), WhitelistError> {
        fs::create_dir_all(&self.consumed_dir)?;
        for entry in fs::read_dir(&self.whitelist_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if Address::new(&name).is_err() {
                return Err(WhitelistError::BadAllowanceName(path));
            }
            self.read_allowance(&path)?;
        }
        Ok(())
    }
}
