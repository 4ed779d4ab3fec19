//! Asset-marker whitelists.
//!
//! The whitelist directory holds one empty marker file per whitelisted
//! asset unit. A payment qualifies when its transaction's outputs carry a
//! marked asset (the buyer holds the asset and received it back as change).
//! Single-use consumption retires every referenced marker by moving it to
//! the consumed directory, stamped with the payment id.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::WhitelistError;
use crate::{WhitelistContext, UNBOUNDED};

/// Marker-file whitelist shared by the single-use and unlimited variants;
/// they differ only in what `consume` does.
pub struct AssetWhitelist {
    whitelist_dir: PathBuf,
    consumed_dir: PathBuf,
}

impl AssetWhitelist {
    pub fn new(
        whitelist_dir: impl Into<PathBuf>,
        consumed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            whitelist_dir: whitelist_dir.into(),
            consumed_dir: consumed_dir.into(),
        }
    }

    fn marked_units<'c>(&self, ctx: &WhitelistContext<'c>) -> Vec<String> {
        ctx.output_units
            .iter()
            .map(|unit| unit.as_str().to_string())
            .filter(|unit| self.whitelist_dir.join(unit).is_file())
            .collect()
    }

    /// Unbounded while any referenced marker exists; the vend cap does the
    /// actual limiting. Zero once every referenced marker is gone.
    pub fn available(&self, ctx: &WhitelistContext<'_>) -> Result<u64, WhitelistError> {
        if self.marked_units(ctx).is_empty() {
            Ok(0)
        } else {
            Ok(UNBOUNDED)
        }
    }

    /// Retires every marker the payment referenced. Idempotent: a marker
    /// already gone was consumed by this payment's earlier attempt.
    pub fn consume_single_use(&self, ctx: &WhitelistContext<'_>) -> Result<(), WhitelistError> {
        for unit in self.marked_units(ctx) {
            let from = self.whitelist_dir.join(&unit);
            let to = self.consumed_dir.join(format!("{unit}.{}", ctx.payment));
            match fs::rename(&from, &to) {
                Ok(()) => debug!("[whitelist] consumed asset marker {unit}"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WhitelistError> {
        // Both directories must exist and be readable.
        fs::read_dir(&self.whitelist_dir)?;
        fs::create_dir_all(&self.consumed_dir)?;
        Ok(())
    }
}
