//! BOGO bonus mints.

use serde::{Deserialize, Serialize};

/// Buy-threshold bonus: once a payment's granted count reaches the
/// threshold, `additional` free mints join the batch (still capped by the
/// available metadata pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bogo {
    pub threshold: u64,
    pub additional: u64,
}

impl Bogo {
    /// Bonus mints owed for a paid, granted count.
    pub fn bonus_for(&self, granted: u64) -> u64 {
        if granted >= self.threshold {
            self.additional
        } else {
            0
        }
    }
}
