//! Pricing and value-split calculation.
//!
//! Pure arithmetic: no I/O, no state. The breakdown is recomputed with the
//! real miner fee once the builder has estimated it; the fee always comes
//! out of the profit share, never out of the buyer's return.

use serde::Serialize;
use vend_types::Lovelace;

use crate::error::VendError;

/// Floor for any ADA-only output (profit, dev fee). A dev fee below this
/// cannot form an output and is folded into profit instead.
pub const MIN_ADA_ONLY_UTXO: Lovelace = 1_000_000;

/// Unpriced lovelace riding along with an asset payment is tolerated up to
/// this much; it is min-UTXO dust the wallet had to attach, not payment.
pub const MAX_UNPRICED_DUST: Lovelace = 2_000_000;

/// Upper bound on the miner fee of any transaction this machine builds.
/// The linear fee for even a maximum-size transaction stays well below
/// this; the startup price floor reserves it so a payment of exactly one
/// unit price still clears [`MIN_ADA_ONLY_UTXO`] after the real fee.
pub const FEE_HEADROOM: Lovelace = 2_000_000;

/// Basis-point denominator for the dev fee rate.
const BPS: u64 = 10_000;

/// The party-by-party split of one payment.
///
/// Invariant: `change + rebate + dev_fee + profit + fee == total`, exactly.
/// The buyer's output carries `rebate + change`; `profit` absorbs every
/// rounding remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingBreakdown {
    /// Full-price mints the payment asked for, before caps.
    pub requested: u64,
    /// Paid mints granted after every cap.
    pub granted: u64,
    /// Free BOGO mints on top.
    pub bonus: u64,
    /// Total base-currency amount of the payment.
    pub total: Lovelace,
    /// Min-UTXO cost of the minted bundle, owed back to the buyer.
    pub rebate: Lovelace,
    /// Overpayment beyond the granted mints, returned to the buyer.
    pub change: Lovelace,
    pub dev_fee: Lovelace,
    pub fee: Lovelace,
    pub profit: Lovelace,
}

impl PricingBreakdown {
    /// Computes the split with a zero miner fee.
    ///
    /// `lovelace_price` is the configured base-currency unit price; mints
    /// granted beyond what the lovelace amount paid for were bought with
    /// priced native assets and produce no lovelace change. On an
    /// asset-priced machine the price is absent and the accompanying
    /// lovelace dust funds the rebate, fee, and profit floor instead.
    pub fn compute(
        total: Lovelace,
        requested: u64,
        granted: u64,
        bonus: u64,
        lovelace_price: Option<Lovelace>,
        dev_fee_bps: u32,
        rebate: Lovelace,
    ) -> Result<Self, VendError> {
        let change = match lovelace_price {
            Some(price) => total - granted.min(total / price) * price,
            None => 0,
        };

        let mut dev_fee = (u128::from(total) * u128::from(dev_fee_bps) / u128::from(BPS)) as u64;
        if dev_fee < MIN_ADA_ONLY_UTXO {
            // Too small to form an output; the profit share keeps it.
            dev_fee = 0;
        }

        let breakdown = Self {
            requested,
            granted,
            bonus,
            total,
            rebate,
            change,
            dev_fee,
            fee: 0,
            profit: 0,
        };
        breakdown.with_fee(0)
    }

    /// Recomputes the profit share for a known miner fee.
    pub fn with_fee(mut self, fee: Lovelace) -> Result<Self, VendError> {
        let deductions = self.change as i128
            + self.rebate as i128
            + self.dev_fee as i128
            + fee as i128;
        let profit = self.total as i128 - deductions;
        if profit < MIN_ADA_ONLY_UTXO as i128 {
            return Err(VendError::UnpayableProfit {
                total: self.total,
                deductions: deductions as u64,
            });
        }
        self.fee = fee;
        self.profit = profit as Lovelace;
        Ok(self)
    }

    /// Total number of items to mint.
    pub fn minted(&self) -> u64 {
        self.granted + self.bonus
    }

    /// Lovelace carried by the buyer's output.
    pub fn user_return(&self) -> Lovelace {
        self.rebate + self.change
    }
}
