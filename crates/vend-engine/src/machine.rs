//! The vending machine: one payment in, one mint transaction out.

use tracing::{info, warn};
use vend_chain::ChainIndexer;
use vend_metadata::MetadataPool;
use vend_txbuild::TxBuilder;
use vend_types::{TxId, Unit, Utxo};
use vend_whitelist::{Whitelist, WhitelistContext};

use crate::assembler;
use crate::config::MintConfig;
use crate::error::VendError;
use crate::exclusions::ExclusionSet;
use crate::pricing::{PricingBreakdown, MAX_UNPRICED_DUST};
use crate::rebate::calculate_rebate;

/// What one cycle did, for the driver's log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Candidates that went through validation.
    pub examined: usize,
    /// Payments that ended in a submitted mint.
    pub vended: usize,
    /// Payments permanently rejected and excluded.
    pub rejected: usize,
    /// Candidates skipped as already excluded.
    pub skipped: usize,
}

pub struct VendingMachine<C, B> {
    config: MintConfig,
    chain: C,
    builder: B,
    pool: MetadataPool,
    whitelist: Whitelist,
}

impl<C: ChainIndexer, B: TxBuilder> VendingMachine<C, B> {
    pub fn new(
        config: MintConfig,
        chain: C,
        builder: B,
        pool: MetadataPool,
        whitelist: Whitelist,
    ) -> Self {
        Self {
            config,
            chain,
            builder,
            pool,
            whitelist,
        }
    }

    /// The effective configuration, for the startup dump.
    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    /// Full startup validation: configuration, metadata pool, whitelist.
    /// Returns the number of items ready to vend.
    pub fn validate(&self) -> Result<usize, VendError> {
        self.config.validate()?;
        let items = self.pool.validate(&self.config.policy_ids())?;
        self.whitelist.validate()?;
        info!(
            "[vend] validation passed: {items} items, whitelist {}",
            self.whitelist.mode()
        );
        Ok(items)
    }

    /// One poll cycle over the payment address.
    ///
    /// Permanent failures condemn only their candidate; a transient failure
    /// aborts the cycle so every unprocessed candidate is retried later.
    pub async fn vend_cycle(
        &self,
        exclusions: &mut ExclusionSet,
    ) -> Result<CycleReport, VendError> {
        let utxos = self
            .chain
            .utxos_at(&self.config.payment_address, exclusions.ids())
            .await?;

        let mut report = CycleReport::default();
        for utxo in utxos {
            // Several outputs of one transaction can sit at the payment
            // address; processing the first excludes the rest mid-cycle.
            if exclusions.contains(&utxo.tx_id) {
                report.skipped += 1;
                continue;
            }
            report.examined += 1;

            match self.process_candidate(&utxo).await {
                Ok(minted) => {
                    info!("[vend] payment {} minted in {minted}", utxo.tx_id);
                    exclusions.insert(utxo.tx_id)?;
                    report.vended += 1;
                }
                Err(e) if e.is_transient() => {
                    warn!("[vend] cycle aborted at {}: {e}", utxo.tx_id);
                    return Err(e);
                }
                Err(e) => {
                    info!("[vend] rejecting payment {}: {e}", utxo.tx_id);
                    exclusions.insert(utxo.tx_id)?;
                    report.rejected += 1;
                }
            }
        }
        Ok(report)
    }

    /// Validates, prices, and mints one payment. Returns the id of the
    /// submitted mint transaction.
    async fn process_candidate(&self, utxo: &Utxo) -> Result<TxId, VendError> {
        let detail = self.chain.tx_detail(&utxo.tx_id).await?;
        let senders = detail.sender_addresses();
        let recipient = senders.first().cloned().ok_or(VendError::NoSender)?;

        let requested = self.requested_mints(utxo)?;

        let output_units = detail.output_units();
        let aux = if self.whitelist.needs_proof() {
            self.chain.tx_metadata_json(&utxo.tx_id).await?
        } else {
            None
        };
        let ctx = WhitelistContext {
            payment: &utxo.tx_id,
            senders: &senders,
            output_units: &output_units,
            aux_metadata: aux.as_ref(),
        };

        let allowance = self.whitelist.available(&ctx)?;
        if allowance == 0 {
            return Err(VendError::WhitelistRefused);
        }

        let available = self.pool.available_count()? as u64;
        let granted = requested
            .min(self.config.single_vend_max)
            .min(allowance)
            .min(available);
        if granted == 0 {
            return Err(VendError::SoldOut);
        }

        let bonus = self
            .config
            .bogo
            .map_or(0, |b| b.bonus_for(granted))
            .min(available - granted);

        let batch = self
            .pool
            .reserve((granted + bonus) as usize, self.config.vend_randomly)?;
        let staged = match self.pool.stage_document(&batch, &utxo.tx_id) {
            Ok(path) => path,
            Err(e) => {
                self.pool.release(batch, None)?;
                return Err(e.into());
            }
        };

        let rebate = calculate_rebate(
            batch.num_policies(),
            batch.len(),
            batch.total_name_chars(),
        );
        let outcome = async {
            let breakdown = PricingBreakdown::compute(
                utxo.lovelace,
                requested,
                granted,
                bonus,
                self.config.lovelace_price(),
                self.config.dev_fee_bps,
                rebate,
            )?;
            let (signed, breakdown) = assembler::assemble(
                &self.builder,
                utxo,
                &recipient,
                breakdown,
                &batch,
                &staged,
                &self.config,
            )
            .await?;
            let minted = self.chain.submit(&signed.cbor).await?;
            Ok::<_, VendError>((minted, breakdown))
        }
        .await;

        match outcome {
            Ok((minted, breakdown)) => {
                // The mint is on the wire; bookkeeping failures from here on
                // must not resurrect the payment, so they only warn.
                if let Err(e) = self.pool.finalize(batch) {
                    warn!("[vend] payment {}: finalize failed: {e}", utxo.tx_id);
                }
                if let Err(e) = self.whitelist.consume(&ctx, granted) {
                    warn!("[vend] payment {}: whitelist consume failed: {e}", utxo.tx_id);
                }
                info!(
                    "[vend] payment {}: granted {} bonus {} return {} profit {} dev {} fee {}",
                    utxo.tx_id,
                    breakdown.granted,
                    breakdown.bonus,
                    breakdown.user_return(),
                    breakdown.profit,
                    breakdown.dev_fee,
                    breakdown.fee,
                );
                Ok(minted)
            }
            Err(e) => {
                self.pool.release(batch, Some(&staged))?;
                Err(e)
            }
        }
    }

    /// How many full-price mints the payment's value asks for. Unpriced
    /// native assets condemn the payment; unpriced lovelace is tolerated as
    /// min-UTXO rider dust up to a fixed ceiling.
    fn requested_mints(&self, utxo: &Utxo) -> Result<u64, VendError> {
        let mut requested = 0u64;
        for (unit, quantity) in &utxo.assets {
            match self.config.prices.get(unit) {
                Some(price) => requested += quantity / price,
                None => {
                    return Err(VendError::UnrecognizedUnit { unit: unit.clone() });
                }
            }
        }
        match self.config.lovelace_price() {
            Some(price) => requested += utxo.lovelace / price,
            None if utxo.lovelace > MAX_UNPRICED_DUST => {
                return Err(VendError::UnrecognizedUnit {
                    unit: Unit::lovelace(),
                });
            }
            None => {}
        }
        if requested == 0 {
            return Err(VendError::Underfunded {
                lovelace: utxo.lovelace,
            });
        }
        Ok(requested)
    }
}
