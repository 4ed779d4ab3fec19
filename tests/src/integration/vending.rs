//! End-to-end vend scenarios: pricing, capping, rejection, and retry.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use std::sync::atomic::Ordering;

    use vend_engine::rebate::calculate_rebate;
    use vend_engine::Bogo;
    use vend_types::{Lovelace, Unit};
    use vend_whitelist::Whitelist;

    const FEE: Lovelace = 180_000;

    /// 25 ADA at 10 ADA a mint: two items granted, 5 ADA change, and the
    /// whole bundle's min-UTXO rebate returned to the buyer.
    #[tokio::test]
    async fn overpayment_grants_the_floor_and_returns_change() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.vended, 1);
        assert_eq!(fx.available_count(), 8);

        let draft = builder.last_draft();
        // "Item 0" + "Item 1": 12 name chars, one policy, two assets.
        let rebate = calculate_rebate(1, 2, 12);
        assert_eq!(draft.outputs[0].address, addr(BUYER));
        assert_eq!(draft.outputs[0].lovelace, rebate + 5_000_000);
        assert_eq!(draft.outputs[0].assets.len(), 2);
        assert_eq!(draft.fee, FEE);
    }

    /// Every draft's outputs plus its fee must spend the payment exactly.
    #[tokio::test]
    async fn value_is_conserved_with_a_dev_fee() {
        let mut fx = Fixture::new(10);
        fx.config.dev_fee_bps = 1_000;
        fx.config.dev_address = Some(addr("addr_test1qdev"));

        let chain = MockChain::new();
        chain.add_payment(payment("11", 33_000_000), BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap();

        let draft = builder.last_draft();
        let out_total: Lovelace = draft.outputs.iter().map(|o| o.lovelace).sum();
        assert_eq!(out_total + draft.fee, 33_000_000);
        // 10% of the payment went to the dev output.
        assert_eq!(draft.outputs[2].lovelace, 3_300_000);
    }

    #[tokio::test]
    async fn bogo_adds_bonus_mints_when_the_pool_allows() {
        let mut fx = Fixture::new(10);
        fx.config.bogo = Some(Bogo {
            threshold: 2,
            additional: 1,
        });
        let chain = MockChain::new();
        chain.add_payment(payment("11", 20_000_000), BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(builder.last_draft().mints.len(), 3);
        assert_eq!(fx.available_count(), 7);
    }

    #[tokio::test]
    async fn bogo_bonus_is_capped_by_the_remaining_pool() {
        let mut fx = Fixture::new(2);
        fx.config.bogo = Some(Bogo {
            threshold: 2,
            additional: 1,
        });
        let chain = MockChain::new();
        chain.add_payment(payment("11", 20_000_000), BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap();
        // Both paid mints granted; no item left for the bonus.
        assert_eq!(builder.last_draft().mints.len(), 2);
        assert_eq!(fx.available_count(), 0);
    }

    /// An unconfigured native asset condemns the payment even when some
    /// base currency came along.
    #[tokio::test]
    async fn unpriced_assets_cause_permanent_rejection() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        let mut utxo = payment("11", 3_000_000);
        utxo.assets
            .insert(Unit::parse("ee".repeat(28) + "574d54").unwrap(), 100);
        chain.add_payment(utxo, BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert!(exclusions.contains(&tx("11")));
        assert_eq!(chain.submitted_count(), 0);
        assert_eq!(fx.available_count(), 10);
    }

    /// A timed-out submission leaves no trace: the payment is retried from
    /// validation on the next cycle and succeeds.
    #[tokio::test]
    async fn transient_submit_failure_retries_next_cycle() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        chain.submit_failures.store(1, Ordering::SeqCst);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        let err = machine.vend_cycle(&mut exclusions).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!exclusions.contains(&tx("11")));
        assert_eq!(fx.available_count(), 10);

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.vended, 1);
        assert_eq!(chain.submitted_count(), 1);
        assert_eq!(fx.available_count(), 8);
    }

    #[tokio::test]
    async fn a_payment_without_a_resolvable_sender_is_rejected() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        // UTXO present but no transaction detail registered: no inputs.
        chain.utxos.lock().unwrap().push(payment("11", 25_000_000));
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(chain.submitted_count(), 0);
    }

    /// Two outputs of one transaction at the payment address: the first is
    /// processed, the second is skipped in the same cycle.
    #[tokio::test]
    async fn sibling_outputs_of_one_transaction_vend_once() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        let mut sibling = payment("11", 25_000_000);
        sibling.output_index = 1;
        chain.utxos.lock().unwrap().push(sibling);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.vended, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(chain.submitted_count(), 1);
    }

    /// The machine cap, not the payment, bounds a large grant.
    #[tokio::test]
    async fn single_vend_max_caps_a_generous_payment() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 80_000_000), BUYER);
        let builder = RecordingBuilder::new(FEE);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap();
        let draft = builder.last_draft();
        assert_eq!(draft.mints.len(), 5);
        // 30 ADA beyond the cap comes back as change.
        let rebate = calculate_rebate(1, 5, 30);
        assert_eq!(draft.outputs[0].lovelace, rebate + 30_000_000);
    }
}
