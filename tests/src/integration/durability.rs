//! Durability and exclusivity: the machine must survive restarts and
//! refuse to share its state.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use std::fs;
    use std::sync::atomic::Ordering;

    use vend_metadata::{MetadataPool, PoolError};
    use vend_whitelist::{AssetWhitelist, Whitelist};

    /// The exclusion log outlives the process: a reopened set still knows
    /// every vended payment.
    #[tokio::test]
    async fn exclusions_survive_a_restart() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        let builder = RecordingBuilder::new(180_000);
        let machine = fx.machine(&chain, &builder, Whitelist::None);

        let mut exclusions = fx.exclusions();
        machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(chain.submitted_count(), 1);
        drop(exclusions);

        // "Restart": replay the log into a fresh set.
        let mut exclusions = fx.exclusions();
        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(chain.submitted_count(), 1);
    }

    /// Two processes cannot share one metadata pool.
    #[test]
    fn the_pool_lock_is_exclusive() {
        let fx = Fixture::new(3);
        let _held = fx.pool();
        let second = MetadataPool::open(
            fx.metadata_dir(),
            fx.in_proc_dir(),
            fx.minted_dir(),
        );
        assert!(matches!(second, Err(PoolError::LockHeld(_))));
    }

    /// A successful vend leaves a complete audit trail in the minted
    /// directory: the item files and the merged CIP-25 document keyed by
    /// the payment.
    #[tokio::test]
    async fn minted_state_records_items_and_document() {
        let fx = Fixture::new(10);
        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        let builder = RecordingBuilder::new(180_000);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap();

        let doc_path = fx.minted_dir().join(format!("{}.json", tx("11")));
        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&doc_path).unwrap()).unwrap();
        let assets = doc["721"][policy_hex()].as_object().unwrap();
        assert_eq!(assets.len(), 2);
        assert!(fx.minted_dir().join("item000.json").exists());
        assert!(fx.minted_dir().join("item001.json").exists());
        // Nothing stays behind in the reservation directory.
        assert_eq!(fs::read_dir(fx.in_proc_dir()).unwrap().count(), 0);
    }

    /// An aborted cycle rolls everything back: items return, the staged
    /// document disappears, and the whitelist marker survives.
    #[tokio::test]
    async fn a_failed_submission_rolls_back_all_state() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        let marker = vend_types::Unit::parse("ee".repeat(28) + "01").unwrap();
        fs::write(wl_dir.join(marker.as_str()), b"").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        chain.add_output_units(&tx("11"), BUYER, &[marker.clone()]);
        chain.submit_failures.store(1, Ordering::SeqCst);

        let builder = RecordingBuilder::new(180_000);
        let whitelist =
            Whitelist::SingleUseAsset(AssetWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        machine.vend_cycle(&mut exclusions).await.unwrap_err();

        assert_eq!(fx.available_count(), 10);
        assert!(wl_dir.join(marker.as_str()).exists());
        assert!(!fx.minted_dir().join(format!("{}.json", tx("11"))).exists());
        assert_eq!(fs::read_dir(fx.in_proc_dir()).unwrap().count(), 0);
    }

    /// Startup validation walks config, pool, and whitelist in one pass.
    #[test]
    fn validation_covers_the_whole_object_graph() {
        let fx = Fixture::new(4);
        let chain = MockChain::new();
        let builder = RecordingBuilder::new(180_000);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        assert_eq!(machine.validate().unwrap(), 4);
    }

    /// A pool item under a foreign policy fails validation before any
    /// cycle can reserve it.
    #[test]
    fn validation_rejects_foreign_policy_items() {
        let fx = Fixture::new(2);
        let foreign = format!(
            r#"{{"721": {{"{}": {{"Rogue": {{"image": "ipfs://x"}}}}}}}}"#,
            "ff".repeat(28)
        );
        fs::write(fx.metadata_dir().join("rogue.json"), foreign).unwrap();

        let chain = MockChain::new();
        let builder = RecordingBuilder::new(180_000);
        let machine = fx.machine(&chain, &builder, Whitelist::None);
        assert!(machine.validate().is_err());
    }
}
