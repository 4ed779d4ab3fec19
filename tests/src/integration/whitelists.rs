//! Whitelist gating across full vend cycles.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use std::fs;

    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::json;
    use vend_types::Unit;
    use vend_whitelist::{AssetWhitelist, WalletWhitelist, Whitelist, OWNERSHIP_METADATA_LABEL};

    fn marker_unit() -> Unit {
        Unit::parse("ee".repeat(28) + "01").unwrap()
    }

    /// One single-use marker: the first qualifying payment consumes it and
    /// the second sees zero availability.
    #[tokio::test]
    async fn single_use_marker_admits_exactly_one_payment() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        let consumed = fx.consumed_dir();
        fs::write(wl_dir.join(marker_unit().as_str()), b"").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        chain.add_output_units(&tx("11"), BUYER, &[marker_unit()]);
        chain.add_payment(payment("22", 25_000_000), BUYER);
        chain.add_output_units(&tx("22"), BUYER, &[marker_unit()]);

        let builder = RecordingBuilder::new(180_000);
        let whitelist = Whitelist::SingleUseAsset(AssetWhitelist::new(&wl_dir, &consumed));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.vended, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(chain.submitted_count(), 1);

        // The marker moved to the consumed directory, stamped with the
        // payment that spent it.
        assert!(!wl_dir.join(marker_unit().as_str()).exists());
        let stamped = consumed.join(format!("{}.{}", marker_unit(), tx("11")));
        assert!(stamped.exists());
    }

    /// An unlimited marker admits payment after payment.
    #[tokio::test]
    async fn unlimited_marker_survives_consumption() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        fs::write(wl_dir.join(marker_unit().as_str()), b"").unwrap();

        let chain = MockChain::new();
        for byte in ["11", "22"] {
            chain.add_payment(payment(byte, 25_000_000), BUYER);
            chain.add_output_units(&tx(byte), BUYER, &[marker_unit()]);
        }

        let builder = RecordingBuilder::new(180_000);
        let whitelist =
            Whitelist::UnlimitedAsset(AssetWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.vended, 2);
        assert!(wl_dir.join(marker_unit().as_str()).exists());
    }

    /// A payment holding no marked asset never mints.
    #[tokio::test]
    async fn unmarked_payments_are_refused() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        fs::write(wl_dir.join(marker_unit().as_str()), b"").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);

        let builder = RecordingBuilder::new(180_000);
        let whitelist =
            Whitelist::SingleUseAsset(AssetWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(chain.submitted_count(), 0);
        assert_eq!(fx.available_count(), 10);
    }

    fn ownership_proof(address: &str) -> serde_json::Value {
        let key = SigningKey::from_bytes(&[9u8; 32]);
        let signature = key.sign(address.as_bytes());
        json!({
            OWNERSHIP_METADATA_LABEL: {
                "address": address,
                "public_key": hex::encode(key.verifying_key().to_bytes()),
                "signature": hex::encode(signature.to_bytes()),
            }
        })
    }

    /// The wallet allowance shrinks with every vend and ends in refusal.
    #[tokio::test]
    async fn wallet_allowance_decreases_monotonically() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        fs::write(wl_dir.join(BUYER), "3").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        chain.set_aux(&tx("11"), ownership_proof(BUYER));
        chain.add_payment(payment("22", 50_000_000), BUYER);
        chain.set_aux(&tx("22"), ownership_proof(BUYER));
        chain.add_payment(payment("33", 25_000_000), BUYER);
        chain.set_aux(&tx("33"), ownership_proof(BUYER));

        let builder = RecordingBuilder::new(180_000);
        let whitelist = Whitelist::Wallet(WalletWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        // 2 granted, then allowance 1 caps the 5-mint request, then 0 refuses.
        assert_eq!(report.vended, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(fs::read_to_string(wl_dir.join(BUYER)).unwrap(), "0");
        assert_eq!(fx.available_count(), 7);
    }

    /// Without an ownership proof the allowance is unreachable.
    #[tokio::test]
    async fn wallet_whitelist_requires_the_proof() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        fs::write(wl_dir.join(BUYER), "3").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);

        let builder = RecordingBuilder::new(180_000);
        let whitelist = Whitelist::Wallet(WalletWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(fs::read_to_string(wl_dir.join(BUYER)).unwrap(), "3");
    }

    /// A proof signed for an address that never funded the payment is a
    /// replay attempt and earns nothing.
    #[tokio::test]
    async fn wallet_proof_must_name_a_sender() {
        let fx = Fixture::new(10);
        let wl_dir = fx.whitelist_dir();
        fs::write(wl_dir.join("addr_test1qwhitelisted"), "3").unwrap();

        let chain = MockChain::new();
        chain.add_payment(payment("11", 25_000_000), BUYER);
        chain.set_aux(&tx("11"), ownership_proof("addr_test1qwhitelisted"));

        let builder = RecordingBuilder::new(180_000);
        let whitelist = Whitelist::Wallet(WalletWhitelist::new(&wl_dir, fx.consumed_dir()));
        let machine = fx.machine(&chain, &builder, whitelist);
        let mut exclusions = fx.exclusions();

        let report = machine.vend_cycle(&mut exclusions).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(chain.submitted_count(), 0);
    }
}
