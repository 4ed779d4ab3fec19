//! The polling driver: cycle, sleep, repeat until interrupted.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use vend_chain::ChainIndexer;
use vend_engine::{ExclusionSet, VendingMachine};
use vend_txbuild::TxBuilder;

/// Runs vend cycles forever, sleeping `poll` between cycles and `cooldown`
/// after a transient failure. Returns on ctrl-c, or with the error when a
/// cycle fails permanently (only startup-grade faults do).
pub async fn run<C: ChainIndexer, B: TxBuilder>(
    machine: VendingMachine<C, B>,
    mut exclusions: ExclusionSet,
    poll: Duration,
    cooldown: Duration,
) -> Result<()> {
    info!(
        "[driver] polling every {}s, cooling down {}s after transient failures",
        poll.as_secs(),
        cooldown.as_secs()
    );

    loop {
        let sleep = match machine.vend_cycle(&mut exclusions).await {
            Ok(report) => {
                if report.examined > 0 {
                    info!(
                        "[driver] cycle: examined {} vended {} rejected {} skipped {}",
                        report.examined, report.vended, report.rejected, report.skipped
                    );
                }
                poll
            }
            Err(e) if e.is_transient() => {
                warn!("[driver] transient failure, cooling down: {e}");
                cooldown
            }
            Err(e) => return Err(e.into()),
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("[driver] shutdown requested");
                return Ok(());
            }
            _ = tokio::time::sleep(sleep) => {}
        }
    }
}
