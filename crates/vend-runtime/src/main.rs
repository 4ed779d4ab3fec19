//! # NFT Vending Machine
//!
//! Watches a Cardano payment address through Blockfrost, validates each
//! incoming payment against the configured prices and whitelist, and mints
//! NFTs back to the payer with `cardano-cli`.
//!
//! ## Startup sequence
//!
//! 1. Parse flags (or a JSON config file) into a `MintConfig`
//! 2. Open the metadata pool under the exclusive pool lock
//! 3. Validate configuration, pool contents, and whitelist state
//! 4. `run` only: fetch protocol parameters, create the output layout,
//!    replay the exclusion log, and enter the poll loop

mod cli;
mod driver;

use std::fs;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vend_chain::{BlockfrostClient, ChainIndexer};
use vend_engine::{ExclusionSet, MintConfig, VendingMachine};
use vend_metadata::MetadataPool;
use vend_txbuild::CardanoCli;
use vend_whitelist::{AssetWhitelist, WalletWhitelist, Whitelist};

use crate::cli::{Cli, Command, VendArgs, WhitelistMode};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate(args) => validate(&args),
        Command::Run(args) => run(&args).await,
    }
}

/// Builds the object graph far enough to run every startup check, then
/// prints the effective configuration.
fn validate(args: &VendArgs) -> Result<()> {
    let config = args.mint_config()?;
    let pool = open_pool(args)?;
    let whitelist = build_whitelist(args)?;
    let chain = BlockfrostClient::new(&args.blockfrost_project, config.network)?;
    let builder = CardanoCli::new(
        config.network,
        args.output_dir.join("protocol.json"),
        args.output_dir.join("txns"),
    );

    let machine = VendingMachine::new(config, chain, builder, pool, whitelist);
    let items = machine.validate()?;
    println!("{}", serde_json::to_string_pretty(machine.config())?);
    info!("[runtime] validation passed with {items} vendable items");
    Ok(())
}

async fn run(args: &VendArgs) -> Result<()> {
    let config = args.mint_config()?;
    let txn_dir = args.output_dir.join("txns");
    fs::create_dir_all(&txn_dir)?;

    let chain = BlockfrostClient::new(&args.blockfrost_project, config.network)?;

    // The external builder reads protocol parameters from disk; fetched
    // once at startup, they hold for the life of the process.
    let params_file = args.output_dir.join("protocol.json");
    let params = chain
        .protocol_parameters()
        .await
        .context("fetching protocol parameters")?;
    fs::write(&params_file, serde_json::to_vec_pretty(&params)?)?;
    info!("[runtime] protocol parameters written to {}", params_file.display());

    let builder = CardanoCli::new(config.network, params_file, txn_dir);
    let pool = open_pool(args)?;
    let whitelist = build_whitelist(args)?;

    let machine = VendingMachine::new(config, chain, builder, pool, whitelist);
    machine.validate()?;

    let exclusions = ExclusionSet::open(args.output_dir.join("exclusions.log"))?;
    driver::run(
        machine,
        exclusions,
        Duration::from_secs(args.poll_interval),
        Duration::from_secs(args.cooldown),
    )
    .await
}

/// Opens the three-state pool: operator metadata as the available set,
/// `in_proc/` for reservations, `metadata/` for minted items and their
/// staged CIP-25 documents.
fn open_pool(args: &VendArgs) -> Result<MetadataPool> {
    let pool = MetadataPool::open(
        &args.metadata_dir,
        args.output_dir.join("in_proc"),
        args.output_dir.join("metadata"),
    )?;
    Ok(pool)
}

fn build_whitelist(args: &VendArgs) -> Result<Whitelist> {
    if args.whitelist == WhitelistMode::None {
        return Ok(Whitelist::None);
    }
    let dir = args
        .whitelist_dir
        .as_deref()
        .context("--whitelist-dir is required for this whitelist mode")?;
    if !dir.is_dir() {
        bail!("whitelist directory {} does not exist", dir.display());
    }
    let consumed = args.output_dir.join("wl_consumed");
    fs::create_dir_all(&consumed)?;

    Ok(match args.whitelist {
        WhitelistMode::None => unreachable!(),
        WhitelistMode::SingleUseAsset => {
            Whitelist::SingleUseAsset(AssetWhitelist::new(dir, consumed))
        }
        WhitelistMode::UnlimitedAsset => {
            Whitelist::UnlimitedAsset(AssetWhitelist::new(dir, consumed))
        }
        WhitelistMode::Wallet => Whitelist::Wallet(WalletWhitelist::new(dir, consumed)),
    })
}
