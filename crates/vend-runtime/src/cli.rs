//! Command-line surface of the vending machine.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use vend_engine::{Bogo, MintConfig, MintPolicy};
use vend_types::{Address, Lovelace, Network, PolicyId, Unit};

#[derive(Parser, Debug)]
#[command(name = "nft-vendor")]
#[command(about = "Automated NFT vending machine over a Cardano payment address")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration, pool, and whitelist, then exit.
    Validate(VendArgs),
    /// Validate, then poll the payment address and vend until interrupted.
    Run(VendArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WhitelistMode {
    None,
    SingleUseAsset,
    UnlimitedAsset,
    Wallet,
}

#[derive(Args, Debug)]
pub struct VendArgs {
    /// Load the mint configuration from a JSON file instead of flags.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_parser = parse_network, default_value = "preprod")]
    pub network: Network,

    /// Address buyers pay into.
    #[arg(long)]
    pub payment_address: Option<String>,

    /// Signing key file for the payment address.
    #[arg(long, value_name = "FILE")]
    pub payment_sign_key: Option<PathBuf>,

    /// Address the profit share is swept to.
    #[arg(long)]
    pub profit_address: Option<String>,

    /// Price per mint as AMOUNT:UNIT, repeatable. UNIT is `lovelace` or a
    /// policy-id ++ asset-name hex string.
    #[arg(long = "mint-price", value_name = "AMOUNT:UNIT")]
    pub mint_prices: Vec<String>,

    /// Minting policy as POLICY_ID:SCRIPT_FILE:KEY_FILE, repeatable.
    #[arg(long = "policy", value_name = "ID:SCRIPT:KEY")]
    pub policies: Vec<String>,

    /// Paid mints granted to one payment, at most.
    #[arg(long, default_value_t = 5)]
    pub single_vend_max: u64,

    /// Hand out items in lexicographic order instead of at random.
    #[arg(long)]
    pub vend_in_order: bool,

    /// Dev fee in basis points of each payment.
    #[arg(long, default_value_t = 0)]
    pub dev_fee_bps: u32,

    #[arg(long)]
    pub dev_address: Option<String>,

    /// BOGO: grant bonus mints once a payment reaches this many.
    #[arg(long, requires = "bogo_additional")]
    pub bogo_threshold: Option<u64>,

    /// BOGO: how many bonus mints to grant.
    #[arg(long, requires = "bogo_threshold")]
    pub bogo_additional: Option<u64>,

    #[arg(long, value_enum, default_value_t = WhitelistMode::None)]
    pub whitelist: WhitelistMode,

    /// Directory of whitelist markers or allowance files.
    #[arg(long, value_name = "DIR")]
    pub whitelist_dir: Option<PathBuf>,

    /// Directory of available CIP-25 item files, one asset per file.
    #[arg(long, value_name = "DIR")]
    pub metadata_dir: PathBuf,

    /// Working directory for in-flight and completed state.
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Blockfrost project id.
    #[arg(long, env = "BLOCKFROST_PROJECT_ID")]
    pub blockfrost_project: String,

    /// Seconds between poll cycles.
    #[arg(long, default_value_t = 15)]
    pub poll_interval: u64,

    /// Seconds to wait after a transient failure.
    #[arg(long, default_value_t = 30)]
    pub cooldown: u64,
}

impl VendArgs {
    /// Assembles the mint configuration, from the config file when given
    /// and from individual flags otherwise.
    pub fn mint_config(&self) -> Result<MintConfig> {
        if let Some(path) = &self.config {
            return MintConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()));
        }

        let payment_address = self
            .payment_address
            .as_deref()
            .context("--payment-address is required without --config")?;
        let payment_sign_key = self
            .payment_sign_key
            .clone()
            .context("--payment-sign-key is required without --config")?;
        let profit_address = self
            .profit_address
            .as_deref()
            .context("--profit-address is required without --config")?;

        let mut prices = BTreeMap::new();
        for spec in &self.mint_prices {
            let (unit, amount) = parse_price(spec)?;
            prices.insert(unit, amount);
        }

        let mut policies = Vec::new();
        for spec in &self.policies {
            policies.push(parse_policy(spec)?);
        }

        let dev_address = self
            .dev_address
            .as_deref()
            .map(Address::new)
            .transpose()
            .context("--dev-address")?;

        let bogo = match (self.bogo_threshold, self.bogo_additional) {
            (Some(threshold), Some(additional)) => Some(Bogo {
                threshold,
                additional,
            }),
            _ => None,
        };

        Ok(MintConfig {
            network: self.network,
            payment_address: Address::new(payment_address).context("--payment-address")?,
            payment_signing_key_file: payment_sign_key,
            profit_address: Address::new(profit_address).context("--profit-address")?,
            prices,
            single_vend_max: self.single_vend_max,
            vend_randomly: !self.vend_in_order,
            dev_fee_bps: self.dev_fee_bps,
            dev_address,
            bogo,
            policies,
        })
    }
}

fn parse_network(raw: &str) -> Result<Network, String> {
    match raw {
        "mainnet" => Ok(Network::Mainnet),
        "preprod" => Ok(Network::Preprod),
        "preview" => Ok(Network::Preview),
        other => Err(format!("unknown network {other:?} (mainnet, preprod, preview)")),
    }
}

fn parse_price(spec: &str) -> Result<(Unit, Lovelace)> {
    let (amount, unit) = spec
        .split_once(':')
        .with_context(|| format!("price {spec:?} is not AMOUNT:UNIT"))?;
    let amount: Lovelace = amount
        .parse()
        .with_context(|| format!("price amount {amount:?} is not a number"))?;
    let unit = Unit::parse(unit).with_context(|| format!("price unit in {spec:?}"))?;
    Ok((unit, amount))
}

fn parse_policy(spec: &str) -> Result<MintPolicy> {
    let parts: Vec<&str> = spec.splitn(3, ':').collect();
    let [id, script, key] = parts.as_slice() else {
        bail!("policy {spec:?} is not POLICY_ID:SCRIPT_FILE:KEY_FILE");
    };
    Ok(MintPolicy {
        policy_id: PolicyId::new(*id).with_context(|| format!("policy id in {spec:?}"))?,
        script_file: PathBuf::from(*script),
        signing_key_file: PathBuf::from(*key),
    })
}
