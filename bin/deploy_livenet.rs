//! Deploy the defense line contracts to Casper livenet/testnet using the Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!   DEFENSE_STABLE_TOKEN=hash-...     (CEP-18 stable asset, 6 decimals)
//!   DEFENSE_VOLATILE_TOKEN=hash-...   (CEP-18 volatile asset, 18 decimals)
//!
//! Optional:
//!   DEFENSE_REFERENCE_PRICE=2000      (whole USD, scaled to 8 decimals)
//!   DEFENSE_MAX_PRICE_AGE_MS=3600000
//!   DEFENSE_GUARDIAN=account-hash-...
//!   DEFENSE_INITIAL_PRICE=2000        (whole USD, posted to the feed after deploy)

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;
use std::str::FromStr;

use defense_line_contracts::access_control::ROLE_GUARDIAN;
use defense_line_contracts::defense_vault::{DefenseVault, DefenseVaultInitArgs};
use defense_line_contracts::fixed_point::PRICE_DECIMALS;
use defense_line_contracts::oracle_adapter::DEFAULT_MAX_PRICE_AGE_MS;
use defense_line_contracts::price_feed::{PriceFeed, PriceFeedInitArgs};

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_address(key: &str) -> Option<Address> {
    let raw = std::env::var(key).ok()?;
    match Address::from_str(&raw) {
        Ok(address) => Some(address),
        Err(_) => {
            eprintln!("Ignoring {}: not a valid address: {}", key, raw);
            None
        }
    }
}

fn whole_usd(value: u64) -> U256 {
    U256::from(value) * U256::exp10(PRICE_DECIMALS as usize)
}

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== Defense Line Livenet Deployment ===");
    println!();

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount: u64 = env_u64("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT").unwrap_or(200_000_000_000);
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // Protocol parameters
    let reference_price = whole_usd(env_u64("DEFENSE_REFERENCE_PRICE").unwrap_or(2000));
    let max_price_age_ms = env_u64("DEFENSE_MAX_PRICE_AGE_MS").unwrap_or(DEFAULT_MAX_PRICE_AGE_MS);
    let guardian = env_address("DEFENSE_GUARDIAN");
    let (stable_token, volatile_token) = match (
        env_address("DEFENSE_STABLE_TOKEN"),
        env_address("DEFENSE_VOLATILE_TOKEN"),
    ) {
        (Some(stable), Some(volatile)) => (stable, volatile),
        _ => {
            eprintln!("DEFENSE_STABLE_TOKEN and DEFENSE_VOLATILE_TOKEN must be set");
            std::process::exit(1);
        }
    };

    // ==================== Phase 1: Price Feed ====================
    println!("=== Phase 1: Deploying PriceFeed ===");
    println!();

    println!("Deploying PriceFeed...");
    let mut feed = PriceFeed::deploy(&env, PriceFeedInitArgs { decimals: Some(PRICE_DECIMALS) });
    let feed_addr = feed.address().clone();
    println!("PriceFeed deployed at: {:?}", feed_addr);

    if let Some(initial) = env_u64("DEFENSE_INITIAL_PRICE") {
        println!("Posting initial price ${}...", initial);
        feed.update_price(whole_usd(initial));
        println!("Done.");
    }
    println!();

    // ==================== Phase 2: Defense Vault ====================
    println!("=== Phase 2: Deploying DefenseVault ===");
    println!();

    println!("Deploying DefenseVault (reference price {})...", reference_price);
    let mut vault = DefenseVault::deploy(
        &env,
        DefenseVaultInitArgs {
            stable_token,
            volatile_token,
            oracle: Some(feed_addr),
            reference_price,
        },
    );
    let vault_addr = vault.address().clone();
    println!("DefenseVault deployed at: {:?}", vault_addr);
    println!();

    // ==================== Phase 3: Configuration ====================
    println!("=== Phase 3: Configuration ===");
    println!();

    if max_price_age_ms != DEFAULT_MAX_PRICE_AGE_MS {
        println!("Setting max price age to {} ms...", max_price_age_ms);
        vault.set_max_price_age(max_price_age_ms);
        println!("Done.");
    }

    if let Some(guardian) = guardian {
        println!("Granting guardian role to {:?}...", guardian);
        vault.grant_role(ROLE_GUARDIAN, guardian);
        println!("Done.");
    }

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  PriceFeed:     {:?}", feed_addr);
    println!("  DefenseVault:  {:?}", vault_addr);
    println!();
    println!("Defense line price: {}", vault.get_defense_line_price());
    println!();
    println!("Next: approve the vault on the volatile token and call fund_reserve.");
}
