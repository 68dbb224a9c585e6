use odra::prelude::Addressable;
use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use pretty_assertions::assert_eq;

use defense_line_contracts::errors::DefenseError;
use defense_line_contracts::price_feed::{PriceFeed, PriceFeedInitArgs};
use defense_line_contracts::types::{PriceReading, TriggerOutcome};

use crate::fixtures::{price, setup};

#[test]
fn test_feed_starts_empty() {
    let f = setup();
    assert_eq!(f.feed.read_price(), None);
    assert_eq!(f.feed.get_decimals(), 8);
    assert_eq!(f.feed.get_update_count(), 0);
    assert!(f.feed.is_feeder(f.admin));
}

#[test]
fn test_update_price_stamps_block_time() {
    let mut f = setup();
    f.env.advance_block_time(5_000);
    f.post_price(price(1750));

    assert_eq!(
        f.feed.read_price(),
        Some(PriceReading {
            price: price(1750),
            precision: 8,
            observed_at: f.env.block_time(),
        })
    );
    assert_eq!(f.feed.get_update_count(), 1);
    assert!(f.env.emitted(&f.feed, "PriceUpdated"));
}

#[test]
fn test_relayed_reading_keeps_observation_time() {
    let mut f = setup();
    f.env.advance_block_time(10_000);
    let observed_at = f.env.block_time() - 4_000;

    f.as_admin();
    f.feed.update_price_at(price(1500), observed_at);
    assert_eq!(f.feed.read_price().unwrap().observed_at, observed_at);
}

#[test]
fn test_zero_and_future_prices_rejected() {
    let mut f = setup();
    f.as_admin();
    assert_eq!(
        f.feed.try_update_price(U256::zero()),
        Err(DefenseError::InvalidOracleReading.into())
    );

    let future = f.env.block_time() + 1;
    assert_eq!(
        f.feed.try_update_price_at(price(1500), future),
        Err(DefenseError::InvalidOracleReading.into())
    );
    assert_eq!(f.feed.read_price(), None);
}

#[test]
fn test_feed_never_moves_backwards() {
    let mut f = setup();
    f.env.advance_block_time(10_000);
    f.post_price(price(1700));

    let earlier = f.env.block_time() - 1;
    assert_eq!(
        f.feed.try_update_price_at(price(1500), earlier),
        Err(DefenseError::StaleOracleData.into())
    );
    assert_eq!(f.feed.read_price().unwrap().price, price(1700));
}

#[test]
fn test_only_feeders_post() {
    let mut f = setup();
    let bob = f.bob;

    f.env.set_caller(bob);
    assert_eq!(f.feed.try_update_price(price(1500)), Err(DefenseError::Unauthorized.into()));

    f.as_admin();
    f.feed.grant_feeder(bob);
    f.env.set_caller(bob);
    f.feed.update_price(price(1500));
    assert_eq!(f.feed.read_price().unwrap().price, price(1500));

    f.as_admin();
    f.feed.revoke_feeder(bob);
    assert!(!f.feed.is_feeder(bob));
    f.env.set_caller(bob);
    assert_eq!(f.feed.try_update_price(price(1400)), Err(DefenseError::Unauthorized.into()));
}

#[test]
fn test_precision_mismatch_is_invalid_signal() {
    let mut f = setup();
    f.as_admin();
    let mut wide_feed = PriceFeed::deploy(&f.env, PriceFeedInitArgs { decimals: Some(18) });
    wide_feed.update_price(U256::from(1500u64) * U256::exp10(18));

    f.vault.set_oracle(wide_feed.address().clone());
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::InvalidOracleReading);
    assert!(f.env.emitted(&f.vault, "PriceSignalIgnored"));
}
