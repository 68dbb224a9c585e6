use odra::prelude::Addressable;
use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use pretty_assertions::assert_eq;

use defense_line_contracts::access_control::{ROLE_ADMIN, ROLE_GUARDIAN};
use defense_line_contracts::errors::DefenseError;
use defense_line_contracts::price_feed::{PriceFeed, PriceFeedInitArgs};
use defense_line_contracts::types::{DefenseStatus, TriggerOutcome, TriggerReason};

use crate::fixtures::{price, setup, usdc};

// ========== Force Execute ==========

#[test]
fn test_force_execute_from_monitoring() {
    let mut f = setup();
    let alice = f.alice;
    f.deposit(alice, usdc(1600));

    f.as_admin();
    let acquired = f.vault.force_execute();

    let state = f.vault.get_protocol_state();
    assert_eq!(f.vault.get_status(), DefenseStatus::Executed);
    assert_eq!(state.trigger_reason, Some(TriggerReason::ForcedExecution));
    assert_eq!(f.vault.get_user_volatile_balance(alice), acquired);
    assert!(f.env.emitted(&f.vault, "DefenseLineTriggered"));
    assert!(f.env.emitted(&f.vault, "ConversionExecuted"));
}

#[test]
fn test_force_execute_from_triggered_keeps_reason() {
    let mut f = setup();
    let alice = f.alice;
    f.deposit(alice, usdc(100));
    f.trigger_at(price(1500));

    f.as_admin();
    f.vault.force_execute();
    assert_eq!(f.vault.get_status(), DefenseStatus::Executed);
    assert_eq!(
        f.vault.get_protocol_state().trigger_reason,
        Some(TriggerReason::PriceSignal)
    );
}

#[test]
fn test_force_execute_admin_only() {
    let mut f = setup();
    f.env.set_caller(f.guardian);
    assert_eq!(f.vault.try_force_execute(), Err(DefenseError::Unauthorized.into()));
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
}

#[test]
fn test_force_execute_after_execution() {
    let mut f = setup();
    f.as_admin();
    f.vault.force_execute();
    assert_eq!(f.vault.try_force_execute(), Err(DefenseError::AlreadyExecuted.into()));
}

// ========== Re-arm ==========

#[test]
fn test_rearm_requires_execution() {
    let mut f = setup();
    f.as_admin();
    assert_eq!(f.vault.try_rearm(price(1800)), Err(DefenseError::NotTriggeredYet.into()));

    f.trigger_at(price(1500));
    assert_eq!(f.vault.try_rearm(price(1800)), Err(DefenseError::NotExecutedYet.into()));
}

#[test]
fn test_dormant_depositor_does_not_block_rearm() {
    let mut f = setup();
    let (alice, bob) = (f.alice, f.bob);
    f.deposit(alice, usdc(300));
    f.deposit(bob, usdc(700));
    f.trigger_at(price(1500));
    f.vault.execute_conversion();

    // Bob withdraws, Alice stays away
    f.env.set_caller(bob);
    f.vault.withdraw();
    let alice_credit = f.vault.get_user_volatile_balance(alice);

    f.as_admin();
    f.vault.rearm(price(1800));
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
    assert_eq!(f.vault.get_defense_line_price(), price(1440));
    assert!(f.env.emitted(&f.vault, "DefenseRearmed"));

    // Closed-epoch credit is still paid out in the new epoch
    let before = f.volatile_balance(&alice);
    f.env.set_caller(alice);
    assert_eq!(f.vault.withdraw(), alice_credit);
    assert_eq!(f.volatile_balance(&alice), before + alice_credit);
    assert_eq!(f.vault.get_ledger_totals().volatile_outstanding(), U256::zero());
    assert_eq!(f.vault.try_withdraw(), Err(DefenseError::NothingToWithdraw.into()));

    // A fresh depositor of the new epoch waits for its conversion
    let carol = f.carol;
    f.deposit(carol, usdc(100));
    f.env.set_caller(carol);
    assert_eq!(f.vault.try_withdraw(), Err(DefenseError::NotExecutedYet.into()));
}

#[test]
fn test_dormant_credit_survives_second_conversion() {
    let mut f = setup();
    let alice = f.alice;
    f.deposit(alice, usdc(1600));
    f.trigger_at(price(1500));
    let first = f.vault.execute_conversion();

    f.as_admin();
    f.vault.rearm(price(2000));
    f.deposit(alice, usdc(1600));
    f.trigger_at(price(1500));
    let second = f.vault.execute_conversion();

    assert_eq!(f.vault.get_user_volatile_balance(alice), first + second);
    f.env.set_caller(alice);
    assert_eq!(f.vault.withdraw(), first + second);
}

#[test]
fn test_rearm_archives_epoch_and_runs_second_cycle() {
    let mut f = setup();
    let alice = f.alice;
    f.deposit(alice, usdc(1600));
    f.trigger_at(price(1500));
    let first = f.vault.execute_conversion();
    f.env.set_caller(alice);
    f.vault.withdraw();

    f.as_admin();
    f.vault.rearm(price(1800));

    let summary = f.vault.get_epoch_summary(0).unwrap();
    assert_eq!(summary.total_volatile_held, first);
    assert_eq!(summary.defense_line_price, price(1600));
    assert_eq!(summary.trigger_reason, Some(TriggerReason::PriceSignal));
    assert_eq!(f.vault.get_epoch_summary(1), None);

    let state = f.vault.get_protocol_state();
    assert_eq!(state.epoch, 1);
    assert_eq!(state.total_volatile_held, U256::zero());
    assert_eq!(f.vault.get_ledger_totals().total_stable_deposited, U256::zero());

    // Second cycle at the new $1440 line
    f.deposit(alice, usdc(1440));
    f.post_price(price(1500));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::AboveDefenseLine);
    f.trigger_at(price(1400));
    assert_eq!(f.vault.get_status(), DefenseStatus::Triggered);

    let second = f.vault.execute_conversion();
    assert_eq!(second, first);
    assert_eq!(f.vault.get_user_volatile_balance(alice), second);
    assert_eq!(f.vault.get_account(alice).last_conversion_epoch, Some(1));
    assert_eq!(f.vault.get_account(alice).stable_converted, usdc(1600 + 1440));
}

#[test]
fn test_rearm_admin_only() {
    let mut f = setup();
    f.as_admin();
    f.vault.force_execute();

    f.env.set_caller(f.guardian);
    assert_eq!(f.vault.try_rearm(price(1800)), Err(DefenseError::Unauthorized.into()));
}

// ========== Configuration ==========

#[test]
fn test_set_max_price_age() {
    let mut f = setup();
    f.as_admin();
    f.vault.set_max_price_age(60_000);
    assert_eq!(f.vault.get_config().max_price_age_ms, 60_000);

    f.post_price(price(1500));
    f.env.advance_block_time(60_001);
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::StaleOracleData);
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
}

#[test]
fn test_set_max_price_age_rejects_zero() {
    let mut f = setup();
    f.as_admin();
    assert_eq!(f.vault.try_set_max_price_age(0), Err(DefenseError::InvalidConfig.into()));

    f.env.set_caller(f.alice);
    assert_eq!(f.vault.try_set_max_price_age(1_000), Err(DefenseError::Unauthorized.into()));
}

#[test]
fn test_set_oracle() {
    let mut f = setup();
    f.as_admin();
    let mut replacement = PriceFeed::deploy(&f.env, PriceFeedInitArgs { decimals: None });
    replacement.update_price(price(1200));

    f.vault.set_oracle(replacement.address().clone());
    assert_eq!(f.vault.get_oracle(), Some(replacement.address().clone()));
    assert!(f.env.emitted(&f.vault, "OracleUpdated"));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::Triggered);

    f.env.set_caller(f.alice);
    assert_eq!(
        f.vault.try_set_oracle(f.feed.address().clone()),
        Err(DefenseError::Unauthorized.into())
    );
}

#[test]
fn test_set_oracle_rejects_contract_without_read_price() {
    let mut f = setup();
    f.as_admin();
    let token = f.stable_token.address().clone();
    assert!(f.vault.try_set_oracle(token).is_err());
    assert_eq!(f.vault.get_oracle(), Some(f.feed.address().clone()));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::OracleUnavailable);
}

#[test]
fn test_set_oracle_rejects_other_precision() {
    let mut f = setup();
    f.as_admin();
    let mut six_decimals = PriceFeed::deploy(&f.env, PriceFeedInitArgs { decimals: Some(6) });
    six_decimals.update_price(U256::from(1_500_000_000u64));

    assert_eq!(
        f.vault.try_set_oracle(six_decimals.address().clone()),
        Err(DefenseError::InvalidOracleReading.into())
    );
    assert_eq!(f.vault.get_oracle(), Some(f.feed.address().clone()));
}

// ========== Roles ==========

#[test]
fn test_grant_and_revoke_guardian() {
    let mut f = setup();
    let bob = f.bob;
    f.as_admin();
    f.vault.grant_role(ROLE_GUARDIAN, bob);
    assert!(f.vault.has_role(ROLE_GUARDIAN, bob));

    f.as_admin();
    f.vault.revoke_role(ROLE_GUARDIAN, f.guardian);
    assert!(!f.vault.has_role(ROLE_GUARDIAN, f.guardian));

    f.env.set_caller(f.guardian);
    assert_eq!(f.vault.try_emergency_stop(), Err(DefenseError::Unauthorized.into()));

    f.env.set_caller(bob);
    f.vault.emergency_stop();
    assert_eq!(f.vault.get_status(), DefenseStatus::Triggered);
}

#[test]
fn test_role_management_admin_only() {
    let mut f = setup();
    f.env.set_caller(f.guardian);
    assert_eq!(
        f.vault.try_grant_role(ROLE_GUARDIAN, f.alice),
        Err(DefenseError::Unauthorized.into())
    );
}

#[test]
fn test_last_admin_cannot_be_revoked() {
    let mut f = setup();
    f.as_admin();
    assert_eq!(
        f.vault.try_revoke_role(ROLE_ADMIN, f.admin),
        Err(DefenseError::InvalidConfig.into())
    );

    f.vault.grant_role(ROLE_ADMIN, f.bob);
    f.vault.revoke_role(ROLE_ADMIN, f.admin);
    assert!(!f.vault.is_admin(f.admin));
    assert!(f.vault.is_admin(f.bob));
}

#[test]
fn test_unknown_role_rejected() {
    let mut f = setup();
    f.as_admin();
    assert_eq!(f.vault.try_grant_role(7, f.alice), Err(DefenseError::InvalidConfig.into()));
}
