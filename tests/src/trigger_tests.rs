use pretty_assertions::assert_eq;

use defense_line_contracts::errors::DefenseError;
use defense_line_contracts::types::{DefenseStatus, TriggerOutcome, TriggerReason};

use crate::fixtures::{price, setup};

const ONE_HOUR_MS: u64 = 3_600_000;

#[test]
fn test_price_below_line_triggers() {
    let mut f = setup();
    f.post_price(price(1500));

    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::Triggered);
    assert_eq!(f.vault.get_status(), DefenseStatus::Triggered);

    let state = f.vault.get_protocol_state();
    assert_eq!(state.trigger_price, Some(price(1500)));
    assert_eq!(state.trigger_reason, Some(TriggerReason::PriceSignal));
    assert!(f.vault.get_defense_line_status().is_triggered);
    assert!(f.env.emitted(&f.vault, "DefenseLineTriggered"));
}

#[test]
fn test_price_at_line_triggers() {
    let mut f = setup();
    f.post_price(price(1600));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::Triggered);
}

#[test]
fn test_price_above_line_keeps_monitoring() {
    let mut f = setup();
    f.post_price(price(1700));

    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::AboveDefenseLine);
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
    assert!(!f.env.emitted(&f.vault, "DefenseLineTriggered"));
}

#[test]
fn test_stale_price_never_triggers() {
    let mut f = setup();
    f.post_price(price(1));
    f.env.advance_block_time(ONE_HOUR_MS + 1);

    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::StaleOracleData);
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
    assert!(f.env.emitted(&f.vault, "PriceSignalIgnored"));
}

#[test]
fn test_price_at_window_edge_still_counts() {
    let mut f = setup();
    f.post_price(price(1500));
    f.env.advance_block_time(ONE_HOUR_MS);

    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::Triggered);
}

#[test]
fn test_no_reading_is_unavailable() {
    let mut f = setup();
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::OracleUnavailable);
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
}

#[test]
fn test_vault_without_oracle_is_unavailable() {
    let mut f = setup();
    let mut vault = f.deploy_vault(None, price(2000));
    assert_eq!(vault.evaluate_trigger(), TriggerOutcome::OracleUnavailable);
    assert_eq!(vault.get_current_price(), None);
}

#[test]
fn test_trigger_is_idempotent() {
    let mut f = setup();
    f.trigger_at(price(1500));
    let state = f.vault.get_protocol_state();

    f.env.advance_block_time(1_000);
    f.post_price(price(900));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::AlreadyTriggered);
    assert_eq!(f.vault.get_protocol_state(), state);
}

#[test]
fn test_recovered_price_does_not_untrigger() {
    let mut f = setup();
    f.trigger_at(price(1500));
    f.post_price(price(2500));
    assert_eq!(f.vault.evaluate_trigger(), TriggerOutcome::AlreadyTriggered);
    assert_eq!(f.vault.get_status(), DefenseStatus::Triggered);
}

#[test]
fn test_current_price_passthrough() {
    let mut f = setup();
    f.post_price(price(1800));
    let reading = f.vault.get_current_price().unwrap();
    assert_eq!(reading.price, price(1800));
    assert_eq!(reading.precision, 8);
}

#[test]
fn test_guardian_emergency_stop() {
    let mut f = setup();
    f.env.set_caller(f.guardian);
    f.vault.emergency_stop();

    assert_eq!(f.vault.get_status(), DefenseStatus::Triggered);
    let state = f.vault.get_protocol_state();
    assert_eq!(state.trigger_reason, Some(TriggerReason::EmergencyStop));
    assert_eq!(state.trigger_price, None);
    assert!(f.env.emitted(&f.vault, "EmergencyStopped"));
}

#[test]
fn test_emergency_stop_unauthorized() {
    let mut f = setup();
    f.env.set_caller(f.alice);
    assert_eq!(f.vault.try_emergency_stop(), Err(DefenseError::Unauthorized.into()));
    assert_eq!(f.vault.get_status(), DefenseStatus::Monitoring);
}

#[test]
fn test_emergency_stop_twice() {
    let mut f = setup();
    f.env.set_caller(f.guardian);
    f.vault.emergency_stop();
    assert_eq!(f.vault.try_emergency_stop(), Err(DefenseError::AlreadyTriggered.into()));
}
