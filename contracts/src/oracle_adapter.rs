//! Price Oracle Adapter
//!
//! Reads the reference asset price from an oracle contract and decides whether
//! the reading is usable as a trigger signal.
//!
//! The adapter performs no retries and no caching. Deciding when to read
//! (poll interval, event subscription) belongs to the off-chain keeper, which
//! calls `DefenseVault::evaluate_trigger` after every fresh oracle update.
//!
//! A reading is rejected ("no signal") when:
//! - no oracle is configured or nothing has been posted yet
//! - the price is zero
//! - the precision differs from the configured price precision
//! - the observation time lies in the future
//! - the observation is older than the staleness window
//!
//! ## Limits
//!
//! A Casper cross-contract call cannot be caught: if the oracle contract lacks
//! a `read_price` entry point, returns another type, or reverts, the calling
//! transaction reverts with it. `evaluate_trigger` then faults instead of
//! reporting `OracleUnavailable`. The vault narrows this by calling
//! [`check_oracle`] when an oracle is configured, so a contract that cannot
//! answer `read_price` is never installed. An installed oracle that starts
//! reverting later still blocks price triggers; the guardian's emergency stop
//! does not read the oracle and remains available.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs};
use odra::CallDef;
use crate::types::PriceReading;
use crate::errors::DefenseError;

/// Default staleness window: 1 hour of block time (milliseconds)
pub const DEFAULT_MAX_PRICE_AGE_MS: u64 = 3_600_000;

/// Entry point name the oracle contract exposes
pub const READ_PRICE_ENTRY_POINT: &str = "read_price";

/// Read the latest price from the oracle contract at `oracle`.
///
/// Returns `None` when no oracle is configured or the oracle has no reading.
pub fn read_price(env: &odra::ContractEnv, oracle: Option<Address>) -> Option<PriceReading> {
    let oracle = oracle?;
    let call_def = CallDef::new(READ_PRICE_ENTRY_POINT, false, RuntimeArgs::new());
    env.call_contract::<Option<PriceReading>>(oracle, call_def)
}

/// Call `read_price` once on a candidate oracle.
///
/// A contract without the entry point reverts the calling transaction. A
/// reading posted in another precision is rejected. An empty feed is
/// accepted.
pub fn check_oracle(
    env: &odra::ContractEnv,
    oracle: Address,
    expected_precision: u8,
) -> Result<(), DefenseError> {
    match read_price(env, Some(oracle)) {
        Some(reading) if reading.precision != expected_precision => {
            Err(DefenseError::InvalidOracleReading)
        }
        _ => Ok(()),
    }
}

/// Validate a reading and return its price.
///
/// # Arguments
/// * `reading` - Latest oracle reading, if any
/// * `now` - Current block time (milliseconds)
/// * `max_price_age_ms` - Staleness window
/// * `expected_precision` - Decimals the defense line is expressed in
pub fn assess_reading(
    reading: Option<&PriceReading>,
    now: u64,
    max_price_age_ms: u64,
    expected_precision: u8,
) -> Result<U256, DefenseError> {
    let reading = reading.ok_or(DefenseError::OracleUnavailable)?;

    if reading.price.is_zero() || reading.precision != expected_precision {
        return Err(DefenseError::InvalidOracleReading);
    }

    if reading.observed_at > now {
        return Err(DefenseError::InvalidOracleReading);
    }

    if now - reading.observed_at > max_price_age_ms {
        return Err(DefenseError::StaleOracleData);
    }

    Ok(reading.price)
}
