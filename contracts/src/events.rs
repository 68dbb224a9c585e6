//! Contract events.
//!
//! The off-chain listener and history indexer subscribe to these; they are
//! the only log the contracts produce.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::types::{TriggerOutcome, TriggerReason};

#[odra::event]
pub struct Deposited {
    pub depositor: Address,
    pub amount: U256,
    pub new_balance: U256,
    pub total_stable_deposited: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct Withdrawn {
    pub depositor: Address,
    pub volatile_amount: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct DefenseLineTriggered {
    pub epoch: u32,
    pub defense_price: U256,
    /// Observed price; `None` for emergency stop and forced execution
    pub current_price: Option<U256>,
    pub reason: TriggerReason,
    pub timestamp: u64,
}

#[odra::event]
pub struct ConversionExecuted {
    pub epoch: u32,
    pub execution_price: U256,
    pub stable_consumed: U256,
    pub volatile_acquired: U256,
    pub dust: U256,
    pub depositors_credited: u64,
    pub timestamp: u64,
}

/// A trigger evaluation that produced no signal (stale, invalid or missing reading)
#[odra::event]
pub struct PriceSignalIgnored {
    pub epoch: u32,
    pub outcome: TriggerOutcome,
    pub observed_at: Option<u64>,
    pub timestamp: u64,
}

#[odra::event]
pub struct EmergencyStopped {
    pub by: Address,
    pub timestamp: u64,
}

#[odra::event]
pub struct DefenseRearmed {
    pub epoch: u32,
    pub reference_price: U256,
    pub defense_price: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct OracleUpdated {
    pub oracle: Address,
}

#[odra::event]
pub struct ReserveFunded {
    pub provider: Address,
    pub amount: U256,
    pub volatile_reserve: U256,
}

#[odra::event]
pub struct ReserveReleased {
    pub recipient: Address,
    pub amount: U256,
    pub volatile_reserve: U256,
}

/// Stable consumed by conversions, paid to the admin
#[odra::event]
pub struct ProceedsClaimed {
    pub recipient: Address,
    pub amount: U256,
}

#[odra::event]
pub struct PriceUpdated {
    pub price: U256,
    pub precision: u8,
    pub observed_at: u64,
    pub feeder: Address,
}
