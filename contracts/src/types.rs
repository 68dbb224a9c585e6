//! Common types used across the defense line protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// Defense engine state
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum DefenseStatus {
    /// Watching the oracle; deposits open
    #[default]
    Monitoring,
    /// Defense line crossed (or emergency stop); deposits closed
    Triggered,
    /// Pool converted; depositors may withdraw
    Executed,
}

/// What moved the engine out of `Monitoring`
#[odra::odra_type]
#[derive(Copy)]
pub enum TriggerReason {
    /// Fresh oracle price at or below the defense line
    PriceSignal,
    /// Guardian emergency stop
    EmergencyStop,
    /// Admin forced execution
    ForcedExecution,
}

/// Result of one trigger evaluation.
///
/// The oracle variants are the "no signal" outcomes: the engine stays in
/// `Monitoring` and the caller is expected to poll again.
#[odra::odra_type]
#[derive(Copy)]
pub enum TriggerOutcome {
    /// Transition `Monitoring -> Triggered` happened on this call
    Triggered,
    /// Fresh price above the defense line
    AboveDefenseLine,
    /// Engine already past `Monitoring`, nothing changed
    AlreadyTriggered,
    /// Reading older than the staleness window
    StaleOracleData,
    /// Zero price, wrong precision or timestamp in the future
    InvalidOracleReading,
    /// No oracle configured or no reading posted yet
    OracleUnavailable,
}

/// Price reading as supplied by the oracle adapter
#[odra::odra_type]
pub struct PriceReading {
    /// Integer price value
    pub price: U256,
    /// Decimal places for price
    pub precision: u8,
    /// Observation time (block time, milliseconds)
    pub observed_at: u64,
}

/// Per-depositor balances
#[odra::odra_type]
#[derive(Default)]
pub struct DepositorAccount {
    /// Stable asset awaiting conversion (6 decimals)
    pub stable_deposited: U256,
    /// Volatile asset credited and not yet withdrawn (18 decimals)
    pub volatile_credited: U256,
    /// Cumulative stable consumed by conversions
    pub stable_converted: U256,
    /// Cumulative volatile withdrawn
    pub volatile_withdrawn: U256,
    /// Epoch of the last conversion share recorded for this account
    pub last_conversion_epoch: Option<u32>,
}

/// Defense engine state for the current epoch
#[odra::odra_type]
pub struct ProtocolState {
    /// Monitoring epoch (incremented on every re-arm)
    pub epoch: u32,
    /// Reference price captured at init or re-arm
    pub reference_price: U256,
    /// reference_price * defense_ratio_bps / 10000
    pub defense_line_price: U256,
    pub is_triggered: bool,
    pub is_executed: bool,
    pub trigger_timestamp: Option<u64>,
    pub execution_timestamp: Option<u64>,
    pub trigger_reason: Option<TriggerReason>,
    /// Observed price when triggered by a price signal
    pub trigger_price: Option<U256>,
    /// Volatile acquired by this epoch's conversion
    pub total_volatile_held: U256,
    /// Stable consumed by this epoch's conversion
    pub stable_consumed: U256,
    /// Volatile left undistributed by integer division
    pub conversion_dust: U256,
}

/// Defense line summary returned by `get_defense_line_status`.
/// Zero timestamps mean "not yet".
#[odra::odra_type]
pub struct DefenseLineStatus {
    pub is_triggered: bool,
    pub is_executed: bool,
    pub defense_price: U256,
    pub trigger_time: u64,
    pub execution_time: u64,
}

/// Ledger totals
#[odra::odra_type]
#[derive(Default)]
pub struct LedgerTotals {
    /// Sum of all `stable_deposited`
    pub total_stable_deposited: U256,
    /// Cumulative volatile credited across epochs
    pub total_volatile_credited: U256,
    /// Cumulative volatile withdrawn across epochs
    pub total_volatile_withdrawn: U256,
    /// Accounts ever created
    pub depositor_count: u64,
}

impl LedgerTotals {
    /// Credited volatile still owed to depositors
    pub fn volatile_outstanding(&self) -> U256 {
        self.total_volatile_credited
            .saturating_sub(self.total_volatile_withdrawn)
    }
}

/// Summary of a closed epoch, kept for audit after re-arm
#[odra::odra_type]
pub struct EpochSummary {
    pub epoch: u32,
    pub reference_price: U256,
    pub defense_line_price: U256,
    pub trigger_reason: Option<TriggerReason>,
    pub trigger_timestamp: Option<u64>,
    pub execution_timestamp: Option<u64>,
    pub stable_consumed: U256,
    pub total_volatile_held: U256,
    pub conversion_dust: U256,
}
