//! Defense engine state machine.
//!
//! `Monitoring -> Triggered -> Executed`, one direction only. A new
//! `Monitoring` epoch starts only through an explicit admin re-arm.
//!
//! Everything here is pure: the vault contract loads `ProtocolState`, calls
//! into it, and stores the result only when the call succeeded. The
//! conversion is split into `plan_conversion` (all checked arithmetic, no
//! mutation) and `apply_conversion`, so a failure can never leave a partially
//! assigned pool behind.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::DefenseError;
use crate::fixed_point::{
    self, BPS_SCALE, DEFAULT_DEFENSE_RATIO_BPS, PRICE_DECIMALS, STABLE_DECIMALS, VOLATILE_DECIMALS,
};
use crate::oracle_adapter::{assess_reading, DEFAULT_MAX_PRICE_AGE_MS};
use crate::types::{
    DefenseLineStatus, DefenseStatus, EpochSummary, PriceReading, ProtocolState, TriggerOutcome,
    TriggerReason,
};

/// Defense engine configuration
#[odra::odra_type]
pub struct DefenseConfig {
    /// Defense line as a fraction of the reference price (8000 = 80%)
    pub defense_ratio_bps: u32,
    /// Maximum age of an oracle reading, in block-time milliseconds
    pub max_price_age_ms: u64,
    /// Oracle price precision
    pub price_decimals: u8,
    /// Stable asset precision
    pub stable_decimals: u8,
    /// Volatile asset precision
    pub volatile_decimals: u8,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            defense_ratio_bps: DEFAULT_DEFENSE_RATIO_BPS,
            max_price_age_ms: DEFAULT_MAX_PRICE_AGE_MS,
            price_decimals: PRICE_DECIMALS,
            stable_decimals: STABLE_DECIMALS,
            volatile_decimals: VOLATILE_DECIMALS,
        }
    }
}

impl DefenseConfig {
    /// Ratio strictly between 0% and 100%, non-zero staleness window
    pub fn validate(&self) -> Result<(), DefenseError> {
        if self.defense_ratio_bps == 0 || self.defense_ratio_bps >= BPS_SCALE {
            return Err(DefenseError::InvalidConfig);
        }
        if self.max_price_age_ms == 0 {
            return Err(DefenseError::InvalidConfig);
        }
        Ok(())
    }
}

/// Fully computed conversion, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    /// Price the pool is converted at (the defense line)
    pub execution_price: U256,
    /// Stable consumed (the whole pool)
    pub stable_consumed: U256,
    /// Volatile purchased
    pub total_volatile: U256,
    /// Per-depositor volatile shares, depositors with zero stake omitted
    pub shares: Vec<(Address, U256)>,
    /// Rounding remainder kept by the protocol
    pub dust: U256,
}

impl ProtocolState {
    /// Fresh `Monitoring` epoch around `reference_price`
    pub fn new(epoch: u32, reference_price: U256, config: &DefenseConfig) -> Result<Self, DefenseError> {
        config.validate()?;
        if reference_price.is_zero() {
            return Err(DefenseError::InvalidConfig);
        }
        let defense_line_price =
            fixed_point::defense_line_price(reference_price, config.defense_ratio_bps)
                .ok_or(DefenseError::ArithmeticOverflow)?;
        if defense_line_price.is_zero() {
            return Err(DefenseError::InvalidConfig);
        }

        Ok(Self {
            epoch,
            reference_price,
            defense_line_price,
            is_triggered: false,
            is_executed: false,
            trigger_timestamp: None,
            execution_timestamp: None,
            trigger_reason: None,
            trigger_price: None,
            total_volatile_held: U256::zero(),
            stable_consumed: U256::zero(),
            conversion_dust: U256::zero(),
        })
    }

    pub fn status(&self) -> DefenseStatus {
        if self.is_executed {
            DefenseStatus::Executed
        } else if self.is_triggered {
            DefenseStatus::Triggered
        } else {
            DefenseStatus::Monitoring
        }
    }

    /// Deposits close permanently once the engine leaves `Monitoring`
    pub fn ensure_accepting_deposits(&self) -> Result<(), DefenseError> {
        match self.status() {
            DefenseStatus::Monitoring => Ok(()),
            DefenseStatus::Triggered | DefenseStatus::Executed => Err(DefenseError::EngineFrozen),
        }
    }

    /// Evaluate one oracle reading against the defense line.
    ///
    /// Oracle problems never fail the call: they come back as a no-signal
    /// outcome and the state is left untouched.
    pub fn observe_price(
        &mut self,
        reading: Option<&PriceReading>,
        now: u64,
        config: &DefenseConfig,
    ) -> TriggerOutcome {
        if self.is_triggered {
            return TriggerOutcome::AlreadyTriggered;
        }

        let price = match assess_reading(reading, now, config.max_price_age_ms, config.price_decimals) {
            Ok(price) => price,
            Err(DefenseError::StaleOracleData) => return TriggerOutcome::StaleOracleData,
            Err(DefenseError::OracleUnavailable) => return TriggerOutcome::OracleUnavailable,
            Err(_) => return TriggerOutcome::InvalidOracleReading,
        };

        if price > self.defense_line_price {
            return TriggerOutcome::AboveDefenseLine;
        }

        self.mark_triggered(TriggerReason::PriceSignal, Some(price), now);
        TriggerOutcome::Triggered
    }

    /// Move to `Triggered` without a price condition
    pub fn force_trigger(&mut self, reason: TriggerReason, now: u64) -> Result<(), DefenseError> {
        match self.status() {
            DefenseStatus::Monitoring => {
                self.mark_triggered(reason, None, now);
                Ok(())
            }
            DefenseStatus::Triggered => Err(DefenseError::AlreadyTriggered),
            DefenseStatus::Executed => Err(DefenseError::AlreadyExecuted),
        }
    }

    pub fn ensure_executable(&self) -> Result<(), DefenseError> {
        match self.status() {
            DefenseStatus::Triggered => Ok(()),
            DefenseStatus::Monitoring => Err(DefenseError::NotTriggeredYet),
            DefenseStatus::Executed => Err(DefenseError::AlreadyExecuted),
        }
    }

    /// Withdrawals need an executed conversion behind the credit: either a
    /// closed epoch (`credit_epoch` before the current one) or this epoch
    /// once executed.
    pub fn ensure_withdrawable(&self, credit_epoch: Option<u32>) -> Result<(), DefenseError> {
        match credit_epoch {
            Some(epoch) if epoch < self.epoch => Ok(()),
            _ if self.is_executed => Ok(()),
            _ => Err(DefenseError::NotExecutedYet),
        }
    }

    /// Compute the one-shot conversion of the whole pool at the defense line.
    ///
    /// # Arguments
    /// * `stakes` - Every depositor with its `stable_deposited`
    /// * `total_stable` - Ledger pool total; must equal the sum of `stakes`
    /// * `config` - Asset and price precisions
    pub fn plan_conversion(
        &self,
        stakes: &[(Address, U256)],
        total_stable: U256,
        config: &DefenseConfig,
    ) -> Result<ConversionPlan, DefenseError> {
        self.ensure_executable()?;

        let stake_sum = stakes.iter().try_fold(U256::zero(), |acc, (_, stake)| {
            acc.checked_add(*stake).ok_or(DefenseError::ArithmeticOverflow)
        })?;
        if stake_sum != total_stable {
            return Err(DefenseError::LedgerMismatch);
        }

        let total_volatile = fixed_point::quote_volatile(
            total_stable,
            self.defense_line_price,
            config.price_decimals,
            config.stable_decimals,
            config.volatile_decimals,
        )
        .ok_or(DefenseError::ArithmeticOverflow)?;

        let (shares, dust) = allocate_pro_rata(total_volatile, stakes, total_stable)?;

        Ok(ConversionPlan {
            execution_price: self.defense_line_price,
            stable_consumed: total_stable,
            total_volatile,
            shares,
            dust,
        })
    }

    /// Record a computed conversion; the only writer of `total_volatile_held`
    pub fn apply_conversion(&mut self, plan: &ConversionPlan, now: u64) -> Result<(), DefenseError> {
        self.ensure_executable()?;
        self.total_volatile_held = plan.total_volatile;
        self.stable_consumed = plan.stable_consumed;
        self.conversion_dust = plan.dust;
        self.is_executed = true;
        self.execution_timestamp = Some(now);
        Ok(())
    }

    /// Next `Monitoring` epoch, allowed once this epoch is executed.
    ///
    /// Credit not yet withdrawn stays on the accounts and remains
    /// withdrawable from the new epoch.
    pub fn rearm(&self, reference_price: U256, config: &DefenseConfig) -> Result<Self, DefenseError> {
        match self.status() {
            DefenseStatus::Executed => {}
            DefenseStatus::Monitoring => return Err(DefenseError::NotTriggeredYet),
            DefenseStatus::Triggered => return Err(DefenseError::NotExecutedYet),
        }
        let next_epoch = self.epoch.checked_add(1).ok_or(DefenseError::ArithmeticOverflow)?;
        Self::new(next_epoch, reference_price, config)
    }

    pub fn summary(&self) -> EpochSummary {
        EpochSummary {
            epoch: self.epoch,
            reference_price: self.reference_price,
            defense_line_price: self.defense_line_price,
            trigger_reason: self.trigger_reason,
            trigger_timestamp: self.trigger_timestamp,
            execution_timestamp: self.execution_timestamp,
            stable_consumed: self.stable_consumed,
            total_volatile_held: self.total_volatile_held,
            conversion_dust: self.conversion_dust,
        }
    }

    pub fn line_status(&self) -> DefenseLineStatus {
        DefenseLineStatus {
            is_triggered: self.is_triggered,
            is_executed: self.is_executed,
            defense_price: self.defense_line_price,
            trigger_time: self.trigger_timestamp.unwrap_or(0),
            execution_time: self.execution_timestamp.unwrap_or(0),
        }
    }

    fn mark_triggered(&mut self, reason: TriggerReason, price: Option<U256>, now: u64) {
        self.is_triggered = true;
        self.trigger_timestamp = Some(now);
        self.trigger_reason = Some(reason);
        self.trigger_price = price;
    }
}

/// Split `total_volatile` across `stakes` pro rata to `total_stable`.
///
/// Returns the non-zero shares and the undistributed remainder (dust).
/// The sum of shares never exceeds `total_volatile`.
pub fn allocate_pro_rata(
    total_volatile: U256,
    stakes: &[(Address, U256)],
    total_stable: U256,
) -> Result<(Vec<(Address, U256)>, U256), DefenseError> {
    if total_stable.is_zero() {
        return Ok((Vec::new(), total_volatile));
    }

    let mut shares = Vec::with_capacity(stakes.len());
    let mut distributed = U256::zero();

    for (depositor, stake) in stakes.iter().filter(|(_, stake)| !stake.is_zero()) {
        let share = fixed_point::pro_rata(total_volatile, *stake, total_stable)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        distributed = distributed
            .checked_add(share)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        shares.push((*depositor, share));
    }

    let dust = total_volatile
        .checked_sub(distributed)
        .ok_or(DefenseError::ArithmeticOverflow)?;

    Ok((shares, dust))
}
