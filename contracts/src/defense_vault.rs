//! Defense Vault Contract
//!
//! Main entry point of the protocol. Depositors park stable funds; when the
//! oracle reports the volatile asset at or below the defense line, the whole
//! pool is converted at the defense line price in one shot and every depositor
//! is credited a pro-rata share of the volatile asset.
//!
//! Flow:
//! 1. `deposit` while the engine is `Monitoring`
//! 2. keeper calls `evaluate_trigger` after each oracle update
//! 3. anyone calls `execute_conversion` once `Triggered`
//! 4. depositors `withdraw` their whole volatile credit, now or in any later
//!    epoch
//!
//! Every entry point runs as one Casper transaction. State is loaded, changed
//! through the pure engine and ledger functions, and written back only on
//! success; any error reverts the transaction with nothing applied.
//!
//! Both assets are CEP-18 tokens held by the vault. `deposit` pulls stable
//! from the caller (approve the vault first) and `withdraw` pays out volatile.
//! The volatile side of a conversion comes from a reserve the admin funds
//! ahead of time; the stable it consumes becomes proceeds the admin claims.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::access_control::{AccessControl, ROLE_ADMIN};
use crate::custody::Custody;
use crate::defense_engine::{ConversionPlan, DefenseConfig};
use crate::errors::{ok_or_revert, DefenseError};
use crate::events::{
    ConversionExecuted, DefenseLineTriggered, DefenseRearmed, Deposited, EmergencyStopped,
    OracleUpdated, PriceSignalIgnored, ProceedsClaimed, ReserveFunded, ReserveReleased,
    Withdrawn,
};
use crate::ledger::Ledger;
use crate::oracle_adapter;
use crate::types::{
    DefenseLineStatus, DefenseStatus, DepositorAccount, EpochSummary, LedgerTotals, PriceReading,
    ProtocolState, TriggerOutcome, TriggerReason,
};

/// Defense Vault Contract
#[odra::module(events = [
    Deposited,
    Withdrawn,
    DefenseLineTriggered,
    ConversionExecuted,
    PriceSignalIgnored,
    EmergencyStopped,
    DefenseRearmed,
    OracleUpdated,
    ReserveFunded,
    ReserveReleased,
    ProceedsClaimed
])]
pub struct DefenseVault {
    /// Role table (admin, guardians)
    access: SubModule<AccessControl>,
    /// Depositor balances
    ledger: SubModule<Ledger>,
    /// Token holdings and conversion reserve
    custody: SubModule<Custody>,
    /// Engine state for the current epoch
    state: Var<ProtocolState>,
    /// Engine configuration
    config: Var<DefenseConfig>,
    /// Price feed contract
    oracle: Var<Option<Address>>,
    /// Closed epochs by number
    epochs: Mapping<u32, EpochSummary>,
}

#[odra::module]
impl DefenseVault {
    /// Initialize the vault; the deployer becomes admin
    ///
    /// # Arguments
    /// * `stable_token` - CEP-18 stable asset (6 decimals)
    /// * `volatile_token` - CEP-18 volatile asset (18 decimals)
    /// * `oracle` - Price feed contract (can be set later)
    /// * `reference_price` - Price the defense line is derived from (8 decimals)
    pub fn init(
        &mut self,
        stable_token: Address,
        volatile_token: Address,
        oracle: Option<Address>,
        reference_price: U256,
    ) {
        let deployer = self.env().caller();
        self.access.init(deployer);
        self.custody.init(stable_token, volatile_token);

        let config = DefenseConfig::default();
        let state = ok_or_revert(&self.env(), ProtocolState::new(0, reference_price, &config));
        if let Some(oracle) = oracle {
            ok_or_revert(
                &self.env(),
                oracle_adapter::check_oracle(&self.env(), oracle, config.price_decimals),
            );
        }

        self.config.set(config);
        self.state.set(state);
        self.oracle.set(oracle);
    }

    // ========== User Functions ==========

    /// Deposit stable funds (minor units, 6 decimals)
    ///
    /// The vault pulls `amount` with `transfer_from`, so the caller must have
    /// approved it on the stable token. Returns the caller's new stable balance.
    pub fn deposit(&mut self, amount: U256) -> U256 {
        let state = self.load_state();
        ok_or_revert(&self.env(), state.ensure_accepting_deposits());

        let caller = self.env().caller();
        let new_balance = ok_or_revert(&self.env(), self.ledger.credit_deposit(caller, amount));
        self.custody.pull_stable(caller, amount);

        self.env().emit_event(Deposited {
            depositor: caller,
            amount,
            new_balance,
            total_stable_deposited: self.ledger.total_stable_deposited(),
            timestamp: self.env().get_block_time(),
        });

        new_balance
    }

    /// Withdraw the caller's whole volatile credit
    ///
    /// Credit from an executed epoch stays withdrawable after a re-arm.
    pub fn withdraw(&mut self) -> U256 {
        let caller = self.env().caller();
        let account = self.ledger.get_account(caller);
        ok_or_revert(
            &self.env(),
            self.load_state().ensure_withdrawable(account.last_conversion_epoch),
        );

        let amount = ok_or_revert(&self.env(), self.ledger.debit_withdrawal(caller));
        self.custody.pay_volatile(caller, amount);

        self.env().emit_event(Withdrawn {
            depositor: caller,
            volatile_amount: amount,
            timestamp: self.env().get_block_time(),
        });

        amount
    }

    // ========== Trigger & Execution ==========

    /// Read the oracle and trigger the defense line if the price is at or
    /// below it. Oracle problems are reported as an outcome, never reverted.
    pub fn evaluate_trigger(&mut self) -> TriggerOutcome {
        let mut state = self.load_state();
        let config = self.get_config();
        let now = self.env().get_block_time();
        let reading = oracle_adapter::read_price(&self.env(), self.oracle.get().flatten());

        let outcome = state.observe_price(reading.as_ref(), now, &config);
        match outcome {
            TriggerOutcome::Triggered => {
                self.env().emit_event(DefenseLineTriggered {
                    epoch: state.epoch,
                    defense_price: state.defense_line_price,
                    current_price: state.trigger_price,
                    reason: TriggerReason::PriceSignal,
                    timestamp: now,
                });
                self.state.set(state);
            }
            TriggerOutcome::StaleOracleData
            | TriggerOutcome::InvalidOracleReading
            | TriggerOutcome::OracleUnavailable => {
                self.env().emit_event(PriceSignalIgnored {
                    epoch: state.epoch,
                    outcome,
                    observed_at: reading.map(|r| r.observed_at),
                    timestamp: now,
                });
            }
            TriggerOutcome::AboveDefenseLine | TriggerOutcome::AlreadyTriggered => {}
        }

        outcome
    }

    /// Convert the whole pool at the defense line (callable by anyone once triggered)
    ///
    /// Returns the volatile amount acquired.
    pub fn execute_conversion(&mut self) -> U256 {
        let mut state = self.load_state();
        self.convert(&mut state)
    }

    // ========== Guardian & Admin Functions ==========

    /// Trigger the defense line regardless of price (guardian or admin)
    pub fn emergency_stop(&mut self) {
        self.access.require_guardian();

        let mut state = self.load_state();
        let now = self.env().get_block_time();
        ok_or_revert(&self.env(), state.force_trigger(TriggerReason::EmergencyStop, now));
        self.state.set(state.clone());

        self.env().emit_event(EmergencyStopped {
            by: self.env().caller(),
            timestamp: now,
        });
        self.emit_triggered(&state, TriggerReason::EmergencyStop);
    }

    /// Trigger (if needed) and convert in one call (admin only)
    pub fn force_execute(&mut self) -> U256 {
        self.access.require_admin();

        let mut state = self.load_state();
        if state.status() == DefenseStatus::Monitoring {
            let now = self.env().get_block_time();
            ok_or_revert(&self.env(), state.force_trigger(TriggerReason::ForcedExecution, now));
            self.emit_triggered(&state, TriggerReason::ForcedExecution);
        }
        self.convert(&mut state)
    }

    /// Close the executed epoch and start monitoring around a new reference price (admin only)
    ///
    /// Unwithdrawn credit stays on the accounts.
    pub fn rearm(&mut self, reference_price: U256) {
        self.access.require_admin();

        let state = self.load_state();
        let config = self.get_config();
        let next = ok_or_revert(&self.env(), state.rearm(reference_price, &config));

        self.epochs.set(&state.epoch, state.summary());
        self.state.set(next.clone());

        self.env().emit_event(DefenseRearmed {
            epoch: next.epoch,
            reference_price: next.reference_price,
            defense_price: next.defense_line_price,
            timestamp: self.env().get_block_time(),
        });
    }

    /// Point the vault at a price feed contract (admin only)
    ///
    /// The candidate is read once; a contract that cannot answer `read_price`
    /// reverts this call.
    pub fn set_oracle(&mut self, oracle: Address) {
        self.access.require_admin();
        let config = self.get_config();
        ok_or_revert(
            &self.env(),
            oracle_adapter::check_oracle(&self.env(), oracle, config.price_decimals),
        );
        self.oracle.set(Some(oracle));
        self.env().emit_event(OracleUpdated { oracle });
    }

    /// Set the staleness window in milliseconds (admin only)
    pub fn set_max_price_age(&mut self, max_price_age_ms: u64) {
        self.access.require_admin();
        let mut config = self.get_config();
        config.max_price_age_ms = max_price_age_ms;
        ok_or_revert(&self.env(), config.validate());
        self.config.set(config);
    }

    /// Pull volatile from the admin into the conversion reserve (admin only)
    pub fn fund_reserve(&mut self, amount: U256) -> U256 {
        self.access.require_admin();
        let provider = self.env().caller();
        let volatile_reserve = self.custody.fund_reserve(provider, amount);
        self.env().emit_event(ReserveFunded {
            provider,
            amount,
            volatile_reserve,
        });
        volatile_reserve
    }

    /// Return unused reserve to the admin (admin only, not while a conversion is pending)
    pub fn release_reserve(&mut self, amount: U256) -> U256 {
        self.access.require_admin();
        if self.load_state().status() == DefenseStatus::Triggered {
            self.env().revert(DefenseError::AlreadyTriggered);
        }
        let recipient = self.env().caller();
        let volatile_reserve = self.custody.release_reserve(recipient, amount);
        self.env().emit_event(ReserveReleased {
            recipient,
            amount,
            volatile_reserve,
        });
        volatile_reserve
    }

    /// Send the stable consumed by conversions to the admin (admin only)
    pub fn claim_proceeds(&mut self) -> U256 {
        self.access.require_admin();
        let recipient = self.env().caller();
        let amount = self.custody.claim_proceeds(recipient);
        self.env().emit_event(ProceedsClaimed { recipient, amount });
        amount
    }

    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.access.grant_role(role_id, account);
    }

    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.access.revoke_role(role_id, account);
    }

    // ========== Query Functions ==========

    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.access.has_role(role_id, account)
    }

    pub fn is_admin(&self, account: Address) -> bool {
        self.access.has_role(ROLE_ADMIN, account)
    }

    pub fn get_status(&self) -> DefenseStatus {
        self.load_state().status()
    }

    pub fn get_defense_line_status(&self) -> DefenseLineStatus {
        self.load_state().line_status()
    }

    pub fn get_defense_line_price(&self) -> U256 {
        self.load_state().defense_line_price
    }

    /// Latest oracle reading, unvalidated
    pub fn get_current_price(&self) -> Option<PriceReading> {
        oracle_adapter::read_price(&self.env(), self.oracle.get().flatten())
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.oracle.get().flatten()
    }

    pub fn get_stable_token(&self) -> Address {
        self.custody.stable_token()
    }

    pub fn get_volatile_token(&self) -> Address {
        self.custody.volatile_token()
    }

    /// Volatile available to the next conversion
    pub fn get_volatile_reserve(&self) -> U256 {
        self.custody.volatile_reserve()
    }

    pub fn get_stable_proceeds(&self) -> U256 {
        self.custody.stable_proceeds()
    }

    pub fn get_user_stable_balance(&self, user: Address) -> U256 {
        self.ledger.get_account(user).stable_deposited
    }

    pub fn get_user_volatile_balance(&self, user: Address) -> U256 {
        self.ledger.get_account(user).volatile_credited
    }

    pub fn get_account(&self, user: Address) -> DepositorAccount {
        self.ledger.get_account(user)
    }

    pub fn get_depositor_count(&self) -> u64 {
        self.ledger.depositor_count()
    }

    pub fn get_protocol_state(&self) -> ProtocolState {
        self.load_state()
    }

    pub fn get_ledger_totals(&self) -> LedgerTotals {
        self.ledger.totals()
    }

    pub fn get_config(&self) -> DefenseConfig {
        self.config.get().unwrap_or_default()
    }

    /// Summary of a closed epoch
    pub fn get_epoch_summary(&self, epoch: u32) -> Option<EpochSummary> {
        self.epochs.get(&epoch)
    }

    pub fn defense_ratio_bps(&self) -> u32 {
        self.get_config().defense_ratio_bps
    }

    // ========== Internal Functions ==========

    fn load_state(&self) -> ProtocolState {
        match self.state.get() {
            Some(state) => state,
            None => self.env().revert(DefenseError::InvalidConfig),
        }
    }

    /// Plan against a ledger snapshot, swap the pool against the reserve, then
    /// write shares and state
    fn convert(&mut self, state: &mut ProtocolState) -> U256 {
        let config = self.get_config();
        let stakes = self.ledger.stakes();
        let total_stable = self.ledger.total_stable_deposited();
        let plan: ConversionPlan =
            ok_or_revert(&self.env(), state.plan_conversion(&stakes, total_stable, &config));

        let now = self.env().get_block_time();
        ok_or_revert(&self.env(), state.apply_conversion(&plan, now));
        ok_or_revert(
            &self.env(),
            self.custody.commit_conversion(plan.stable_consumed, plan.total_volatile),
        );

        for (depositor, share) in plan.shares.iter() {
            ok_or_revert(
                &self.env(),
                self.ledger.record_conversion_share(*depositor, *share, state.epoch),
            );
        }
        self.state.set(state.clone());

        self.env().emit_event(ConversionExecuted {
            epoch: state.epoch,
            execution_price: plan.execution_price,
            stable_consumed: plan.stable_consumed,
            volatile_acquired: plan.total_volatile,
            dust: plan.dust,
            depositors_credited: plan.shares.len() as u64,
            timestamp: now,
        });

        plan.total_volatile
    }

    fn emit_triggered(&self, state: &ProtocolState, reason: TriggerReason) {
        self.env().emit_event(DefenseLineTriggered {
            epoch: state.epoch,
            defense_price: state.defense_line_price,
            current_price: None,
            reason,
            timestamp: state.trigger_timestamp.unwrap_or_default(),
        });
    }
}
