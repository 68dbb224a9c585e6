//! Depositor Ledger
//!
//! Authoritative balance bookkeeping for the defense vault:
//! - stable deposits per account and in total
//! - volatile conversion shares per account
//! - all-or-nothing volatile withdrawals
//!
//! Accounts are an arena keyed by address plus an insertion-order index so
//! the conversion can walk every depositor in bounded time. Accounts are
//! never removed; zero-balance accounts stay for audit.
//!
//! The ledger does not know about engine state. The vault checks the state
//! machine first and only then touches the ledger.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::types::{DepositorAccount, LedgerTotals};
use crate::errors::DefenseError;

/// Depositor ledger, mounted as a submodule of the vault
#[odra::module]
pub struct Ledger {
    /// Account balances by address
    accounts: Mapping<Address, DepositorAccount>,
    /// Insertion-order index: position -> address
    depositors: Mapping<u64, Address>,
    /// Number of accounts ever created
    depositor_count: Var<u64>,
    /// Sum of all `stable_deposited`
    total_stable_deposited: Var<U256>,
    /// Cumulative volatile credited
    total_volatile_credited: Var<U256>,
    /// Cumulative volatile withdrawn
    total_volatile_withdrawn: Var<U256>,
}

#[odra::module]
impl Ledger {
    /// Get an account (zeroed if it never deposited)
    pub fn get_account(&self, owner: Address) -> DepositorAccount {
        self.accounts.get(&owner).unwrap_or_default()
    }

    /// Whether `owner` ever deposited
    pub fn has_account(&self, owner: Address) -> bool {
        self.accounts.get(&owner).is_some()
    }

    /// Get depositor address at index
    pub fn depositor_at(&self, index: u64) -> Option<Address> {
        self.depositors.get(&index)
    }

    pub fn depositor_count(&self) -> u64 {
        self.depositor_count.get_or_default()
    }

    pub fn total_stable_deposited(&self) -> U256 {
        self.total_stable_deposited.get_or_default()
    }

    /// Get ledger totals
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            total_stable_deposited: self.total_stable_deposited.get_or_default(),
            total_volatile_credited: self.total_volatile_credited.get_or_default(),
            total_volatile_withdrawn: self.total_volatile_withdrawn.get_or_default(),
            depositor_count: self.depositor_count.get_or_default(),
        }
    }
}

impl Ledger {
    /// Add a stable deposit. Creates the account on first deposit.
    ///
    /// Returns the account's new stable balance.
    pub fn credit_deposit(&mut self, owner: Address, amount: U256) -> Result<U256, DefenseError> {
        if amount.is_zero() {
            return Err(DefenseError::InvalidAmount);
        }

        let existing = self.accounts.get(&owner);
        let is_new = existing.is_none();
        let mut account = existing.unwrap_or_default();

        let new_balance = account
            .stable_deposited
            .checked_add(amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        let new_total = self
            .total_stable_deposited
            .get_or_default()
            .checked_add(amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;

        if is_new {
            let index = self.depositor_count.get_or_default();
            self.depositors.set(&index, owner);
            self.depositor_count.set(index + 1);
        }

        account.stable_deposited = new_balance;
        self.accounts.set(&owner, account);
        self.total_stable_deposited.set(new_total);

        Ok(new_balance)
    }

    /// Credit one conversion share and consume the account's stable stake.
    ///
    /// Called exactly once per account per conversion epoch.
    pub fn record_conversion_share(
        &mut self,
        owner: Address,
        volatile_amount: U256,
        epoch: u32,
    ) -> Result<(), DefenseError> {
        let mut account = self.accounts.get(&owner).unwrap_or_default();
        if account.last_conversion_epoch == Some(epoch) {
            return Err(DefenseError::ShareAlreadyRecorded);
        }

        let consumed = account.stable_deposited;
        account.volatile_credited = account
            .volatile_credited
            .checked_add(volatile_amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        account.stable_converted = account
            .stable_converted
            .checked_add(consumed)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        account.stable_deposited = U256::zero();
        account.last_conversion_epoch = Some(epoch);

        let total_stable = self
            .total_stable_deposited
            .get_or_default()
            .checked_sub(consumed)
            .ok_or(DefenseError::LedgerMismatch)?;
        let total_credited = self
            .total_volatile_credited
            .get_or_default()
            .checked_add(volatile_amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;

        self.accounts.set(&owner, account);
        self.total_stable_deposited.set(total_stable);
        self.total_volatile_credited.set(total_credited);
        Ok(())
    }

    /// Zero the account's credited volatile and return the amount.
    pub fn debit_withdrawal(&mut self, owner: Address) -> Result<U256, DefenseError> {
        let mut account = self.accounts.get(&owner).unwrap_or_default();
        let amount = account.volatile_credited;
        if amount.is_zero() {
            return Err(DefenseError::NothingToWithdraw);
        }

        account.volatile_credited = U256::zero();
        account.volatile_withdrawn = account
            .volatile_withdrawn
            .checked_add(amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;
        let total_withdrawn = self
            .total_volatile_withdrawn
            .get_or_default()
            .checked_add(amount)
            .ok_or(DefenseError::ArithmeticOverflow)?;

        self.accounts.set(&owner, account);
        self.total_volatile_withdrawn.set(total_withdrawn);
        Ok(amount)
    }

    /// Every depositor with its current stable stake, in index order
    pub fn stakes(&self) -> Vec<(Address, U256)> {
        let count = self.depositor_count.get_or_default();
        let mut stakes = Vec::new();
        for index in 0..count {
            if let Some(owner) = self.depositors.get(&index) {
                let account = self.accounts.get(&owner).unwrap_or_default();
                stakes.push((owner, account.stable_deposited));
            }
        }
        stakes
    }
}
