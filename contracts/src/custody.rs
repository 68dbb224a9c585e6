//! Token Custody
//!
//! Holds the two CEP-18 legs of the vault:
//! - stable token: pulled from depositors on `deposit`
//! - volatile token: pre-funded by the admin into a conversion reserve and
//!   paid out to depositors on `withdraw`
//!
//! On conversion the reserve gives up the volatile bought for the pool and the
//! consumed stable becomes proceeds owed to the reserve provider. The reserve
//! is the counterparty that sells at the defense line.
//!
//! Token balances held by the vault always cover
//! `volatile_reserve + credited-not-withdrawn + dust` and
//! `pool + stable_proceeds`.

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::errors::DefenseError;

/// CEP-18 token interface for cross-contract calls
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
}

/// Custody submodule of the vault
#[odra::module]
pub struct Custody {
    /// Stable token contract
    stable_token: Var<Address>,
    /// Volatile token contract
    volatile_token: Var<Address>,
    /// Volatile available to future conversions
    volatile_reserve: Var<U256>,
    /// Stable consumed by conversions, not yet claimed
    stable_proceeds: Var<U256>,
}

#[odra::module]
impl Custody {
    pub fn init(&mut self, stable_token: Address, volatile_token: Address) {
        if stable_token == volatile_token {
            self.env().revert(DefenseError::InvalidConfig);
        }
        self.stable_token.set(stable_token);
        self.volatile_token.set(volatile_token);
        self.volatile_reserve.set(U256::zero());
        self.stable_proceeds.set(U256::zero());
    }

    // ========== Query Functions ==========

    pub fn stable_token(&self) -> Address {
        match self.stable_token.get() {
            Some(token) => token,
            None => self.env().revert(DefenseError::InvalidConfig),
        }
    }

    pub fn volatile_token(&self) -> Address {
        match self.volatile_token.get() {
            Some(token) => token,
            None => self.env().revert(DefenseError::InvalidConfig),
        }
    }

    pub fn volatile_reserve(&self) -> U256 {
        self.volatile_reserve.get_or_default()
    }

    pub fn stable_proceeds(&self) -> U256 {
        self.stable_proceeds.get_or_default()
    }

    // ========== Token Movements ==========

    /// Pull `amount` stable from `owner` (needs a prior CEP-18 approval)
    pub fn pull_stable(&self, owner: Address, amount: U256) {
        let vault = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), self.stable_token())
            .transfer_from(owner, vault, amount);
    }

    /// Pay out credited volatile
    pub fn pay_volatile(&self, recipient: Address, amount: U256) {
        Cep18TokenContractRef::new(self.env(), self.volatile_token()).transfer(recipient, amount);
    }

    /// Pull volatile from `provider` into the conversion reserve
    ///
    /// Returns the new reserve.
    pub fn fund_reserve(&mut self, provider: Address, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(DefenseError::InvalidAmount);
        }
        let reserve = match self.volatile_reserve().checked_add(amount) {
            Some(reserve) => reserve,
            None => self.env().revert(DefenseError::ArithmeticOverflow),
        };
        self.volatile_reserve.set(reserve);

        let vault = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), self.volatile_token())
            .transfer_from(provider, vault, amount);
        reserve
    }

    /// Return unused reserve to `recipient`
    ///
    /// Returns the remaining reserve.
    pub fn release_reserve(&mut self, recipient: Address, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(DefenseError::InvalidAmount);
        }
        let reserve = match self.volatile_reserve().checked_sub(amount) {
            Some(reserve) => reserve,
            None => self.env().revert(DefenseError::InsufficientReserve),
        };
        self.volatile_reserve.set(reserve);
        self.pay_volatile(recipient, amount);
        reserve
    }

    /// Send all conversion proceeds to `recipient`
    pub fn claim_proceeds(&mut self, recipient: Address) -> U256 {
        let amount = self.stable_proceeds();
        if amount.is_zero() {
            self.env().revert(DefenseError::NothingToWithdraw);
        }
        self.stable_proceeds.set(U256::zero());
        Cep18TokenContractRef::new(self.env(), self.stable_token()).transfer(recipient, amount);
        amount
    }
}

impl Custody {
    /// Swap the pool against the reserve: the reserve gives up
    /// `volatile_acquired`, the pool's `stable_consumed` becomes proceeds.
    pub fn commit_conversion(
        &mut self,
        stable_consumed: U256,
        volatile_acquired: U256,
    ) -> Result<(), DefenseError> {
        let reserve = self
            .volatile_reserve
            .get_or_default()
            .checked_sub(volatile_acquired)
            .ok_or(DefenseError::InsufficientReserve)?;
        let proceeds = self
            .stable_proceeds
            .get_or_default()
            .checked_add(stable_consumed)
            .ok_or(DefenseError::ArithmeticOverflow)?;

        self.volatile_reserve.set(reserve);
        self.stable_proceeds.set(proceeds);
        Ok(())
    }
}
