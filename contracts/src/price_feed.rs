//! Price Feed Contract
//!
//! Push oracle for the reference asset price (volatile/USD, 8 decimals).
//! Authorized feeders post readings; the defense vault pulls the latest one
//! through `read_price`.
//!
//! The feed keeps only the latest reading. Freshness is judged by the
//! consumer, not here.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::access_control::{AccessControl, ROLE_FEEDER};
use crate::errors::DefenseError;
use crate::events::PriceUpdated;
use crate::fixed_point::PRICE_DECIMALS;
use crate::types::PriceReading;

/// Price Feed Contract
#[odra::module(events = [PriceUpdated])]
pub struct PriceFeed {
    /// Role table (admin, feeders)
    access: SubModule<AccessControl>,
    /// Decimals of posted prices
    decimals: Var<u8>,
    /// Latest reading
    latest: Var<PriceReading>,
    /// Number of readings accepted
    update_count: Var<u64>,
}

#[odra::module]
impl PriceFeed {
    /// Initialize the feed; the deployer becomes admin and feeder
    pub fn init(&mut self, decimals: Option<u8>) {
        let deployer = self.env().caller();
        self.access.init(deployer);
        self.access.grant_role(ROLE_FEEDER, deployer);
        self.decimals.set(decimals.unwrap_or(PRICE_DECIMALS));
        self.update_count.set(0);
    }

    // ========== Price Update Functions ==========

    /// Post a price observed now (feeder only)
    pub fn update_price(&mut self, price: U256) {
        let now = self.env().get_block_time();
        self.update_price_at(price, now);
    }

    /// Post a relayed price with its original observation time (feeder only)
    pub fn update_price_at(&mut self, price: U256, observed_at: u64) {
        self.access.require_feeder();

        if price.is_zero() {
            self.env().revert(DefenseError::InvalidOracleReading);
        }
        if observed_at > self.env().get_block_time() {
            self.env().revert(DefenseError::InvalidOracleReading);
        }
        // Never move the feed backwards in time
        if let Some(current) = self.latest.get() {
            if observed_at < current.observed_at {
                self.env().revert(DefenseError::StaleOracleData);
            }
        }

        let precision = self.get_decimals();
        self.latest.set(PriceReading {
            price,
            precision,
            observed_at,
        });
        self.update_count.set(self.update_count.get_or_default() + 1);

        self.env().emit_event(PriceUpdated {
            price,
            precision,
            observed_at,
            feeder: self.env().caller(),
        });
    }

    // ========== Query Functions ==========

    /// Latest reading, `None` until the first update
    pub fn read_price(&self) -> Option<PriceReading> {
        self.latest.get()
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(PRICE_DECIMALS)
    }

    pub fn get_update_count(&self) -> u64 {
        self.update_count.get_or_default()
    }

    // ========== Admin Functions ==========

    /// Authorize a feeder (admin only)
    pub fn grant_feeder(&mut self, feeder: Address) {
        self.access.grant_role(ROLE_FEEDER, feeder);
    }

    /// Remove a feeder (admin only)
    pub fn revoke_feeder(&mut self, feeder: Address) {
        self.access.revoke_role(ROLE_FEEDER, feeder);
    }

    pub fn is_feeder(&self, account: Address) -> bool {
        self.access.has_role(ROLE_FEEDER, account)
    }
}
