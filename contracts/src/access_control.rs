//! Access Control
//!
//! Role table shared by the defense vault and the price feed (mounted as a
//! submodule in both).
//!
//! Roles:
//! - ADMIN: grants/revokes every role, configuration, force execute, re-arm
//! - GUARDIAN: emergency stop
//! - FEEDER: posts oracle prices
//!
//! ADMIN satisfies every role check. The last admin can never be removed.

use odra::prelude::*;
use crate::errors::DefenseError;

/// Role constants (u8 for efficient storage)
pub const ROLE_ADMIN: u8 = 0;
pub const ROLE_GUARDIAN: u8 = 1;
pub const ROLE_FEEDER: u8 = 2;

/// Number of defined roles
const ROLE_COUNT: u8 = 3;

/// Access Control submodule
#[odra::module]
pub struct AccessControl {
    /// Role assignments: (role, account) -> bool
    roles: Mapping<(u8, Address), bool>,
    /// Number of accounts with each role
    role_count: Mapping<u8, u32>,
}

#[odra::module]
impl AccessControl {
    /// Grant the admin role to the initial admin
    pub fn init(&mut self, initial_admin: Address) {
        if self.get_role_member_count(ROLE_ADMIN) > 0 {
            self.env().revert(DefenseError::InvalidConfig);
        }
        self.set_role_internal(ROLE_ADMIN, initial_admin, true);
    }

    // ========== Role Query Functions ==========

    /// Check if account has a specific role
    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.roles.get(&(role_id, account)).unwrap_or(false)
    }

    /// Check if caller has a specific role
    pub fn caller_has_role(&self, role_id: u8) -> bool {
        self.has_role(role_id, self.env().caller())
    }

    /// Get the number of accounts with a role
    pub fn get_role_member_count(&self, role_id: u8) -> u32 {
        self.role_count.get(&role_id).unwrap_or(0)
    }

    // ========== Role Management Functions ==========

    /// Grant a role to an account (admin only)
    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();
        if role_id >= ROLE_COUNT {
            self.env().revert(DefenseError::InvalidConfig);
        }

        if self.has_role(role_id, account) {
            return;
        }

        self.set_role_internal(role_id, account, true);
    }

    /// Revoke a role from an account (admin only)
    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_admin();

        if !self.has_role(role_id, account) {
            return;
        }

        // Prevent revoking the last admin
        if role_id == ROLE_ADMIN && self.get_role_member_count(ROLE_ADMIN) <= 1 {
            self.env().revert(DefenseError::InvalidConfig);
        }

        self.set_role_internal(role_id, account, false);
    }

    // ========== Modifier-like Functions ==========

    /// Revert if caller doesn't have the specified role (or admin)
    pub fn require_role(&self, role_id: u8) {
        if !self.caller_has_role(role_id) && !self.caller_has_role(ROLE_ADMIN) {
            self.env().revert(DefenseError::Unauthorized);
        }
    }

    /// Revert if caller doesn't have admin role
    pub fn require_admin(&self) {
        self.require_role(ROLE_ADMIN);
    }

    /// Revert if caller doesn't have guardian or admin role
    pub fn require_guardian(&self) {
        self.require_role(ROLE_GUARDIAN);
    }

    /// Revert if caller doesn't have feeder or admin role
    pub fn require_feeder(&self) {
        self.require_role(ROLE_FEEDER);
    }

    // ========== Internal Functions ==========

    fn set_role_internal(&mut self, role_id: u8, account: Address, value: bool) {
        let had_role = self.roles.get(&(role_id, account)).unwrap_or(false);

        self.roles.set(&(role_id, account), value);

        let current_count = self.role_count.get(&role_id).unwrap_or(0);
        if value && !had_role {
            self.role_count.set(&role_id, current_count + 1);
        } else if !value && had_role && current_count > 0 {
            self.role_count.set(&role_id, current_count - 1);
        }
    }
}
