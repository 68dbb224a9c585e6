//! Defense Line Contracts
//!
//! Casper-native stable-to-volatile "buy the dip" vault. Depositors pool a
//! stable asset; once the volatile asset trades at or below a preset defense
//! line (a fraction of a reference price) the pool converts in one shot and
//! every depositor receives a pro-rata share of the volatile asset.
//!
//! ## Architecture
//!
//! - **DefenseVault**: Entry points, events, role checks (contract)
//! - **PriceFeed**: Push oracle posting volatile/USD readings (contract)
//! - **Ledger**: Depositor balances and pool totals (submodule)
//! - **AccessControl**: Admin / guardian / feeder roles (submodule)
//! - **Custody**: CEP-18 stable and volatile holdings, conversion reserve (submodule)
//! - **DefenseEngine**: `Monitoring -> Triggered -> Executed` state machine (pure)
//! - **OracleAdapter**: Oracle read and staleness/validity checks
//! - **FixedPoint**: Checked decimal arithmetic for quotes and pro-rata shares
//!
//! ## Atomicity
//!
//! Each entry point is one transaction. Engine transitions are computed on a
//! copy of the state and stored only on success; a revert discards every
//! write, so a conversion is either fully applied or not at all.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod events;
pub mod fixed_point;
pub mod defense_engine;
pub mod oracle_adapter;

// Submodules
pub mod access_control;
pub mod ledger;
pub mod custody;

// Contract modules
pub mod defense_vault;
pub mod price_feed;
