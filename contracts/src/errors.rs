//! Protocol error definitions.

use odra::prelude::*;

/// Defense line protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DefenseError {
    // Ledger errors (1xx)
    InvalidAmount = 100,
    NothingToWithdraw = 101,
    ShareAlreadyRecorded = 102,
    LedgerMismatch = 104,

    // State machine errors (2xx)
    EngineFrozen = 200,
    AlreadyTriggered = 201,
    AlreadyExecuted = 202,
    NotTriggeredYet = 203,
    NotExecutedYet = 204,

    // Oracle errors (3xx)
    StaleOracleData = 300,
    InvalidOracleReading = 301,
    OracleUnavailable = 302,

    // Access control errors (4xx)
    Unauthorized = 400,

    // Arithmetic errors (5xx)
    ArithmeticOverflow = 500,

    // Custody errors (6xx)
    InsufficientReserve = 600,

    // Configuration errors (9xx)
    InvalidConfig = 900,
}

impl DefenseError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Ledger
            DefenseError::InvalidAmount => "Amount must be greater than zero",
            DefenseError::NothingToWithdraw => "Nothing to withdraw",
            DefenseError::ShareAlreadyRecorded => "Conversion share already recorded for this epoch",
            DefenseError::LedgerMismatch => "Depositor balances do not sum to the pool total",

            // State machine
            DefenseError::EngineFrozen => "Defense line already triggered: deposits closed",
            DefenseError::AlreadyTriggered => "Defense line already triggered",
            DefenseError::AlreadyExecuted => "Conversion already executed",
            DefenseError::NotTriggeredYet => "Defense line not triggered yet",
            DefenseError::NotExecutedYet => "Conversion not executed yet",

            // Oracle
            DefenseError::StaleOracleData => "Oracle price stale",
            DefenseError::InvalidOracleReading => "Oracle reading invalid",
            DefenseError::OracleUnavailable => "Oracle price unavailable",

            // Access control
            DefenseError::Unauthorized => "Unauthorized: caller lacks the required role",

            // Arithmetic
            DefenseError::ArithmeticOverflow => "Fixed-point arithmetic overflow",

            // Custody
            DefenseError::InsufficientReserve => "Volatile reserve cannot cover the conversion",

            // Config
            DefenseError::InvalidConfig => "Invalid configuration parameter",
        }
    }
}

impl core::fmt::Display for DefenseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<DefenseError> for OdraError {
    fn from(error: DefenseError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}

/// Unwraps a ledger or engine result, reverting the whole transaction on error.
pub fn ok_or_revert<T>(env: &odra::ContractEnv, result: Result<T, DefenseError>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => env.revert(error),
    }
}
