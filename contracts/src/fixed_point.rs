//! Overflow-checked fixed-point arithmetic for the defense engine.
//!
//! All amounts are integer minor units:
//! - stable asset: 6 decimals
//! - volatile asset: 18 decimals
//! - oracle price: 8 decimals (quote units per 1 whole volatile unit)
//!
//! Every function returns `None` on overflow or division by zero; callers map
//! that to `DefenseError::ArithmeticOverflow` before anything is written.

use odra::casper_types::U256;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u32 = 10_000;

/// Default defense ratio (80% of the reference price)
pub const DEFAULT_DEFENSE_RATIO_BPS: u32 = 8_000;

/// Stable asset precision
pub const STABLE_DECIMALS: u8 = 6;

/// Volatile asset precision
pub const VOLATILE_DECIMALS: u8 = 18;

/// Oracle price precision
pub const PRICE_DECIMALS: u8 = 8;

/// Largest exponent accepted for decimal rescaling; 10^77 is the last power of ten in U256
const MAX_DECIMALS_EXPONENT: u8 = 77;

/// `a * b / denominator`, rounded down
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    a.checked_mul(b)?.checked_div(denominator)
}

/// 10^exponent
pub fn pow10(exponent: u8) -> Option<U256> {
    if exponent > MAX_DECIMALS_EXPONENT {
        return None;
    }
    Some(U256::exp10(exponent as usize))
}

/// Re-express `amount` from `from_decimals` to `to_decimals`, rounding down
pub fn rescale(amount: U256, from_decimals: u8, to_decimals: u8) -> Option<U256> {
    if to_decimals >= from_decimals {
        amount.checked_mul(pow10(to_decimals - from_decimals)?)
    } else {
        amount.checked_div(pow10(from_decimals - to_decimals)?)
    }
}

/// Defense line derived from a reference price
///
/// # Arguments
/// * `reference_price` - Price captured at init or re-arm
/// * `defense_ratio_bps` - Fraction of the reference price, in bps
pub fn defense_line_price(reference_price: U256, defense_ratio_bps: u32) -> Option<U256> {
    mul_div(
        reference_price,
        U256::from(defense_ratio_bps),
        U256::from(BPS_SCALE),
    )
}

/// Volatile amount purchasable with `stable_amount` at `price`
///
/// volatile = stable * 10^(volatile_dec - stable_dec) * 10^price_dec / price
///
/// The multiplication happens before the division so a whole pool is quoted
/// with a single rounding step.
pub fn quote_volatile(
    stable_amount: U256,
    price: U256,
    price_decimals: u8,
    stable_decimals: u8,
    volatile_decimals: u8,
) -> Option<U256> {
    if price.is_zero() {
        return None;
    }
    let stable_in_volatile_units = rescale(stable_amount, stable_decimals, volatile_decimals)?;
    mul_div(stable_in_volatile_units, pow10(price_decimals)?, price)
}

/// Share of `total` owed to a `part` of `whole`, rounded down
///
/// `pro_rata(100, 300, 1000) == 30`. The rounding remainder across all
/// shares is the conversion dust.
pub fn pro_rata(total: U256, part: U256, whole: U256) -> Option<U256> {
    if part > whole {
        return None;
    }
    mul_div(total, part, whole)
}
