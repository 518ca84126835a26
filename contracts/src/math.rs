use soroban_sdk::{Env, I256};

use crate::types::Error;

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Fixed-point scale of a wrapper's exchange rate (underlying per share).
pub const RATE_SCALE: i128 = 1_000_000_000_000_000_000;

/// `a * b / d`, rounded toward zero. The product is taken in 256 bits when
/// it does not fit in `i128`; fails only on a non-positive divisor or a
/// quotient outside `i128`.
pub fn mul_div_floor(env: &Env, a: i128, b: i128, d: i128) -> Result<i128, Error> {
    if d <= 0 {
        return Err(Error::ArithmeticError);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / d);
    }
    I256::from_i128(env, a)
        .mul(&I256::from_i128(env, b))
        .div(&I256::from_i128(env, d))
        .to_i128()
        .ok_or(Error::ArithmeticError)
}

pub fn bps_of(env: &Env, amount: i128, bps: u32) -> Result<i128, Error> {
    mul_div_floor(env, amount, bps as i128, BPS_DENOMINATOR as i128)
}

/// Smallest output accepted for a swap quoted at `quoted`.
pub fn min_out(env: &Env, quoted: i128, slippage_bps: u32) -> Result<i128, Error> {
    let kept = BPS_DENOMINATOR
        .checked_sub(slippage_bps)
        .ok_or(Error::InvalidConfig)?;
    bps_of(env, quoted, kept)
}

pub fn pow10(decimals: u32) -> Result<i128, Error> {
    10i128.checked_pow(decimals).ok_or(Error::ArithmeticError)
}
