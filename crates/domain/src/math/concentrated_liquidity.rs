//! Liquidity ↔ token amount conversions for a single price range.
//!
//! All functions take Q64.96 square-root prices and round down, so a
//! position sized with them never asks for more tokens than offered.

use super::Q96;
use super::full_math::{mul_div, to_u128};
use super::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use crate::error::MathError;
use primitive_types::U256;

fn sorted(a: U256, b: U256) -> Result<(U256, U256), MathError> {
    let (lower, upper) = if a > b { (b, a) } else { (a, b) };
    if lower.is_zero() {
        return Err(MathError::NonPositivePrice);
    }
    Ok((lower, upper))
}

/// Liquidity for a given amount of token0 and price range.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b)?;
    if lower == upper {
        return Err(MathError::DivisionByZero);
    }
    let intermediate = mul_div(lower, upper, Q96)?;
    to_u128(mul_div(amount0, intermediate, upper - lower)?)
}

/// Liquidity for a given amount of token1 and price range.
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b)?;
    if lower == upper {
        return Err(MathError::DivisionByZero);
    }
    to_u128(mul_div(amount1, Q96, upper - lower)?)
}

/// Maximum liquidity that `amount0` and `amount1` can buy in
/// `[sqrt_ratio_a, sqrt_ratio_b]` at the current price.
pub fn get_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b)?;

    if sqrt_price <= lower {
        get_liquidity_for_amount0(lower, upper, amount0)
    } else if sqrt_price < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price, upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amount1)
    }
}

/// Token amounts represented by `liquidity` in `[sqrt_ratio_a, sqrt_ratio_b]`
/// at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
) -> Result<(U256, U256), MathError> {
    amounts_for_liquidity(sqrt_price, sqrt_ratio_a, sqrt_ratio_b, liquidity, false)
}

/// Like [`get_amounts_for_liquidity`] but rounding up: what the pool charges
/// to mint `liquidity`.
pub fn get_amounts_for_liquidity_rounding_up(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
) -> Result<(U256, U256), MathError> {
    amounts_for_liquidity(sqrt_price, sqrt_ratio_a, sqrt_ratio_b, liquidity, true)
}

fn amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<(U256, U256), MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b)?;

    if sqrt_price <= lower {
        Ok((
            get_amount0_delta(lower, upper, liquidity, round_up)?,
            U256::zero(),
        ))
    } else if sqrt_price < upper {
        Ok((
            get_amount0_delta(sqrt_price, upper, liquidity, round_up)?,
            get_amount1_delta(lower, sqrt_price, liquidity, round_up)?,
        ))
    } else {
        Ok((
            U256::zero(),
            get_amount1_delta(lower, upper, liquidity, round_up)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_ratio_at_tick;

    fn e18() -> U256 {
        U256::exp10(18)
    }

    #[test]
    fn test_get_liquidity() {
        // sqrt price 1 -> 2: 500 token0 or 1000 token1 buy L = 1000
        let a = Q96;
        let b = Q96 * U256::from(2u8);

        let l = get_liquidity_for_amount0(a, b, U256::from(500u64)).unwrap();
        assert_eq!(l, 1000);

        let l2 = get_liquidity_for_amount1(a, b, U256::from(1000u64)).unwrap();
        assert_eq!(l2, 1000);
    }

    #[test]
    fn test_full_range_at_parity() {
        let lower = get_sqrt_ratio_at_tick(-887_220).unwrap();
        let upper = get_sqrt_ratio_at_tick(887_220).unwrap();

        let liquidity = get_liquidity_for_amounts(Q96, lower, upper, e18(), e18()).unwrap();
        assert_eq!(liquidity, 10u128.pow(18));

        let (amount0, amount1) = get_amounts_for_liquidity(Q96, lower, upper, liquidity).unwrap();
        assert!(amount0 <= e18() && e18() - amount0 <= U256::one());
        assert!(amount1 <= e18() && e18() - amount1 <= U256::one());
    }

    #[test]
    fn test_single_sided_outside_range() {
        let lower = get_sqrt_ratio_at_tick(600).unwrap();
        let upper = get_sqrt_ratio_at_tick(1200).unwrap();

        // price below range: only token0 counts
        let liquidity = get_liquidity_for_amounts(Q96, lower, upper, e18(), U256::zero()).unwrap();
        assert!(liquidity > 0);
        let (amount0, amount1) = get_amounts_for_liquidity(Q96, lower, upper, liquidity).unwrap();
        assert!(amount0 <= e18());
        assert!(amount1.is_zero());
    }

    #[test]
    fn test_rounding_up_never_less() {
        let lower = get_sqrt_ratio_at_tick(-600).unwrap();
        let upper = get_sqrt_ratio_at_tick(600).unwrap();
        let down = get_amounts_for_liquidity(Q96, lower, upper, 123_456_789).unwrap();
        let up = get_amounts_for_liquidity_rounding_up(Q96, lower, upper, 123_456_789).unwrap();
        assert!(up.0 >= down.0 && up.1 >= down.1);
    }

    #[test]
    fn test_zero_price_rejected() {
        assert_eq!(
            get_liquidity_for_amount1(U256::zero(), Q96, e18()),
            Err(MathError::NonPositivePrice)
        );
    }
}
