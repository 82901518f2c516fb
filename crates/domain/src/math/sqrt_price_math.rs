use super::full_math::{div_rounding_up, mul_div, mul_div_rounding_up};
use super::{Q96, RESOLUTION};
use crate::error::MathError;
use primitive_types::U256;

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

/// Amount of token0 between two prices for `liquidity`.
///
/// `L * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_a) * sqrt(P_b))`
pub fn get_amount0_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    if lower.is_zero() {
        return Err(MathError::NonPositivePrice);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Amount of token1 between two prices for `liquidity`.
///
/// `L * (sqrt(P_b) - sqrt(P_a))`
pub fn get_amount1_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a, sqrt_ratio_b);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// Next sqrt price after adding `amount` of token0, rounding up so the price
/// never moves further than the input pays for.
fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, MathError> {
    if amount.is_zero() {
        return Ok(sqrt_price);
    }
    let numerator1 = U256::from(liquidity) << RESOLUTION;

    if let Some(product) = amount.checked_mul(sqrt_price)
        && let Some(denominator) = numerator1.checked_add(product)
    {
        return mul_div_rounding_up(numerator1, sqrt_price, denominator);
    }

    let denominator = (numerator1 / sqrt_price)
        .checked_add(amount)
        .ok_or(MathError::Overflow)?;
    div_rounding_up(numerator1, denominator)
}

/// Next sqrt price after adding `amount` of token1, rounding down.
fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, MathError> {
    let quotient = mul_div(amount, Q96, U256::from(liquidity))?;
    sqrt_price.checked_add(quotient).ok_or(MathError::Overflow)
}

/// Next sqrt price given an exact input amount.
///
/// `zero_for_one` selects token0 as the input (price moves down).
pub fn get_next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if sqrt_price.is_zero() {
        return Err(MathError::NonPositivePrice);
    }
    if liquidity == 0 {
        return Err(MathError::DivisionByZero);
    }
    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price, liquidity, amount_in)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price, liquidity, amount_in)
    }
}
