use super::full_math::{mul_div, mul_div_rounding_up};
use super::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
};
use crate::error::MathError;
use primitive_types::U256;

/// Fee denominator: fees are expressed in hundredths of a basis point.
pub const FEE_PIPS_SCALE: u32 = 1_000_000;

/// Outcome of a single exact-input swap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Price after the step.
    pub sqrt_price_next: U256,
    /// Input consumed, excluding fee.
    pub amount_in: U256,
    /// Output produced.
    pub amount_out: U256,
    /// Fee charged on the input.
    pub fee_amount: U256,
}

/// Swaps `amount_remaining` of input within one liquidity segment, stopping
/// at `sqrt_price_target` if the input is large enough to reach it.
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_pips: u32,
) -> Result<SwapStep, MathError> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let fee_complement = U256::from(FEE_PIPS_SCALE - fee_pips);

    let amount_less_fee = mul_div(amount_remaining, fee_complement, U256::from(FEE_PIPS_SCALE))?;
    let amount_to_target = if zero_for_one {
        get_amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)?
    } else {
        get_amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)?
    };

    let sqrt_price_next = if amount_less_fee >= amount_to_target {
        sqrt_price_target
    } else {
        get_next_sqrt_price_from_input(sqrt_price_current, liquidity, amount_less_fee, zero_for_one)?
    };
    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, amount_out) = if zero_for_one {
        let amount_in = if reached_target {
            amount_to_target
        } else {
            get_amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, true)?
        };
        let amount_out = get_amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, false)?;
        (amount_in, amount_out)
    } else {
        let amount_in = if reached_target {
            amount_to_target
        } else {
            get_amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, true)?
        };
        let amount_out = get_amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, false)?;
        (amount_in, amount_out)
    };

    // When the target was not reached the whole remainder is consumed and
    // whatever is left beyond amount_in is the fee.
    let fee_amount = if reached_target {
        mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
    } else {
        amount_remaining.saturating_sub(amount_in)
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
