use super::Q96;
use super::full_math::mul_div;
use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, MathError> {
    let base = 1.0001f64;
    let price_f64 = base.powi(tick);
    Decimal::from_f64(price_f64).ok_or(MathError::Overflow)
}

/// Returns the tick corresponding to a given price.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice);
    }
    let price_f64 = price.to_f64().ok_or(MathError::Overflow)?;
    let base = 1.0001f64;
    let tick = price_f64.log(base);
    Ok(tick.round() as i32)
}

/// Lossy conversion used for display and volatility sizing only.
#[must_use]
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

/// Converts a Q64.96 sqrt price into a token1-per-token0 price.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256) -> Result<Decimal, MathError> {
    if sqrt_price_x96.is_zero() {
        return Err(MathError::NonPositivePrice);
    }
    // price * 2^96, keeps the square inside 256 bits
    let price_x96 = mul_div(sqrt_price_x96, sqrt_price_x96, Q96)?;
    let price = u256_to_f64(price_x96) / u256_to_f64(Q96);
    Decimal::from_f64(price).ok_or(MathError::Overflow)
}

/// Number of ticks spanned by a relative price move of `fraction`
/// (e.g. 0.05 for ±5%).
pub fn fraction_to_tick_width(fraction: Decimal) -> Result<i32, MathError> {
    if fraction < Decimal::ZERO {
        return Err(MathError::NonPositivePrice);
    }
    price_to_tick(Decimal::ONE + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_ratio_at_tick;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_to_price() {
        // Tick 0 -> Price 1
        let p = tick_to_price(0).unwrap();
        assert_eq!(p, Decimal::from(1));

        // Tick 100 -> 1.0001^100 ~= 1.010049
        let p100 = tick_to_price(100).unwrap();
        // Allow small error due to f64
        let expected = 1.01004966;
        let diff = (p100.to_f64().unwrap() - expected).abs();
        assert!(diff < 0.000001);
    }

    #[test]
    fn test_price_to_tick() {
        let t = price_to_tick(Decimal::from(1)).unwrap();
        assert_eq!(t, 0);

        let t2 = price_to_tick(Decimal::from_f64(1.01004966).unwrap()).unwrap();
        assert_eq!(t2, 100);

        assert_eq!(price_to_tick(dec!(0)), Err(MathError::NonPositivePrice));
    }

    #[test]
    fn test_sqrt_price_to_price() {
        assert_eq!(sqrt_price_x96_to_price(Q96).unwrap(), dec!(1));

        let p = sqrt_price_x96_to_price(get_sqrt_ratio_at_tick(6_932).unwrap()).unwrap();
        // 1.0001^6932 ~= 2.0
        assert!((p - dec!(2)).abs() < dec!(0.001));
    }

    #[test]
    fn test_fraction_to_tick_width() {
        // ln(1.05) / ln(1.0001) ~= 488
        assert_eq!(fraction_to_tick_width(dec!(0.05)).unwrap(), 488);
        assert_eq!(fraction_to_tick_width(dec!(0)).unwrap(), 0);
    }
}
