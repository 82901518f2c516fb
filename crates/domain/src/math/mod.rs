//! Fixed-point math for concentrated liquidity.
//!
//! Prices are carried as Q64.96 square roots, the same representation the
//! pool uses on the wire. Integer routines round explicitly; the `price_tick`
//! module offers lossy decimal conversions for display and range sizing.

use primitive_types::U256;

/// Liquidity ↔ token amounts inside a single range.
pub mod concentrated_liquidity;
/// 512-bit intermediate multiply/divide.
pub mod full_math;
/// Decimal tick/price conversions.
pub mod price_tick;
/// Token deltas and next-price computation.
pub mod sqrt_price_math;
/// Single swap step within one liquidity segment.
pub mod swap_math;
/// Exact tick ↔ sqrt price conversion.
pub mod tick_math;

/// Number of fractional bits of a Q64.96 value.
pub const RESOLUTION: usize = 96;

/// `2^96`, the fixed-point one.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q96_is_two_pow_96() {
        assert_eq!(Q96, U256::one() << RESOLUTION);
    }
}
