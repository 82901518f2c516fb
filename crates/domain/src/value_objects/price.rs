use crate::error::MathError;
use crate::math::price_tick::{sqrt_price_x96_to_price, tick_to_price};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Human-readable price of token0 denominated in token1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    pub fn from_sqrt_price_x96(sqrt_price_x96: U256) -> Result<Self, MathError> {
        sqrt_price_x96_to_price(sqrt_price_x96).map(Self::new)
    }

    pub fn from_tick(tick: i32) -> Result<Self, MathError> {
        tick_to_price(tick).map(Self::new)
    }

    pub fn invert(&self) -> Self {
        if self.value.is_zero() {
            return Self {
                value: Decimal::ZERO,
            };
        }
        Self {
            value: Decimal::ONE / self.value,
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value.round_dp(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Q96;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_from_sqrt() {
        assert_eq!(Price::from_sqrt_price_x96(Q96).unwrap().value, dec!(1));
        assert!(Price::from_sqrt_price_x96(U256::zero()).is_err());
    }

    #[test]
    fn test_invert() {
        let p = Price::new(dec!(4));
        assert_eq!(p.invert().value, dec!(0.25));
        assert_eq!(Price::new(Decimal::ZERO).invert().value, Decimal::ZERO);
    }
}
