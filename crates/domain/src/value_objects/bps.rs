use crate::error::MathError;
use crate::math::full_math::mul_div;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Basis points in one whole.
pub const BPS_SCALE: u16 = 10_000;

/// A ratio expressed in basis points, bounded by 100%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Bps(u16);

impl Bps {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BPS_SCALE);

    pub fn new(bps: u16) -> Result<Self, MathError> {
        if bps > BPS_SCALE {
            return Err(MathError::BpsOutOfRange(u32::from(bps)));
        }
        Ok(Self(bps))
    }

    /// Clamps `bps` to 10 000.
    #[must_use]
    pub const fn saturating(bps: u16) -> Self {
        if bps > BPS_SCALE {
            Self(BPS_SCALE)
        } else {
            Self(bps)
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// `floor(amount * bps / 10_000)`.
    pub fn apply(self, amount: U256) -> Result<U256, MathError> {
        mul_div(amount, U256::from(self.0), U256::from(BPS_SCALE))
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(BPS_SCALE)
    }

    /// True when `part / whole > self`, compared without division so the
    /// boundary `part / whole == self` is not exceeded. A zero `whole` with
    /// a non-zero `part` always exceeds.
    pub fn is_exceeded_by(self, part: U256, whole: U256) -> bool {
        let scaled_part = part.full_mul(U256::from(BPS_SCALE));
        let scaled_whole = whole.full_mul(U256::from(self.0));
        scaled_part > scaled_whole
    }
}

impl TryFrom<u16> for Bps {
    type Error = MathError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bps> for u16 {
    fn from(value: Bps) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bps_bounds() {
        assert!(Bps::new(10_000).is_ok());
        assert_eq!(Bps::new(10_001), Err(MathError::BpsOutOfRange(10_001)));
        assert_eq!(Bps::saturating(12_000), Bps::MAX);
    }

    #[test]
    fn test_apply_truncates() {
        let fee = Bps::new(30).unwrap();
        assert_eq!(fee.apply(U256::from(1_000u64)).unwrap(), U256::from(3u64));
        assert_eq!(fee.apply(U256::from(333u64)).unwrap(), U256::zero());
        assert_eq!(fee.as_decimal(), dec!(0.003));
    }

    #[test]
    fn test_is_exceeded_by_boundary() {
        let cap = Bps::new(999).unwrap();
        let whole = U256::from(10_000u64);
        assert!(!cap.is_exceeded_by(U256::from(999u64), whole));
        assert!(cap.is_exceeded_by(U256::from(1_000u64), whole));
        assert!(!cap.is_exceeded_by(U256::zero(), U256::zero()));
        assert!(cap.is_exceeded_by(U256::one(), U256::zero()));
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(Bps::try_from(500u16).unwrap().get(), 500);
        assert!(Bps::try_from(20_000u16).is_err());
    }
}
