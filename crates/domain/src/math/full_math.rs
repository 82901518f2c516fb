use crate::error::MathError;
use primitive_types::{U256, U512};

/// Computes `floor(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Computes `ceil(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;
    if (a.full_mul(b) % U512::from(denominator)).is_zero() {
        Ok(result)
    } else {
        result.checked_add(U256::one()).ok_or(MathError::Overflow)
    }
}

/// Computes `ceil(a / b)`.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// Narrows to `u128`, failing instead of truncating.
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_does_not_overflow_intermediate() {
        let a = U256::MAX;
        let b = U256::from(2u8);
        let result = mul_div(a, b, U256::from(4u8)).unwrap();
        assert_eq!(result, U256::MAX / 2);
    }

    #[test]
    fn test_mul_div_rounding() {
        let seven = U256::from(7u8);
        let two = U256::from(2u8);
        assert_eq!(mul_div(seven, U256::one(), two).unwrap(), U256::from(3u8));
        assert_eq!(
            mul_div_rounding_up(seven, U256::one(), two).unwrap(),
            U256::from(4u8)
        );
        assert_eq!(
            mul_div_rounding_up(U256::from(8u8), U256::one(), two).unwrap(),
            U256::from(4u8)
        );
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(U256::one(), U256::one(), U256::zero()),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            mul_div(U256::MAX, U256::MAX, U256::one()),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_to_u128() {
        assert_eq!(to_u128(U256::from(42u8)).unwrap(), 42);
        assert_eq!(
            to_u128(U256::from(u128::MAX) + U256::one()),
            Err(MathError::Overflow)
        );
    }
}
