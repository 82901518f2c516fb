use crate::error::MathError;
use crate::math::tick_math::{MAX_TICK, MIN_TICK, get_sqrt_ratio_at_tick, usable_tick_bounds};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A half-open tick interval `[lower, upper)` aligned to a pool's spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Validates ordering, bounds and alignment to `spacing`.
    pub fn new(lower: i32, upper: i32, spacing: i32) -> Result<Self, MathError> {
        if lower >= upper || lower < MIN_TICK || upper > MAX_TICK {
            return Err(MathError::InvalidRange { lower, upper });
        }
        for tick in [lower, upper] {
            if spacing <= 0 || tick % spacing != 0 {
                return Err(MathError::UnalignedTick { tick, spacing });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Widest aligned range for `spacing`.
    pub fn full_range(spacing: i32) -> Result<Self, MathError> {
        let (lower, upper) = usable_tick_bounds(spacing);
        Self::new(lower, upper, spacing)
    }

    /// Range of `half_width` ticks either side of `center`, snapped outwards
    /// to `spacing` and clamped to the usable bounds.
    pub fn centered(center: i32, half_width: i32, spacing: i32) -> Result<Self, MathError> {
        if spacing <= 0 {
            return Err(MathError::UnalignedTick {
                tick: center,
                spacing,
            });
        }
        let (min, max) = usable_tick_bounds(spacing);
        let half_width = half_width.max(spacing);
        let lower = (center.saturating_sub(half_width)).div_euclid(spacing) * spacing;
        let upper_raw = center.saturating_add(half_width);
        let upper = (upper_raw + spacing - 1).div_euclid(spacing) * spacing;
        Self::new(lower.max(min), upper.min(max), spacing)
    }

    #[must_use]
    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick < self.upper
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    /// Sqrt ratios at the lower and upper bound.
    pub fn sqrt_ratios(&self) -> Result<(U256, U256), MathError> {
        Ok((
            get_sqrt_ratio_at_tick(self.lower)?,
            get_sqrt_ratio_at_tick(self.upper)?,
        ))
    }
}

impl std::fmt::Display for TickRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(TickRange::new(-120, 120, 60).is_ok());
        assert_eq!(
            TickRange::new(120, 120, 60),
            Err(MathError::InvalidRange {
                lower: 120,
                upper: 120
            })
        );
        assert_eq!(
            TickRange::new(-100, 120, 60),
            Err(MathError::UnalignedTick {
                tick: -100,
                spacing: 60
            })
        );
    }

    #[test]
    fn test_full_range() {
        let range = TickRange::full_range(60).unwrap();
        assert_eq!((range.lower, range.upper), (-887_220, 887_220));
        assert!(range.contains(0));
        assert!(!range.contains(887_220));
    }

    #[test]
    fn test_centered_snaps_outwards() {
        let range = TickRange::centered(10, 100, 60).unwrap();
        assert_eq!((range.lower, range.upper), (-120, 120));
        assert!(range.contains(10));

        let clamped = TickRange::centered(887_000, 5_000, 60).unwrap();
        assert_eq!(clamped.upper, 887_220);
    }
}
