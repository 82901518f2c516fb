use thiserror::Error;

/// Errors raised by the fixed-point math routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Result does not fit the target integer width.
    #[error("arithmetic overflow")]
    Overflow,
    /// Subtraction went below zero.
    #[error("arithmetic underflow")]
    Underflow,
    /// Tick outside `[MIN_TICK, MAX_TICK]`.
    #[error("tick {0} out of bounds")]
    TickOutOfBounds(i32),
    /// Square root price outside `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
    #[error("sqrt price out of bounds")]
    SqrtPriceOutOfBounds,
    /// Price must be strictly positive.
    #[error("price must be positive")]
    NonPositivePrice,
    /// Lower bound of a range is not below its upper bound.
    #[error("invalid range [{lower}, {upper}]")]
    InvalidRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
    },
    /// Value is not a multiple of the tick spacing.
    #[error("tick {tick} not aligned to spacing {spacing}")]
    UnalignedTick {
        /// Offending tick.
        tick: i32,
        /// Pool tick spacing.
        spacing: i32,
    },
    /// Basis points above 10 000.
    #[error("basis points {0} exceed 10000")]
    BpsOutOfRange(u32),
}
