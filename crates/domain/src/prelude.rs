//! Prelude module for convenient imports.
//!
//! ```rust
//! use swapsweep_domain::prelude::*;
//! ```

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::MathError;
pub use crate::math::full_math::{mul_div, mul_div_rounding_up};
pub use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio,
};
pub use crate::math::{Q96, RESOLUTION};
pub use crate::token::{Address, Token};
pub use crate::value_objects::bps::{BPS_SCALE, Bps};
pub use crate::value_objects::price::Price;
pub use crate::value_objects::tick_range::TickRange;
pub use primitive_types::U256;
