//! Core domain types and fixed-point math for the SwapSweep vault.
//!
//! This crate contains everything that does not depend on a particular pool
//! or vault instance:
//! - Q64.96 fixed-point arithmetic and tick math
//! - Liquidity ↔ token amount conversions for a single range
//! - Swap step math used by pool implementations
//! - Value objects such as [`Bps`](value_objects::bps::Bps) and
//!   [`TickRange`](value_objects::tick_range::TickRange)
//! - The injectable [`Clock`](clock::Clock)

/// Injectable wall clock.
pub mod clock;
/// Math error type.
pub mod error;
/// Fixed-point and concentrated liquidity math.
pub mod math;
/// Token identities.
pub mod token;
/// Small validated value types.
pub mod value_objects;

/// Prelude module for convenient imports.
pub mod prelude;
