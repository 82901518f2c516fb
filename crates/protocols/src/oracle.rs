use crate::error::OracleError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Fee and liquidity readings over a trailing window, in token1 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    /// Fees earned by in-range liquidity over the window.
    pub fee_value: U256,
    /// Virtual value of the in-range liquidity.
    pub tick_tvl: U256,
    pub window_seconds: u32,
    /// Pool fee tier in hundredths of a basis point.
    pub fee_pips: u32,
}

impl VolatilityEstimate {
    /// `tick_tvl * window_seconds`; zero until liquidity is present.
    pub fn denominator(&self) -> U256 {
        self.tick_tvl.saturating_mul(U256::from(self.window_seconds))
    }
}

/// Source of the realized-volatility inputs used to size ranges.
pub trait VolatilityOracle: Send + Sync + Debug {
    fn estimate(&self) -> Result<VolatilityEstimate, OracleError>;
}
