use crate::pool::InMemoryPool;
use primitive_types::U256;
use swapsweep_domain::math::Q96;
use swapsweep_domain::math::full_math::mul_div;
use swapsweep_protocols::error::OracleError;
use swapsweep_protocols::oracle::{VolatilityEstimate, VolatilityOracle};
use swapsweep_protocols::pool::ConcentratedPool;

/// Default trailing window: one day.
pub const DEFAULT_WINDOW_SECONDS: u32 = 86_400;

/// Derives volatility inputs from the fees an [`InMemoryPool`] charged over
/// a trailing window and the value of its in-range liquidity.
#[derive(Debug, Clone)]
pub struct FeeVolatilityOracle {
    pool: InMemoryPool,
    window_seconds: u32,
}

impl FeeVolatilityOracle {
    #[must_use]
    pub fn new(pool: InMemoryPool) -> Self {
        Self {
            pool,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }

    #[must_use]
    pub fn with_window(mut self, window_seconds: u32) -> Self {
        self.window_seconds = window_seconds;
        self
    }
}

impl VolatilityOracle for FeeVolatilityOracle {
    fn estimate(&self) -> Result<VolatilityEstimate, OracleError> {
        if self.window_seconds == 0 {
            return Err(OracleError::EmptyWindow);
        }
        let slot = self.pool.slot0()?;
        let liquidity = U256::from(self.pool.liquidity()?);

        // Virtual reserves at the current price, both legs in token1:
        // y = L * sqrtP and x * P = L * sqrtP.
        let tick_tvl = mul_div(
            liquidity.saturating_mul(U256::from(2u8)),
            slot.sqrt_price_x96,
            Q96,
        )?;

        let (fees0, fees1) = self.pool.fees_since(self.window_seconds)?;
        let fees0_in_token1 = mul_div(
            mul_div(fees0, slot.sqrt_price_x96, Q96)?,
            slot.sqrt_price_x96,
            Q96,
        )?;

        Ok(VolatilityEstimate {
            fee_value: fees0_in_token1.saturating_add(fees1),
            tick_tvl,
            window_seconds: self.window_seconds,
            fee_pips: self.pool.fee_pips(),
        })
    }
}
