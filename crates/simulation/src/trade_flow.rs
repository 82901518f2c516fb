use crate::pool::{InMemoryPool, SwapResult};
use primitive_types::U256;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swapsweep_domain::token::Address;
use swapsweep_protocols::error::PoolError;
use tracing::info;

/// A single exact-input swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOrder {
    pub zero_for_one: bool,
    pub amount_in: U256,
}

/// Source of swap orders.
pub trait TradeFlow {
    fn next_order(&mut self) -> SwapOrder;
}

/// Alternates direction with a fixed size, the classic wash trade.
#[derive(Debug, Clone)]
pub struct AlternatingTradeFlow {
    pub amount_in: U256,
    next_zero_for_one: bool,
}

impl AlternatingTradeFlow {
    #[must_use]
    pub fn new(amount_in: U256) -> Self {
        Self {
            amount_in,
            next_zero_for_one: true,
        }
    }
}

impl TradeFlow for AlternatingTradeFlow {
    fn next_order(&mut self) -> SwapOrder {
        let zero_for_one = self.next_zero_for_one;
        self.next_zero_for_one = !zero_for_one;
        SwapOrder {
            zero_for_one,
            amount_in: self.amount_in,
        }
    }
}

/// Random direction and size, reproducible from a seed.
#[derive(Debug, Clone)]
pub struct RandomTradeFlow {
    rng: StdRng,
    pub min_amount: u128,
    pub max_amount: u128,
    /// Probability that an order sells token0.
    pub sell_probability: f64,
}

impl RandomTradeFlow {
    #[must_use]
    pub fn new(seed: u64, min_amount: u128, max_amount: u128) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            min_amount: min_amount.max(1),
            max_amount: max_amount.max(min_amount.max(1)),
            sell_probability: 0.5,
        }
    }

    /// Biases the flow towards selling (`> 0.5`) or buying token0.
    #[must_use]
    pub fn with_sell_probability(mut self, probability: f64) -> Self {
        self.sell_probability = probability.clamp(0.0, 1.0);
        self
    }
}

impl TradeFlow for RandomTradeFlow {
    fn next_order(&mut self) -> SwapOrder {
        SwapOrder {
            zero_for_one: self.rng.random_bool(self.sell_probability),
            amount_in: U256::from(self.rng.random_range(self.min_amount..=self.max_amount)),
        }
    }
}

/// Aggregate of a [`run_trades`] session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeSummary {
    pub swaps: usize,
    pub volume0: U256,
    pub volume1: U256,
    pub fees0: U256,
    pub fees1: U256,
    pub final_tick: i32,
}

impl TradeSummary {
    fn record(&mut self, zero_for_one: bool, result: &SwapResult) {
        self.swaps += 1;
        if zero_for_one {
            self.volume0 = self.volume0.saturating_add(result.amount_in);
            self.fees0 = self.fees0.saturating_add(result.fee_amount);
        } else {
            self.volume1 = self.volume1.saturating_add(result.amount_in);
            self.fees1 = self.fees1.saturating_add(result.fee_amount);
        }
        self.final_tick = result.tick;
    }
}

/// Executes `count` orders from `flow` against `pool` on behalf of `trader`.
pub fn run_trades(
    pool: &InMemoryPool,
    trader: Address,
    flow: &mut dyn TradeFlow,
    count: usize,
) -> Result<TradeSummary, PoolError> {
    let mut summary = TradeSummary::default();
    for _ in 0..count {
        let order = flow.next_order();
        let result = pool.swap(trader, order.zero_for_one, order.amount_in, None)?;
        summary.record(order.zero_for_one, &result);
    }
    info!(
        swaps = summary.swaps,
        volume0 = %summary.volume0,
        volume1 = %summary.volume1,
        final_tick = summary.final_tick,
        "Trade flow completed"
    );
    Ok(summary)
}
