//! In-memory concentrated liquidity pool.
//!
//! Implements [`ConcentratedPool`] with exact-input swaps that cross
//! initialized ticks, fees credited pro-rata to in-range positions at swap
//! time, and an [`ObservationRing`] for time-weighted prices. Token
//! movements go through a [`TokenLedger`].

use crate::observation::{CurrentState, Observation, ObservationRing};
use primitive_types::U256;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use swapsweep_domain::clock::Clock;
use swapsweep_domain::error::MathError;
use swapsweep_domain::math::Q96;
use swapsweep_domain::math::concentrated_liquidity::{
    get_amounts_for_liquidity, get_amounts_for_liquidity_rounding_up,
};
use swapsweep_domain::math::full_math::mul_div;
use swapsweep_domain::math::swap_math::compute_swap_step;
use swapsweep_domain::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio,
};
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::tick_range::TickRange;
use swapsweep_protocols::error::PoolError;
use swapsweep_protocols::pool::{ConcentratedPool, PoolSlot, PositionInfo};
use swapsweep_protocols::token::TokenLedger;
use tracing::debug;

/// Static configuration of an [`InMemoryPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Account holding the pool's reserves.
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Fee tier in hundredths of a basis point.
    pub fee_pips: u32,
    pub tick_spacing: i32,
    /// Initial Q64.96 sqrt price.
    pub sqrt_price_x96: U256,
    /// Maximum number of observations retained.
    pub observation_capacity: usize,
}

impl PoolConfig {
    /// A pool initialized at price 1 with a 0.3% fee tier.
    #[must_use]
    pub fn new(address: Address, token0: Address, token1: Address) -> Self {
        Self {
            address,
            token0,
            token1,
            fee_pips: 3_000,
            tick_spacing: 60,
            sqrt_price_x96: Q96,
            observation_capacity: 1_024,
        }
    }

    #[must_use]
    pub fn with_fee(mut self, fee_pips: u32, tick_spacing: i32) -> Self {
        self.fee_pips = fee_pips;
        self.tick_spacing = tick_spacing;
        self
    }

    #[must_use]
    pub fn with_sqrt_price(mut self, sqrt_price_x96: U256) -> Self {
        self.sqrt_price_x96 = sqrt_price_x96;
        self
    }

    #[must_use]
    pub fn with_observation_capacity(mut self, capacity: usize) -> Self {
        self.observation_capacity = capacity;
        self
    }
}

/// Outcome of [`InMemoryPool::swap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    /// Input paid by the trader, fee included.
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct PositionState {
    liquidity: u128,
    tokens_owed0: U256,
    tokens_owed1: U256,
}

#[derive(Debug, Clone)]
struct PoolState {
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    liquidity_net: BTreeMap<i32, i128>,
    positions: HashMap<(Address, TickRange), PositionState>,
    fees_total0: U256,
    fees_total1: U256,
    observations: ObservationRing,
}

impl PoolState {
    fn current(&self, now: u64) -> CurrentState {
        CurrentState {
            now,
            tick: self.tick,
            fees0: self.fees_total0,
            fees1: self.fees_total1,
        }
    }

    fn checkpoint(&mut self, now: u64) {
        let current = self.current(now);
        self.observations.write(current);
    }

    fn next_initialized_tick(&self, zero_for_one: bool) -> i32 {
        if zero_for_one {
            self.liquidity_net
                .range(..=self.tick)
                .next_back()
                .map_or(MIN_TICK, |(tick, _)| *tick)
        } else {
            self.liquidity_net
                .range((Bound::Excluded(self.tick), Bound::Unbounded))
                .next()
                .map_or(MAX_TICK, |(tick, _)| *tick)
        }
    }

    fn apply_liquidity_delta(&mut self, range: TickRange, delta: i128) -> Result<(), MathError> {
        for (tick, net) in [(range.lower, delta), (range.upper, -delta)] {
            let entry = self.liquidity_net.entry(tick).or_insert(0);
            *entry = entry.checked_add(net).ok_or(MathError::Overflow)?;
            if *entry == 0 {
                self.liquidity_net.remove(&tick);
            }
        }
        if range.contains(self.tick) {
            self.liquidity = add_delta(self.liquidity, delta)?;
        }
        Ok(())
    }

    fn credit_fees(&mut self, zero_for_one: bool, fee: U256) -> Result<(), MathError> {
        if fee.is_zero() || self.liquidity == 0 {
            return Ok(());
        }
        let tick = self.tick;
        let active = U256::from(self.liquidity);
        for ((_, range), position) in &mut self.positions {
            if position.liquidity == 0 || !range.contains(tick) {
                continue;
            }
            let share = mul_div(fee, U256::from(position.liquidity), active)?;
            if zero_for_one {
                position.tokens_owed0 = position.tokens_owed0.saturating_add(share);
            } else {
                position.tokens_owed1 = position.tokens_owed1.saturating_add(share);
            }
        }
        if zero_for_one {
            self.fees_total0 = self.fees_total0.saturating_add(fee);
        } else {
            self.fees_total1 = self.fees_total1.saturating_add(fee);
        }
        Ok(())
    }
}

fn add_delta(liquidity: u128, delta: i128) -> Result<u128, MathError> {
    if delta >= 0 {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or(MathError::Overflow)
    } else {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(MathError::Underflow)
    }
}

fn signed(liquidity: u128) -> Result<i128, MathError> {
    i128::try_from(liquidity).map_err(|_| MathError::Overflow)
}

/// A concentrated liquidity pool kept in memory. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryPool {
    config: PoolConfig,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<PoolState>>,
}

impl InMemoryPool {
    pub fn new(
        config: PoolConfig,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PoolError> {
        let tick = get_tick_at_sqrt_ratio(config.sqrt_price_x96)?;
        TickRange::full_range(config.tick_spacing)?;
        let state = PoolState {
            sqrt_price_x96: config.sqrt_price_x96,
            tick,
            liquidity: 0,
            liquidity_net: BTreeMap::new(),
            positions: HashMap::new(),
            fees_total0: U256::zero(),
            fees_total1: U256::zero(),
            observations: ObservationRing::new(clock.now(), config.observation_capacity),
        };
        Ok(Self {
            config,
            ledger,
            clock,
            state: Arc::new(RwLock::new(state)),
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.config.address
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn validate(&self, range: TickRange) -> Result<TickRange, PoolError> {
        Ok(TickRange::new(
            range.lower,
            range.upper,
            self.config.tick_spacing,
        )?)
    }

    /// Moves both tokens from `from` to `to`, undoing the first leg if the
    /// second fails.
    fn transfer_pair(
        &self,
        from: Address,
        to: Address,
        amount0: U256,
        amount1: U256,
    ) -> Result<(), PoolError> {
        if !amount0.is_zero() {
            self.ledger
                .transfer(self.config.token0, from, to, amount0)?;
        }
        if !amount1.is_zero()
            && let Err(err) = self.ledger.transfer(self.config.token1, from, to, amount1)
        {
            if !amount0.is_zero() {
                self.ledger
                    .transfer(self.config.token0, to, from, amount0)?;
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Exact-input swap paid by `trader`.
    ///
    /// `zero_for_one` sells token0 for token1. Without a limit the swap may
    /// run the price to the edge of the representable range.
    pub fn swap(
        &self,
        trader: Address,
        zero_for_one: bool,
        amount_in: U256,
        sqrt_price_limit: Option<U256>,
    ) -> Result<SwapResult, PoolError> {
        if amount_in.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        let mut state = self.write();
        let now = self.clock.now();

        let limit = sqrt_price_limit.unwrap_or(if zero_for_one {
            MIN_SQRT_RATIO + U256::one()
        } else {
            MAX_SQRT_RATIO - U256::one()
        });
        let valid_limit = if zero_for_one {
            limit < state.sqrt_price_x96 && limit > MIN_SQRT_RATIO
        } else {
            limit > state.sqrt_price_x96 && limit < MAX_SQRT_RATIO
        };
        if !valid_limit {
            return Err(PoolError::InvalidPriceLimit);
        }

        // Work on a copy so a failed transfer leaves the pool untouched.
        let mut next = state.clone();
        next.checkpoint(now);

        let mut remaining = amount_in;
        let mut amount_out = U256::zero();
        let mut fee_amount = U256::zero();
        while !remaining.is_zero() && next.sqrt_price_x96 != limit {
            let tick_next = next.next_initialized_tick(zero_for_one);
            let sqrt_price_at_tick = get_sqrt_ratio_at_tick(tick_next)?;
            let target = if zero_for_one {
                sqrt_price_at_tick.max(limit)
            } else {
                sqrt_price_at_tick.min(limit)
            };

            let step = compute_swap_step(
                next.sqrt_price_x96,
                target,
                next.liquidity,
                remaining,
                self.config.fee_pips,
            )?;
            remaining = remaining.saturating_sub(step.amount_in + step.fee_amount);
            amount_out += step.amount_out;
            fee_amount += step.fee_amount;
            next.credit_fees(zero_for_one, step.fee_amount)?;
            next.sqrt_price_x96 = step.sqrt_price_next;

            if step.sqrt_price_next == sqrt_price_at_tick {
                if let Some(net) = next.liquidity_net.get(&tick_next).copied() {
                    let net = if zero_for_one { -net } else { net };
                    next.liquidity = add_delta(next.liquidity, net)?;
                }
                next.tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else {
                next.tick = get_tick_at_sqrt_ratio(next.sqrt_price_x96)?;
            }
        }

        let paid = amount_in - remaining;
        let (token_in, token_out) = if zero_for_one {
            (self.config.token0, self.config.token1)
        } else {
            (self.config.token1, self.config.token0)
        };
        self.ledger
            .transfer(token_in, trader, self.config.address, paid)?;
        if let Err(err) = self
            .ledger
            .transfer(token_out, self.config.address, trader, amount_out)
        {
            self.ledger
                .transfer(token_in, self.config.address, trader, paid)?;
            return Err(err.into());
        }

        let result = SwapResult {
            amount_in: paid,
            amount_out,
            fee_amount,
            sqrt_price_x96: next.sqrt_price_x96,
            tick: next.tick,
        };
        *state = next;
        debug!(
            zero_for_one,
            amount_in = %result.amount_in,
            amount_out = %result.amount_out,
            tick = result.tick,
            "Swap executed"
        );
        Ok(result)
    }

    /// Alternating swaps of `amount_in` each, starting with token0 in.
    pub fn wash_trade(
        &self,
        trader: Address,
        amount_in: U256,
        rounds: usize,
    ) -> Result<Vec<SwapResult>, PoolError> {
        (0..rounds)
            .map(|round| self.swap(trader, round % 2 == 0, amount_in, None))
            .collect()
    }

    /// Accumulators `seconds_ago` seconds before now.
    pub fn observation(&self, seconds_ago: u32) -> Result<Observation, PoolError> {
        let state = self.read();
        let current = state.current(self.clock.now());
        state.observations.observe(current, seconds_ago)
    }

    /// Fees charged over the last `seconds` seconds, or since the oldest
    /// retained observation if the history is shorter.
    pub fn fees_since(&self, seconds: u32) -> Result<(U256, U256), PoolError> {
        let state = self.read();
        let now = self.clock.now();
        let current = state.current(now);
        let available = now.saturating_sub(state.observations.oldest().timestamp);
        let past = if u64::from(seconds) >= available {
            state.observations.oldest()
        } else {
            state.observations.observe(current, seconds)?
        };
        Ok((
            state.fees_total0.saturating_sub(past.fees_cumulative0),
            state.fees_total1.saturating_sub(past.fees_cumulative1),
        ))
    }
}

impl ConcentratedPool for InMemoryPool {
    fn token0(&self) -> Address {
        self.config.token0
    }

    fn token1(&self) -> Address {
        self.config.token1
    }

    fn fee_pips(&self) -> u32 {
        self.config.fee_pips
    }

    fn tick_spacing(&self) -> i32 {
        self.config.tick_spacing
    }

    fn slot0(&self) -> Result<PoolSlot, PoolError> {
        let state = self.read();
        Ok(PoolSlot {
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
        })
    }

    fn liquidity(&self) -> Result<u128, PoolError> {
        Ok(self.read().liquidity)
    }

    fn position(&self, owner: Address, range: TickRange) -> Result<PositionInfo, PoolError> {
        let state = self.read();
        let position = state
            .positions
            .get(&(owner, range))
            .copied()
            .unwrap_or_default();
        Ok(PositionInfo {
            liquidity: position.liquidity,
            tokens_owed0: position.tokens_owed0,
            tokens_owed1: position.tokens_owed1,
        })
    }

    fn mint(
        &self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<(U256, U256), PoolError> {
        let range = self.validate(range)?;
        if liquidity == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let mut state = self.write();
        let now = self.clock.now();
        let (sqrt_lower, sqrt_upper) = range.sqrt_ratios()?;
        let (amount0, amount1) = get_amounts_for_liquidity_rounding_up(
            state.sqrt_price_x96,
            sqrt_lower,
            sqrt_upper,
            liquidity,
        )?;

        let mut next = state.clone();
        next.checkpoint(now);
        next.apply_liquidity_delta(range, signed(liquidity)?)?;
        let position = next.positions.entry((owner, range)).or_default();
        position.liquidity = add_delta(position.liquidity, signed(liquidity)?)?;

        self.transfer_pair(owner, self.config.address, amount0, amount1)?;
        *state = next;
        debug!(owner = ?owner, %range, liquidity, "Liquidity minted");
        Ok((amount0, amount1))
    }

    fn burn(
        &self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<(U256, U256), PoolError> {
        let mut state = self.write();
        let now = self.clock.now();
        let key = (owner, range);
        let mut position = state.positions.get(&key).copied().unwrap_or_default();
        if liquidity > position.liquidity {
            return Err(PoolError::InsufficientLiquidity {
                requested: liquidity,
                available: position.liquidity,
            });
        }
        if liquidity == 0 {
            return Ok((U256::zero(), U256::zero()));
        }

        let (sqrt_lower, sqrt_upper) = range.sqrt_ratios()?;
        let (amount0, amount1) =
            get_amounts_for_liquidity(state.sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity)?;

        let mut next = state.clone();
        next.checkpoint(now);
        next.apply_liquidity_delta(range, -signed(liquidity)?)?;
        position.liquidity -= liquidity;
        position.tokens_owed0 = position.tokens_owed0.saturating_add(amount0);
        position.tokens_owed1 = position.tokens_owed1.saturating_add(amount1);
        next.positions.insert(key, position);
        *state = next;
        debug!(owner = ?owner, %range, liquidity, "Liquidity burned");
        Ok((amount0, amount1))
    }

    fn collect(
        &self,
        owner: Address,
        range: TickRange,
        recipient: Address,
        amount0_requested: U256,
        amount1_requested: U256,
    ) -> Result<(U256, U256), PoolError> {
        let mut state = self.write();
        let key = (owner, range);
        let Some(mut position) = state.positions.get(&key).copied() else {
            return Ok((U256::zero(), U256::zero()));
        };
        let amount0 = position.tokens_owed0.min(amount0_requested);
        let amount1 = position.tokens_owed1.min(amount1_requested);

        self.transfer_pair(self.config.address, recipient, amount0, amount1)?;
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;
        if position.liquidity == 0
            && position.tokens_owed0.is_zero()
            && position.tokens_owed1.is_zero()
        {
            state.positions.remove(&key);
        } else {
            state.positions.insert(key, position);
        }
        Ok((amount0, amount1))
    }

    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, PoolError> {
        let state = self.read();
        let current = state.current(self.clock.now());
        seconds_agos
            .iter()
            .map(|seconds_ago| {
                state
                    .observations
                    .observe(current, *seconds_ago)
                    .map(|observation| observation.tick_cumulative)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use swapsweep_domain::clock::ManualClock;

    struct Fixture {
        pool: InMemoryPool,
        ledger: InMemoryLedger,
        clock: ManualClock,
        lp: Address,
        trader: Address,
    }

    fn e18() -> U256 {
        U256::exp10(18)
    }

    fn setup() -> Fixture {
        let ledger = InMemoryLedger::new();
        let clock = ManualClock::new(1_700_000_000);
        let token0 = Address::from_low_u64_be(0xa0);
        let token1 = Address::from_low_u64_be(0xa1);
        ledger.register(token0, "TOKEN");
        ledger.register(token1, "TOKEN");
        let lp = Address::from_low_u64_be(1);
        let trader = Address::from_low_u64_be(2);
        for account in [lp, trader] {
            ledger.mint(token0, account, e18() * U256::from(100u8)).unwrap();
            ledger.mint(token1, account, e18() * U256::from(100u8)).unwrap();
        }
        let pool = InMemoryPool::new(
            PoolConfig::new(Address::from_low_u64_be(0xb0), token0, token1),
            Arc::new(ledger.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();
        Fixture {
            pool,
            ledger,
            clock,
            lp,
            trader,
        }
    }

    #[test]
    fn test_mint_and_burn_full_range() {
        let f = setup();
        let range = TickRange::full_range(60).unwrap();

        let (amount0, amount1) = f.pool.mint(f.lp, range, 10u128.pow(18)).unwrap();
        assert!(amount0 <= e18() && amount0 + U256::from(2u8) >= e18());
        assert_eq!(amount0, amount1);
        assert_eq!(f.pool.liquidity().unwrap(), 10u128.pow(18));

        let (out0, out1) = f.pool.burn(f.lp, range, 10u128.pow(18)).unwrap();
        assert!(out0 <= amount0 && out1 <= amount1);
        assert_eq!(f.pool.liquidity().unwrap(), 0);

        let info = f.pool.position(f.lp, range).unwrap();
        assert_eq!(info.tokens_owed0, out0);
        let collected = f.pool.collect(f.lp, range, f.lp, U256::MAX, U256::MAX).unwrap();
        assert_eq!(collected, (out0, out1));
        assert_eq!(f.pool.position(f.lp, range).unwrap(), PositionInfo::default());
    }

    #[test]
    fn test_mint_rejects_unaligned_range() {
        let f = setup();
        let range = TickRange {
            lower: -100,
            upper: 120,
        };
        assert!(matches!(
            f.pool.mint(f.lp, range, 1_000),
            Err(PoolError::Math(MathError::UnalignedTick { .. }))
        ));
    }

    #[test]
    fn test_burn_more_than_owned() {
        let f = setup();
        let range = TickRange::new(-600, 600, 60).unwrap();
        f.pool.mint(f.lp, range, 1_000).unwrap();
        assert_eq!(
            f.pool.burn(f.lp, range, 1_001),
            Err(PoolError::InsufficientLiquidity {
                requested: 1_001,
                available: 1_000
            })
        );
    }

    #[test]
    fn test_swap_accrues_fees_to_position() {
        let f = setup();
        let range = TickRange::full_range(60).unwrap();
        f.pool.mint(f.lp, range, 10u128.pow(18)).unwrap();

        let result = f
            .pool
            .swap(f.trader, true, U256::exp10(16), None)
            .unwrap();
        assert_eq!(result.amount_in, U256::exp10(16));
        assert!(result.tick < 0);

        let info = f.pool.position(f.lp, range).unwrap();
        // sole LP receives the whole fee, less rounding
        assert!(info.tokens_owed0 <= result.fee_amount);
        assert!(result.fee_amount - info.tokens_owed0 <= U256::one());
        assert!(info.tokens_owed1.is_zero());
    }

    #[test]
    fn test_swap_crosses_out_of_narrow_range() {
        let f = setup();
        let narrow = TickRange::new(-60, 60, 60).unwrap();
        f.pool.mint(f.lp, narrow, 10u128.pow(15)).unwrap();

        // far more input than the narrow range can absorb
        let result = f.pool.swap(f.trader, false, e18(), None).unwrap();
        assert!(result.tick >= 60);
        assert_eq!(f.pool.liquidity().unwrap(), 0);
        assert!(result.amount_in < e18());
    }

    #[test]
    fn test_swap_rejects_bad_limit() {
        let f = setup();
        assert_eq!(
            f.pool.swap(f.trader, true, U256::one(), Some(Q96 + U256::one())),
            Err(PoolError::InvalidPriceLimit)
        );
        assert_eq!(
            f.pool.swap(f.trader, true, U256::zero(), None),
            Err(PoolError::ZeroAmount)
        );
    }

    #[test]
    fn test_failed_swap_leaves_pool_untouched() {
        let f = setup();
        let range = TickRange::full_range(60).unwrap();
        f.pool.mint(f.lp, range, 10u128.pow(18)).unwrap();
        let poor = Address::from_low_u64_be(3);

        let before = f.pool.slot0().unwrap();
        let err = f.pool.swap(poor, true, U256::exp10(15), None).unwrap_err();
        assert!(matches!(err, PoolError::Token(_)));
        assert_eq!(f.pool.slot0().unwrap(), before);
        assert!(f.pool.position(f.lp, range).unwrap().tokens_owed0.is_zero());
    }

    #[test]
    fn test_observe_requires_history() {
        let f = setup();
        assert_eq!(
            f.pool.observe(&[300, 0]),
            Err(PoolError::ObservationTooOld(300))
        );
        f.clock.advance(300);
        let cumulatives = f.pool.observe(&[300, 0]).unwrap();
        assert_eq!(cumulatives, vec![0, 0]);
    }

    #[test]
    fn test_wash_trade_earns_fees_both_sides() {
        let f = setup();
        let range = TickRange::full_range(60).unwrap();
        f.pool.mint(f.lp, range, 10u128.pow(18)).unwrap();

        let results = f
            .pool
            .wash_trade(f.trader, U256::from(50_000_000_000_000u64), 4)
            .unwrap();
        assert_eq!(results.len(), 4);

        let info = f.pool.position(f.lp, range).unwrap();
        assert!(!info.tokens_owed0.is_zero());
        assert!(!info.tokens_owed1.is_zero());
        let (fees0, fees1) = f.pool.fees_since(3_600).unwrap();
        assert!(fees0 >= info.tokens_owed0);
        assert!(fees1 >= info.tokens_owed1);
        assert!(f.ledger.balance_of(f.pool.config().token0, f.pool.address()).unwrap() > U256::zero());
    }
}
