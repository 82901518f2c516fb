//! Keeper-driven maintenance: fee reinvestment and range recentering.
//!
//! Every guard is evaluated from read-only queries before the first pool
//! interaction, so a rejected call never touches the pool.

use crate::error::{StaleReason, VaultError};
use crate::params::ManagerParameters;
use crate::position::{PositionManager, TokenAmounts, manager_cut};
use crate::roles::{Role, RoleConfig};
use primitive_types::U256;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use swapsweep_domain::error::MathError;
use swapsweep_domain::math::full_math::{mul_div, to_u128};
use swapsweep_domain::math::price_tick::fraction_to_tick_width;
use swapsweep_domain::math::swap_math::FEE_PIPS_SCALE;
use swapsweep_domain::math::tick_math::get_sqrt_ratio_at_tick;
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::bps::{BPS_SCALE, Bps};
use swapsweep_domain::value_objects::tick_range::TickRange;
use swapsweep_protocols::error::PoolError;
use swapsweep_protocols::oracle::{VolatilityEstimate, VolatilityOracle};
use tracing::{debug, info};

const SECONDS_PER_DAY: u64 = 86_400;
// Fixed-point scale used to bring the variance ratio into a Decimal.
const RATIO_SCALE: u32 = 18;

/// Sizing of ranges produced by [`RebalanceEngine::recenter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecenterConfig {
    /// Half-width as a multiple of the daily implied volatility.
    pub sigma_multiplier: Decimal,
    pub min_half_width_ticks: i32,
    pub max_half_width_ticks: i32,
}

impl Default for RecenterConfig {
    fn default() -> Self {
        Self {
            sigma_multiplier: Decimal::TWO,
            min_half_width_ticks: 600,
            max_half_width_ticks: 887_220,
        }
    }
}

impl RecenterConfig {
    #[must_use]
    pub fn with_sigma_multiplier(mut self, multiplier: Decimal) -> Self {
        self.sigma_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_half_width_bounds(mut self, min_ticks: i32, max_ticks: i32) -> Self {
        self.min_half_width_ticks = min_ticks;
        self.max_half_width_ticks = max_ticks;
        self
    }
}

/// Arguments of a reinvest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinvestArgs {
    /// Keeper's limit sqrt price (Q64.96).
    pub limit_sqrt_price: U256,
    /// Allowed deviation of the limit from the spot price.
    pub max_slippage_bps: u16,
    /// Side of the TWAP band the limit is checked against.
    pub zero_for_one: bool,
    /// Keeper compensation.
    pub fee_amount: U256,
    /// Token the keeper is paid in.
    pub fee_token: Address,
}

/// Result of a successful reinvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinvestOutcome {
    pub fees: TokenAmounts,
    pub manager_fee: TokenAmounts,
    pub keeper_fee: U256,
    pub fee_token: Address,
    pub liquidity_before: u128,
    pub liquidity_after: u128,
}

/// Result of a successful recenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecenterOutcome {
    pub old_range: TickRange,
    pub new_range: TickRange,
    pub liquidity_removed: u128,
    pub liquidity_added: u128,
    pub fees: TokenAmounts,
    pub manager_fee: TokenAmounts,
    /// Daily implied volatility the width was derived from.
    pub implied_volatility: Decimal,
}

/// Result of a manager balance withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerWithdrawal {
    pub recipient: Address,
    pub amounts: TokenAmounts,
}

/// Orchestrates reinvest and recenter over a [`PositionManager`].
#[derive(Debug, Clone, Default)]
pub struct RebalanceEngine {
    recenter: RecenterConfig,
}

impl RebalanceEngine {
    #[must_use]
    pub fn new(recenter: RecenterConfig) -> Self {
        Self { recenter }
    }

    /// Harvests fees, pays the keeper, accrues the manager fee and
    /// redeploys every idle token into the current range.
    pub fn reinvest(
        &self,
        roles: &RoleConfig,
        params: &ManagerParameters,
        positions: &mut PositionManager,
        caller: Address,
        args: &ReinvestArgs,
    ) -> Result<ReinvestOutcome, VaultError> {
        roles.ensure_keeper(caller)?;
        let paid_in_token0 = fee_token_side(positions, args.fee_token)?;

        let pending = positions.pending_fees()?;
        let cut = manager_cut(pending, params.manager_fee_bps)?;
        let leftover = positions.idle().saturating_add(pending).saturating_sub(cut);
        let leftover = if paid_in_token0 {
            leftover.amount0
        } else {
            leftover.amount1
        };
        check_fee_ratio(params.rebalance_bps, args.fee_amount, leftover)?;
        check_limit_price(positions, params, args)?;

        let liquidity_before = positions.liquidity()?;
        let fees = positions.harvest()?;
        let manager_fee = positions.accrue_manager_fee(fees, params.manager_fee_bps)?;
        let keeper_payment = if paid_in_token0 {
            TokenAmounts::new(args.fee_amount, U256::zero())
        } else {
            TokenAmounts::new(U256::zero(), args.fee_amount)
        };
        positions.pay(caller, keeper_payment)?;
        positions.deploy_idle()?;
        let liquidity_after = positions.liquidity()?;

        info!(
            fees0 = %fees.amount0,
            fees1 = %fees.amount1,
            keeper_fee = %args.fee_amount,
            liquidity_before,
            liquidity_after,
            "Fees reinvested"
        );
        Ok(ReinvestOutcome {
            fees,
            manager_fee,
            keeper_fee: args.fee_amount,
            fee_token: args.fee_token,
            liquidity_before,
            liquidity_after,
        })
    }

    /// Pulls all liquidity, re-centres the range on the current tick with
    /// a width derived from the oracle, and redeploys.
    pub fn recenter(
        &self,
        roles: &RoleConfig,
        params: &ManagerParameters,
        positions: &mut PositionManager,
        oracle: &dyn VolatilityOracle,
        caller: Address,
    ) -> Result<RecenterOutcome, VaultError> {
        roles.ensure_keeper(caller)?;
        let estimate = oracle.estimate()?;
        let implied_volatility = implied_volatility(&estimate)?;
        let spacing = positions.pool().tick_spacing();
        let half_width = self.half_width_ticks(implied_volatility, spacing)?;
        let center = positions.slot0()?.tick;
        let new_range = TickRange::centered(center, half_width, spacing)?;
        let old_range = positions.range();
        debug!(
            %implied_volatility,
            half_width,
            center,
            %new_range,
            "Recenter range computed"
        );

        let liquidity_removed = positions.liquidity()?;
        let withdrawn = positions.withdraw(liquidity_removed)?;
        let manager_fee = positions.accrue_manager_fee(withdrawn.fees, params.manager_fee_bps)?;
        positions.move_range(new_range)?;
        let liquidity_added = positions.deploy_idle()?;

        info!(
            %old_range,
            %new_range,
            liquidity_removed,
            liquidity_added,
            "Range recentered"
        );
        Ok(RecenterOutcome {
            old_range,
            new_range,
            liquidity_removed,
            liquidity_added,
            fees: withdrawn.fees,
            manager_fee,
            implied_volatility,
        })
    }

    /// Pays the manager's accrued fees to the fee recipient, or to the
    /// manager when no recipient is set. Callable by the keeper, the
    /// manager or the recipient.
    pub fn withdraw_manager_balance(
        &self,
        roles: &RoleConfig,
        params: &ManagerParameters,
        positions: &mut PositionManager,
        caller: Address,
    ) -> Result<ManagerWithdrawal, VaultError> {
        let is_recipient = params.fee_recipient == Some(caller);
        if !is_recipient && !roles.is_manager(caller) && roles.ensure_keeper(caller).is_err() {
            return Err(VaultError::Unauthorized {
                role: Role::FeeRecipient,
                caller,
            });
        }
        let recipient = params
            .fee_recipient
            .or(roles.manager())
            .ok_or_else(|| VaultError::InvalidParameter("no fee recipient".to_string()))?;

        let accrued = positions.manager_balance();
        let idle = positions.idle();
        check_fee_ratio(params.rebalance_bps, accrued.amount0, idle.amount0)?;
        check_fee_ratio(params.rebalance_bps, accrued.amount1, idle.amount1)?;

        let amounts = positions.pay_manager_balance(recipient)?;
        info!(
            recipient = ?recipient,
            amount0 = %amounts.amount0,
            amount1 = %amounts.amount1,
            "Manager balance withdrawn"
        );
        Ok(ManagerWithdrawal { recipient, amounts })
    }

    /// Half-width in ticks for a daily volatility, clamped and aligned up
    /// to the tick spacing.
    pub fn half_width_ticks(&self, implied_volatility: Decimal, spacing: i32) -> Result<i32, VaultError> {
        let fraction = implied_volatility * self.recenter.sigma_multiplier;
        let ticks = fraction_to_tick_width(fraction)?;
        let min = self.recenter.min_half_width_ticks.max(spacing);
        let max = self.recenter.max_half_width_ticks.max(min);
        let clamped = ticks.clamp(min, max);
        Ok(clamped.div_euclid(spacing) * spacing + if clamped % spacing == 0 { 0 } else { spacing })
    }
}

fn fee_token_side(positions: &PositionManager, fee_token: Address) -> Result<bool, VaultError> {
    if fee_token == positions.token0() {
        Ok(true)
    } else if fee_token == positions.token1() {
        Ok(false)
    } else {
        Err(VaultError::UnknownToken(fee_token))
    }
}

/// `FeeTooHigh` when `fee / leftover` exceeds `rebalance_bps`; the boundary
/// itself passes.
pub fn check_fee_ratio(rebalance_bps: Bps, fee: U256, leftover: U256) -> Result<(), VaultError> {
    if rebalance_bps.is_exceeded_by(fee, leftover) {
        return Err(VaultError::FeeTooHigh {
            fee,
            leftover,
            rebalance_bps: rebalance_bps.get(),
        });
    }
    Ok(())
}

/// Checks the keeper's limit price against the spot price and against the
/// TWAP band on the side given by `zero_for_one`.
pub fn check_limit_price(
    positions: &PositionManager,
    params: &ManagerParameters,
    args: &ReinvestArgs,
) -> Result<(), VaultError> {
    let spot = positions.current_price()?;
    let deviation = if args.limit_sqrt_price > spot {
        args.limit_sqrt_price - spot
    } else {
        spot - args.limit_sqrt_price
    };
    let max_slippage = Bps::new(args.max_slippage_bps)
        .map_err(|err| VaultError::InvalidParameter(format!("max_slippage_bps: {err}")))?;
    if max_slippage.is_exceeded_by(deviation, spot) {
        return Err(VaultError::StalePrice(StaleReason::SpotDeviation {
            max_slippage_bps: args.max_slippage_bps,
        }));
    }

    let twap = twap_sqrt_price(positions, params.slippage_interval)?;
    let band = mul_div(twap, U256::from(params.slippage_bps.get()), U256::from(BPS_SCALE))?;
    let within = if args.zero_for_one {
        args.limit_sqrt_price >= twap.saturating_sub(band)
    } else {
        args.limit_sqrt_price <= twap.saturating_add(band)
    };
    if !within {
        return Err(VaultError::StalePrice(StaleReason::TwapBand {
            slippage_bps: params.slippage_bps.get(),
        }));
    }
    Ok(())
}

/// Sqrt price at the time-weighted average tick over `interval` seconds.
pub fn twap_sqrt_price(positions: &PositionManager, interval: u32) -> Result<U256, VaultError> {
    let cumulatives = match positions.pool().observe(&[interval, 0]) {
        Ok(cumulatives) => cumulatives,
        Err(PoolError::ObservationTooOld(_)) => {
            return Err(VaultError::StalePrice(StaleReason::ObservationTooOld { interval }));
        }
        Err(err) => return Err(err.into()),
    };
    let [past, now] = cumulatives.as_slice() else {
        return Err(VaultError::InvalidParameter(
            "pool returned a malformed observation".to_string(),
        ));
    };
    Ok(get_sqrt_ratio_at_tick(average_tick(*now - *past, interval)?)?)
}

/// Mean tick over `interval` seconds, rounded toward negative infinity.
pub fn average_tick(tick_cumulative_delta: i64, interval: u32) -> Result<i32, VaultError> {
    let average = tick_cumulative_delta.div_euclid(i64::from(interval.max(1)));
    i32::try_from(average)
        .map_err(|_| VaultError::InvalidParameter("average tick out of range".to_string()))
}

/// Daily implied volatility from fees earned against in-range liquidity:
/// `2 * sqrt(fee_tier * daily_fees / tick_tvl)`.
pub fn implied_volatility(estimate: &VolatilityEstimate) -> Result<Decimal, VaultError> {
    let denominator = estimate.denominator();
    if denominator.is_zero() {
        return Err(VaultError::OracleNotReady);
    }
    let numerator = estimate
        .fee_value
        .checked_mul(U256::from(SECONDS_PER_DAY) * U256::from(estimate.fee_pips))
        .ok_or(VaultError::Math(MathError::Overflow))?;
    let scaled = mul_div(
        numerator,
        U256::exp10(RATIO_SCALE as usize),
        denominator.saturating_mul(U256::from(FEE_PIPS_SCALE)),
    )?;
    let scaled = i128::try_from(to_u128(scaled)?)
        .map_err(|_| VaultError::Math(MathError::Overflow))?;
    let ratio = Decimal::try_from_i128_with_scale(scaled, RATIO_SCALE)
        .map_err(|_| VaultError::Math(MathError::Overflow))?;
    let root = ratio.sqrt().unwrap_or(Decimal::ZERO);
    Ok(Decimal::TWO * root)
}
