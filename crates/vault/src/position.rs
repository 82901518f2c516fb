//! The vault's single pool position and its idle funds.
//!
//! `PositionManager` is the only component that moves tokens: it pulls
//! deposits, mints and burns liquidity in the active range, collects owed
//! tokens back to the vault and pays recipients. It also tracks the split
//! between depositor-owned idle funds and the manager's accrued fees, both
//! of which sit in the vault's token account.

use crate::error::VaultError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swapsweep_domain::math::concentrated_liquidity::{
    get_amounts_for_liquidity, get_amounts_for_liquidity_rounding_up, get_liquidity_for_amounts,
};
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::bps::Bps;
use swapsweep_domain::value_objects::tick_range::TickRange;
use swapsweep_protocols::pool::{ConcentratedPool, PoolSlot};
use swapsweep_protocols::token::TokenLedger;
use tracing::debug;

// Attempts to shave liquidity until the pool's rounded-up charge fits.
const MAX_FIT_ATTEMPTS: u32 = 16;

/// A pair of token0/token1 amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub amount0: U256,
    pub amount1: U256,
}

impl TokenAmounts {
    #[must_use]
    pub fn new(amount0: U256, amount1: U256) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }

    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self::new(
            self.amount0.saturating_add(other.amount0),
            self.amount1.saturating_add(other.amount1),
        )
    }

    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self::new(
            self.amount0.saturating_sub(other.amount0),
            self.amount1.saturating_sub(other.amount1),
        )
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.amount0.checked_sub(other.amount0)?,
            self.amount1.checked_sub(other.amount1)?,
        ))
    }
}

/// Result of [`PositionManager::withdraw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOutcome {
    pub liquidity: u128,
    /// Principal released by the burn.
    pub principal: TokenAmounts,
    /// Fees collected on the whole position.
    pub fees: TokenAmounts,
}

/// Adapter over the external pool for the vault's single range.
#[derive(Debug, Clone)]
pub struct PositionManager {
    vault: Address,
    pool: Arc<dyn ConcentratedPool>,
    tokens: Arc<dyn TokenLedger>,
    range: TickRange,
    idle: TokenAmounts,
    manager_balance: TokenAmounts,
    /// Pool or ledger mutations that went through.
    interactions: u64,
}

impl PositionManager {
    pub fn new(
        vault: Address,
        pool: Arc<dyn ConcentratedPool>,
        tokens: Arc<dyn TokenLedger>,
        range: TickRange,
    ) -> Result<Self, VaultError> {
        let range = TickRange::new(range.lower, range.upper, pool.tick_spacing())?;
        Ok(Self {
            vault,
            pool,
            tokens,
            range,
            idle: TokenAmounts::default(),
            manager_balance: TokenAmounts::default(),
            interactions: 0,
        })
    }

    /// Count of pool and ledger mutations made through this manager. A
    /// change across a failed operation means funds moved and the books
    /// must follow them.
    pub fn interactions(&self) -> u64 {
        self.interactions
    }

    pub fn pool(&self) -> &dyn ConcentratedPool {
        self.pool.as_ref()
    }

    pub fn token0(&self) -> Address {
        self.pool.token0()
    }

    pub fn token1(&self) -> Address {
        self.pool.token1()
    }

    pub fn range(&self) -> TickRange {
        self.range
    }

    /// Depositor-owned funds not deployed in the pool.
    pub fn idle(&self) -> TokenAmounts {
        self.idle
    }

    /// Manager fees accrued and not yet withdrawn.
    pub fn manager_balance(&self) -> TokenAmounts {
        self.manager_balance
    }

    pub fn slot0(&self) -> Result<PoolSlot, VaultError> {
        Ok(self.pool.slot0()?)
    }

    pub fn current_price(&self) -> Result<U256, VaultError> {
        Ok(self.pool.slot0()?.sqrt_price_x96)
    }

    pub fn liquidity(&self) -> Result<u128, VaultError> {
        Ok(self.pool.position(self.vault, self.range)?.liquidity)
    }

    /// Fees owed by the pool and not yet collected.
    pub fn pending_fees(&self) -> Result<TokenAmounts, VaultError> {
        let info = self.pool.position(self.vault, self.range)?;
        Ok(TokenAmounts::new(info.tokens_owed0, info.tokens_owed1))
    }

    /// Depositor-owned value: position at the current price, idle funds and
    /// pending fees net of the manager's share.
    pub fn underlying_balances(&self, manager_fee: Bps) -> Result<TokenAmounts, VaultError> {
        let info = self.pool.position(self.vault, self.range)?;
        let (sqrt_lower, sqrt_upper) = self.range.sqrt_ratios()?;
        let (amount0, amount1) = get_amounts_for_liquidity(
            self.current_price()?,
            sqrt_lower,
            sqrt_upper,
            info.liquidity,
        )?;
        let fees = TokenAmounts::new(info.tokens_owed0, info.tokens_owed1);
        let net_fees = fees.saturating_sub(manager_cut(fees, manager_fee)?);
        Ok(TokenAmounts::new(amount0, amount1)
            .saturating_add(self.idle)
            .saturating_add(net_fees))
    }

    /// Adds as much liquidity as `amount0`/`amount1` of idle funds buy in
    /// the active range. The unspent remainder stays idle.
    pub fn deploy(&mut self, amount0: U256, amount1: U256) -> Result<u128, VaultError> {
        let offer = TokenAmounts::new(amount0.min(self.idle.amount0), amount1.min(self.idle.amount1));
        let sqrt_price = self.current_price()?;
        let (sqrt_lower, sqrt_upper) = self.range.sqrt_ratios()?;

        let mut liquidity =
            get_liquidity_for_amounts(sqrt_price, sqrt_lower, sqrt_upper, offer.amount0, offer.amount1)?;
        let mut attempts = 0;
        while liquidity > 0 {
            let (need0, need1) =
                get_amounts_for_liquidity_rounding_up(sqrt_price, sqrt_lower, sqrt_upper, liquidity)?;
            if need0 <= offer.amount0 && need1 <= offer.amount1 {
                break;
            }
            attempts += 1;
            if attempts >= MAX_FIT_ATTEMPTS {
                return Err(VaultError::InvalidAmount("liquidity charge exceeds idle funds"));
            }
            liquidity -= 1;
        }
        if liquidity == 0 {
            return Ok(0);
        }

        let (used0, used1) = self.pool.mint(self.vault, self.range, liquidity)?;
        self.interactions += 1;
        self.idle = self
            .idle
            .checked_sub(TokenAmounts::new(used0, used1))
            .ok_or(VaultError::InvalidAmount("pool charged more than idle funds"))?;
        debug!(
            range = %self.range,
            liquidity,
            amount0 = %used0,
            amount1 = %used1,
            "Liquidity deployed"
        );
        Ok(liquidity)
    }

    /// Deploys every idle token.
    pub fn deploy_idle(&mut self) -> Result<u128, VaultError> {
        let idle = self.idle;
        self.deploy(idle.amount0, idle.amount1)
    }

    /// Removes `liquidity` and collects everything the pool owes the
    /// vault, including fees on the whole position. Proceeds become idle.
    pub fn withdraw(&mut self, liquidity: u128) -> Result<WithdrawOutcome, VaultError> {
        let (burned0, burned1) = self.pool.burn(self.vault, self.range, liquidity)?;
        self.interactions += 1;
        let (collected0, collected1) =
            self.pool
                .collect(self.vault, self.range, self.vault, U256::MAX, U256::MAX)?;
        let principal = TokenAmounts::new(burned0, burned1);
        let collected = TokenAmounts::new(collected0, collected1);
        let fees = collected.saturating_sub(principal);
        self.idle = self.idle.saturating_add(collected);
        debug!(
            range = %self.range,
            liquidity,
            fees0 = %fees.amount0,
            fees1 = %fees.amount1,
            "Liquidity withdrawn"
        );
        Ok(WithdrawOutcome {
            liquidity,
            principal,
            fees,
        })
    }

    /// Collects fees without touching liquidity.
    pub fn harvest(&mut self) -> Result<TokenAmounts, VaultError> {
        Ok(self.withdraw(0)?.fees)
    }

    /// Moves the manager's share of `fees` out of the idle funds.
    pub fn accrue_manager_fee(
        &mut self,
        fees: TokenAmounts,
        manager_fee: Bps,
    ) -> Result<TokenAmounts, VaultError> {
        let cut = manager_cut(fees, manager_fee)?;
        self.idle = self
            .idle
            .checked_sub(cut)
            .ok_or(VaultError::InvalidAmount("manager fee exceeds idle funds"))?;
        self.manager_balance = self.manager_balance.saturating_add(cut);
        Ok(cut)
    }

    /// Replaces the active range. Only allowed while no liquidity is
    /// deployed.
    pub fn move_range(&mut self, range: TickRange) -> Result<(), VaultError> {
        let range = TickRange::new(range.lower, range.upper, self.pool.tick_spacing())?;
        if self.liquidity()? > 0 {
            return Err(VaultError::InvalidParameter(
                "range can only move while the position is empty".to_string(),
            ));
        }
        self.range = range;
        Ok(())
    }

    /// Pulls `amounts` from `from` into idle funds.
    pub fn pull(&mut self, from: Address, amounts: TokenAmounts) -> Result<(), VaultError> {
        self.move_pair(from, self.vault, amounts)?;
        self.idle = self.idle.saturating_add(amounts);
        Ok(())
    }

    /// Pays `amounts` of idle funds to `to`.
    pub fn pay(&mut self, to: Address, amounts: TokenAmounts) -> Result<(), VaultError> {
        let remaining = self
            .idle
            .checked_sub(amounts)
            .ok_or(VaultError::InvalidAmount("payout exceeds idle funds"))?;
        self.move_pair(self.vault, to, amounts)?;
        self.idle = remaining;
        Ok(())
    }

    /// Pays the whole manager balance to `to`.
    pub fn pay_manager_balance(&mut self, to: Address) -> Result<TokenAmounts, VaultError> {
        let amounts = self.manager_balance;
        self.move_pair(self.vault, to, amounts)?;
        self.manager_balance = TokenAmounts::default();
        Ok(amounts)
    }

    fn move_pair(&mut self, from: Address, to: Address, amounts: TokenAmounts) -> Result<(), VaultError> {
        let (token0, token1) = (self.token0(), self.token1());
        if !amounts.amount0.is_zero() {
            self.tokens.transfer(token0, from, to, amounts.amount0)?;
        }
        if !amounts.amount1.is_zero()
            && let Err(err) = self.tokens.transfer(token1, from, to, amounts.amount1)
        {
            if !amounts.amount0.is_zero() {
                self.tokens.transfer(token0, to, from, amounts.amount0)?;
            }
            return Err(err.into());
        }
        self.interactions += 1;
        Ok(())
    }
}

/// `fees * manager_fee / 10_000` per token.
pub fn manager_cut(fees: TokenAmounts, manager_fee: Bps) -> Result<TokenAmounts, VaultError> {
    Ok(TokenAmounts::new(
        manager_fee.apply(fees.amount0)?,
        manager_fee.apply(fees.amount1)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, e18};

    fn manager(h: &Harness) -> PositionManager {
        PositionManager::new(
            h.vault,
            Arc::new(h.pool.clone()),
            Arc::new(h.ledger.clone()),
            TickRange::full_range(60).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_pull_and_deploy() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        assert_eq!(positions.idle(), TokenAmounts::new(e18(), e18()));

        let liquidity = positions.deploy_idle().unwrap();
        assert_eq!(liquidity, 10u128.pow(18));
        assert_eq!(positions.liquidity().unwrap(), liquidity);
        assert!(positions.idle().amount0 <= U256::one());
    }

    #[test]
    fn test_deploy_without_funds_is_noop() {
        let h = Harness::new();
        let mut positions = manager(&h);
        assert_eq!(positions.deploy(e18(), e18()).unwrap(), 0);
        assert_eq!(positions.liquidity().unwrap(), 0);
    }

    #[test]
    fn test_withdraw_collects_fees_on_partial_removal() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        let liquidity = positions.deploy_idle().unwrap();
        h.trade(4);

        let pending = positions.pending_fees().unwrap();
        assert!(!pending.is_zero());

        let outcome = positions.withdraw(liquidity / 4).unwrap();
        assert_eq!(outcome.fees, pending);
        assert!(positions.pending_fees().unwrap().is_zero());
        assert_eq!(positions.liquidity().unwrap(), liquidity - liquidity / 4);
    }

    #[test]
    fn test_manager_fee_split() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        positions.deploy_idle().unwrap();
        h.trade(2);

        let fees = positions.harvest().unwrap();
        let idle_before = positions.idle();
        let cut = positions
            .accrue_manager_fee(fees, Bps::new(1_000).unwrap())
            .unwrap();
        assert_eq!(cut.amount0, fees.amount0 / U256::from(10u8));
        assert_eq!(positions.manager_balance(), cut);
        assert_eq!(positions.idle(), idle_before.saturating_sub(cut));
    }

    #[test]
    fn test_move_range_requires_empty_position() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        let liquidity = positions.deploy_idle().unwrap();
        let narrow = TickRange::new(-600, 600, 60).unwrap();

        assert!(matches!(
            positions.move_range(narrow),
            Err(VaultError::InvalidParameter(_))
        ));
        positions.withdraw(liquidity).unwrap();
        positions.move_range(narrow).unwrap();
        assert_eq!(positions.range(), narrow);
        assert!(positions.deploy_idle().unwrap() > liquidity);
    }

    #[test]
    fn test_pay_more_than_idle_fails_without_moving_tokens() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        let bob_before = h.balance0(h.bob);
        let err = positions
            .pay(h.bob, TokenAmounts::new(e18() + U256::one(), U256::zero()))
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount(_)));
        assert_eq!(h.balance0(h.bob), bob_before);
    }

    #[test]
    fn test_underlying_includes_idle_and_net_fees() {
        let h = Harness::new();
        let mut positions = manager(&h);
        positions.pull(h.alice, TokenAmounts::new(e18(), e18())).unwrap();
        positions.deploy_idle().unwrap();
        h.trade(2);

        let gross = positions.underlying_balances(Bps::ZERO).unwrap();
        let net = positions.underlying_balances(Bps::new(5_000).unwrap()).unwrap();
        assert!(net.amount0 < gross.amount0);
        assert!(gross.amount0 > e18() / U256::from(2u8));
    }
}
