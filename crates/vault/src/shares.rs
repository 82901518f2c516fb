//! Share accounting.
//!
//! Shares are an 18-decimal fungible token. The first deposit sets the
//! share unit to one unit of liquidity; later deposits and withdrawals are
//! proportional to the vault's depositor-owned value. Share counts and
//! payouts round down, amounts charged to a minter round up, and the dust
//! stays idle.

use crate::error::VaultError;
use crate::position::{PositionManager, TokenAmounts};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use swapsweep_domain::math::concentrated_liquidity::{
    get_amounts_for_liquidity_rounding_up, get_liquidity_for_amounts,
};
use swapsweep_domain::math::full_math::{mul_div, mul_div_rounding_up, to_u128};
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::bps::Bps;

/// Decimals of the share token.
pub const SHARE_DECIMALS: u8 = 18;

/// Amounts and shares for a prospective deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    pub amount0: U256,
    pub amount1: U256,
    pub shares: U256,
}

/// Result of [`ShareLedger::mint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    pub amount0: U256,
    pub amount1: U256,
    pub liquidity_added: u128,
}

/// Result of [`ShareLedger::burn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnOutcome {
    pub amount0: U256,
    pub amount1: U256,
    pub liquidity_burned: u128,
    /// Fees harvested on the way out, before the manager's share.
    pub fees: TokenAmounts,
    /// Manager's share of `fees`.
    pub manager_fee: TokenAmounts,
}

/// Share balances, allowances and the proportional mint/burn math.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLedger {
    name: String,
    symbol: String,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl ShareLedger {
    /// `SwapSweep Vault V{version} {symbol0}/{symbol1}`, `SS-UNI {version}`.
    pub fn new(version: u32, symbol0: &str, symbol1: &str) -> Self {
        Self {
            name: format!("SwapSweep Vault V{version} {symbol0}/{symbol1}"),
            symbol: format!("SS-UNI {version}"),
            total_supply: U256::zero(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        SHARE_DECIMALS
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of every holder balance; always equals the total supply.
    pub fn sum_of_balances(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::zero(), |acc, balance| acc.saturating_add(*balance))
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), VaultError> {
        let available = self.balance_of(from);
        if amount > available {
            return Err(VaultError::InsufficientShares {
                requested: amount,
                available,
            });
        }
        self.set_balance(from, available - amount);
        let received = self.balance_of(to).saturating_add(amount);
        self.set_balance(to, received);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Moves `amount` from `from` using `spender`'s allowance. An allowance
    /// of `U256::MAX` is never decreased.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        let allowance = self.allowance(from, spender);
        if amount > allowance {
            return Err(VaultError::InsufficientAllowance {
                requested: amount,
                available: allowance,
            });
        }
        self.transfer(from, to, amount)?;
        if allowance != U256::MAX {
            self.approve(from, spender, allowance - amount);
        }
        Ok(())
    }

    fn set_balance(&mut self, owner: Address, balance: U256) {
        if balance.is_zero() {
            self.balances.remove(&owner);
        } else {
            self.balances.insert(owner, balance);
        }
    }

    fn issue(&mut self, to: Address, shares: U256) -> Result<(), VaultError> {
        self.total_supply = self
            .total_supply
            .checked_add(shares)
            .ok_or(VaultError::InvalidAmount("share supply overflow"))?;
        let balance = self.balance_of(to).saturating_add(shares);
        self.set_balance(to, balance);
        Ok(())
    }

    fn retire(&mut self, from: Address, shares: U256) -> Result<(), VaultError> {
        let available = self.balance_of(from);
        if shares > available {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        self.set_balance(from, available - shares);
        self.total_supply -= shares;
        Ok(())
    }

    /// Largest proportional deposit that fits in the offered amounts.
    pub fn quote_mint(
        &self,
        positions: &PositionManager,
        manager_fee: Bps,
        amount0_max: U256,
        amount1_max: U256,
    ) -> Result<MintQuote, VaultError> {
        if amount0_max.is_zero() || amount1_max.is_zero() {
            return Err(VaultError::InvalidAmount("both token amounts must be non-zero"));
        }
        let quote = if self.total_supply.is_zero() {
            let sqrt_price = positions.current_price()?;
            let (sqrt_lower, sqrt_upper) = positions.range().sqrt_ratios()?;
            let liquidity = get_liquidity_for_amounts(
                sqrt_price,
                sqrt_lower,
                sqrt_upper,
                amount0_max,
                amount1_max,
            )?;
            let (amount0, amount1) =
                get_amounts_for_liquidity_rounding_up(sqrt_price, sqrt_lower, sqrt_upper, liquidity)?;
            MintQuote {
                amount0,
                amount1,
                shares: U256::from(liquidity),
            }
        } else {
            compute_mint_amounts(
                positions.underlying_balances(manager_fee)?,
                self.total_supply,
                amount0_max,
                amount1_max,
            )?
        };
        if quote.shares.is_zero() {
            return Err(VaultError::InvalidAmount("deposit too small to mint shares"));
        }
        Ok(quote)
    }

    /// Exact amounts charged for `shares` at the current ratio, rounded up.
    pub fn amounts_for_shares(
        &self,
        positions: &PositionManager,
        manager_fee: Bps,
        shares: U256,
    ) -> Result<TokenAmounts, VaultError> {
        if self.total_supply.is_zero() {
            let liquidity = to_u128(shares)?;
            let (sqrt_lower, sqrt_upper) = positions.range().sqrt_ratios()?;
            let (amount0, amount1) = get_amounts_for_liquidity_rounding_up(
                positions.current_price()?,
                sqrt_lower,
                sqrt_upper,
                liquidity,
            )?;
            return Ok(TokenAmounts::new(amount0, amount1));
        }
        let underlying = positions.underlying_balances(manager_fee)?;
        Ok(TokenAmounts::new(
            mul_div_rounding_up(underlying.amount0, shares, self.total_supply)?,
            mul_div_rounding_up(underlying.amount1, shares, self.total_supply)?,
        ))
    }

    /// Charges `payer` for `shares`, deploys the deposit and credits
    /// `receiver`.
    pub fn mint(
        &mut self,
        positions: &mut PositionManager,
        manager_fee: Bps,
        payer: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<MintOutcome, VaultError> {
        if shares.is_zero() {
            return Err(VaultError::InvalidAmount("shares must be non-zero"));
        }
        let amounts = self.amounts_for_shares(positions, manager_fee, shares)?;
        if amounts.is_zero() {
            return Err(VaultError::InvalidAmount("deposit rounds to zero"));
        }

        self.issue(receiver, shares)?;
        positions.pull(payer, amounts)?;
        let liquidity_added = match positions.deploy(amounts.amount0, amounts.amount1) {
            Ok(liquidity) => liquidity,
            Err(err) => {
                positions.pay(payer, amounts)?;
                return Err(err);
            }
        };
        Ok(MintOutcome {
            amount0: amounts.amount0,
            amount1: amounts.amount1,
            liquidity_added,
        })
    }

    /// Redeems `shares` held by `owner` for a proportional slice of the
    /// position and idle funds, paid to `receiver`.
    pub fn burn(
        &mut self,
        positions: &mut PositionManager,
        manager_fee: Bps,
        owner: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<BurnOutcome, VaultError> {
        if shares.is_zero() {
            return Err(VaultError::InvalidAmount("shares must be non-zero"));
        }
        let supply = self.total_supply;
        self.retire(owner, shares)?;

        let liquidity = positions.liquidity()?;
        let liquidity_burned = to_u128(mul_div(U256::from(liquidity), shares, supply)?)?;
        let withdrawn = positions.withdraw(liquidity_burned)?;
        let manager_fee = positions.accrue_manager_fee(withdrawn.fees, manager_fee)?;

        let leftover = positions.idle().saturating_sub(withdrawn.principal);
        let payout = TokenAmounts::new(
            withdrawn
                .principal
                .amount0
                .saturating_add(mul_div(leftover.amount0, shares, supply)?),
            withdrawn
                .principal
                .amount1
                .saturating_add(mul_div(leftover.amount1, shares, supply)?),
        );
        positions.pay(receiver, payout)?;
        Ok(BurnOutcome {
            amount0: payout.amount0,
            amount1: payout.amount1,
            liquidity_burned,
            fees: withdrawn.fees,
            manager_fee,
        })
    }
}

/// Proportional deposit against existing holdings, G-UNI style: shares are
/// the smaller of the per-token ratios, amounts are rounded up.
pub fn compute_mint_amounts(
    underlying: TokenAmounts,
    total_supply: U256,
    amount0_max: U256,
    amount1_max: U256,
) -> Result<MintQuote, VaultError> {
    let shares = match (underlying.amount0.is_zero(), underlying.amount1.is_zero()) {
        (true, true) => return Err(VaultError::InvalidAmount("vault holds no assets")),
        (true, false) => mul_div(amount1_max, total_supply, underlying.amount1)?,
        (false, true) => mul_div(amount0_max, total_supply, underlying.amount0)?,
        (false, false) => {
            let shares0 = mul_div(amount0_max, total_supply, underlying.amount0)?;
            let shares1 = mul_div(amount1_max, total_supply, underlying.amount1)?;
            shares0.min(shares1)
        }
    };
    Ok(MintQuote {
        amount0: mul_div_rounding_up(shares, underlying.amount0, total_supply)?,
        amount1: mul_div_rounding_up(shares, underlying.amount1, total_supply)?,
        shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, e18};
    use std::sync::Arc;
    use swapsweep_domain::value_objects::tick_range::TickRange;

    fn setup() -> (Harness, ShareLedger, PositionManager) {
        let h = Harness::new();
        let positions = PositionManager::new(
            h.vault,
            Arc::new(h.pool.clone()),
            Arc::new(h.ledger.clone()),
            TickRange::full_range(60).unwrap(),
        )
        .unwrap();
        (h, ShareLedger::new(1, "TOKEN", "TOKEN"), positions)
    }

    #[test]
    fn test_metadata() {
        let ledger = ShareLedger::new(1, "TOKEN", "TOKEN");
        assert_eq!(ledger.name(), "SwapSweep Vault V1 TOKEN/TOKEN");
        assert_eq!(ledger.symbol(), "SS-UNI 1");
        assert_eq!(ledger.decimals(), 18);
    }

    #[test]
    fn test_compute_mint_amounts_takes_smaller_leg() {
        let underlying = TokenAmounts::new(U256::from(1_000u64), U256::from(2_000u64));
        let quote =
            compute_mint_amounts(underlying, U256::from(100u64), U256::from(500u64), U256::from(500u64))
                .unwrap();
        assert_eq!(quote.shares, U256::from(25u64));
        assert_eq!(quote.amount0, U256::from(250u64));
        assert_eq!(quote.amount1, U256::from(500u64));
    }

    #[test]
    fn test_compute_mint_amounts_rounds_charge_up() {
        let underlying = TokenAmounts::new(U256::from(10u64), U256::from(10u64));
        let quote =
            compute_mint_amounts(underlying, U256::from(3u64), U256::from(4u64), U256::from(4u64))
                .unwrap();
        assert_eq!(quote.shares, U256::from(1u64));
        assert_eq!(quote.amount0, U256::from(4u64));
    }

    #[test]
    fn test_compute_mint_amounts_single_sided_holdings() {
        let underlying = TokenAmounts::new(U256::zero(), U256::from(1_000u64));
        let quote =
            compute_mint_amounts(underlying, U256::from(1_000u64), U256::from(7u64), U256::from(10u64))
                .unwrap();
        assert_eq!(quote.shares, U256::from(10u64));
        assert!(quote.amount0.is_zero());
        assert!(
            compute_mint_amounts(TokenAmounts::default(), U256::one(), U256::one(), U256::one())
                .is_err()
        );
    }

    #[test]
    fn test_first_mint_sets_unit_to_liquidity() {
        let (h, mut ledger, mut positions) = setup();
        let quote = ledger
            .quote_mint(&positions, Bps::ZERO, e18(), e18())
            .unwrap();
        assert_eq!(quote.shares, e18());

        let outcome = ledger
            .mint(&mut positions, Bps::ZERO, h.alice, quote.shares, h.alice)
            .unwrap();
        assert_eq!(outcome.amount0, quote.amount0);
        assert_eq!(outcome.liquidity_added, 10u128.pow(18));
        assert_eq!(ledger.balance_of(h.alice), e18());
        assert_eq!(ledger.total_supply(), ledger.sum_of_balances());
    }

    #[test]
    fn test_quote_rejects_zero_leg() {
        let (_, ledger, positions) = setup();
        assert!(matches!(
            ledger.quote_mint(&positions, Bps::ZERO, U256::zero(), e18()),
            Err(VaultError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_mint_then_burn_round_trip() {
        let (h, mut ledger, mut positions) = setup();
        ledger
            .mint(&mut positions, Bps::ZERO, h.alice, e18(), h.alice)
            .unwrap();
        let quote = ledger
            .quote_mint(&positions, Bps::ZERO, e18() / U256::from(2u8), e18())
            .unwrap();
        let paid = ledger
            .mint(&mut positions, Bps::ZERO, h.bob, quote.shares, h.bob)
            .unwrap();

        let bob_before = h.balance0(h.bob);
        let out = ledger
            .burn(&mut positions, Bps::ZERO, h.bob, quote.shares, h.bob)
            .unwrap();
        assert!(out.amount0 <= paid.amount0);
        assert!(paid.amount0 - out.amount0 <= U256::from(2u8));
        assert!(paid.amount1 - out.amount1 <= U256::from(2u8));
        assert_eq!(h.balance0(h.bob), bob_before + out.amount0);
        assert_eq!(ledger.balance_of(h.bob), U256::zero());
        assert_eq!(ledger.total_supply(), ledger.sum_of_balances());
    }

    #[test]
    fn test_burn_more_than_balance() {
        let (h, mut ledger, mut positions) = setup();
        ledger
            .mint(&mut positions, Bps::ZERO, h.alice, e18(), h.alice)
            .unwrap();
        let err = ledger
            .burn(&mut positions, Bps::ZERO, h.bob, U256::one(), h.bob)
            .unwrap_err();
        assert_eq!(
            err,
            VaultError::InsufficientShares {
                requested: U256::one(),
                available: U256::zero()
            }
        );
    }

    #[test]
    fn test_burn_everything_empties_vault() {
        let (h, mut ledger, mut positions) = setup();
        ledger
            .mint(&mut positions, Bps::ZERO, h.alice, e18(), h.alice)
            .unwrap();
        h.trade(2);
        ledger
            .burn(&mut positions, Bps::ZERO, h.alice, e18(), h.alice)
            .unwrap();
        assert!(ledger.total_supply().is_zero());
        assert_eq!(positions.liquidity().unwrap(), 0);
        assert!(positions.idle().is_zero());
    }

    #[test]
    fn test_transfer_and_allowance() {
        let (h, mut ledger, mut positions) = setup();
        ledger
            .mint(&mut positions, Bps::ZERO, h.alice, e18(), h.alice)
            .unwrap();

        ledger.transfer(h.alice, h.bob, U256::from(10u8)).unwrap();
        assert_eq!(ledger.balance_of(h.bob), U256::from(10u8));

        assert!(matches!(
            ledger.transfer_from(h.bob, h.alice, h.bob, U256::one()),
            Err(VaultError::InsufficientAllowance { .. })
        ));
        ledger.approve(h.alice, h.bob, U256::from(5u8));
        ledger
            .transfer_from(h.bob, h.alice, h.bob, U256::from(5u8))
            .unwrap();
        assert_eq!(ledger.allowance(h.alice, h.bob), U256::zero());
        assert_eq!(ledger.balance_of(h.bob), U256::from(15u8));
        assert!(matches!(
            ledger.transfer(h.bob, h.alice, U256::from(16u8)),
            Err(VaultError::InsufficientShares { .. })
        ));
        assert_eq!(ledger.total_supply(), ledger.sum_of_balances());
    }
}
