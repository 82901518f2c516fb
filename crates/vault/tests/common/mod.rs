#![allow(dead_code)]

use primitive_types::U256;
use std::sync::Arc;
use swapsweep_domain::clock::ManualClock;
use swapsweep_domain::token::Address;
use swapsweep_protocols::oracle::VolatilityOracle;
use swapsweep_protocols::token::TokenLedger;
use swapsweep_simulation::prelude::*;
use swapsweep_vault::prelude::*;

pub const START: u64 = 1_700_000_000;

pub fn e18() -> U256 {
    U256::exp10(18)
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// In-memory pool, tokens and a deployed vault.
pub struct World {
    pub clock: ManualClock,
    pub ledger: InMemoryLedger,
    pub pool: InMemoryPool,
    pub vault: Vault,
    pub token0: Address,
    pub token1: Address,
    pub user0: Address,
    pub user1: Address,
    pub trader: Address,
    pub keeper: Address,
    pub manager: Address,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(&VaultConfig::default())
    }

    pub fn with_config(config: &VaultConfig) -> Self {
        let (clock, ledger, pool) = Self::market();
        let oracle = Arc::new(FeeVolatilityOracle::new(pool.clone()));
        Self::assemble(clock, ledger, pool, oracle, config)
    }

    /// Pool and tokens only, for tests that wire their own oracle.
    pub fn market() -> (ManualClock, InMemoryLedger, InMemoryPool) {
        let clock = ManualClock::new(START);
        let ledger = InMemoryLedger::new();
        ledger.register(addr(0x10), "TOKEN");
        ledger.register(addr(0x11), "TOKEN");
        let pool = InMemoryPool::new(
            PoolConfig::new(addr(0x20), addr(0x10), addr(0x11)),
            Arc::new(ledger.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();
        for account in [addr(1), addr(2), addr(3)] {
            for token in [addr(0x10), addr(0x11)] {
                ledger.mint(token, account, e18() * U256::from(100u8)).unwrap();
            }
        }
        (clock, ledger, pool)
    }

    pub fn assemble(
        clock: ManualClock,
        ledger: InMemoryLedger,
        pool: InMemoryPool,
        oracle: Arc<dyn VolatilityOracle>,
        config: &VaultConfig,
    ) -> Self {
        let (keeper, manager) = (addr(4), addr(5));
        let vault = Vault::new(
            addr(0x30),
            RoleConfig::new(manager, keeper),
            Collaborators {
                pool: Arc::new(pool.clone()),
                tokens: Arc::new(ledger.clone()),
                oracle,
                clock: Arc::new(clock.clone()),
            },
            config,
        )
        .unwrap();
        Self {
            clock,
            ledger,
            pool,
            vault,
            token0: addr(0x10),
            token1: addr(0x11),
            user0: addr(1),
            user1: addr(2),
            trader: addr(3),
            keeper,
            manager,
        }
    }

    /// Quotes and mints for `who` from the offered amounts.
    pub fn deposit(&mut self, who: Address, amount0: U256, amount1: U256) -> MintOutcome {
        let quote = self.vault.quote_mint(amount0, amount1).unwrap();
        self.vault.mint(who, quote.shares, who).unwrap()
    }

    /// Alternating 5e13 swaps by the trader.
    pub fn trade(&self, rounds: usize) {
        self.pool
            .wash_trade(self.trader, U256::from(50_000_000_000_000u64), rounds)
            .unwrap();
    }

    pub fn balance0(&self, owner: Address) -> U256 {
        self.ledger.balance_of(self.token0, owner).unwrap()
    }

    pub fn balance1(&self, owner: Address) -> U256 {
        self.ledger.balance_of(self.token1, owner).unwrap()
    }

    /// Reinvest arguments paying `fee` of token1, limit 4% under spot.
    pub fn reinvest_args(&self, fee: U256) -> ReinvestArgs {
        let spot = self.vault.current_price().unwrap();
        ReinvestArgs {
            limit_sqrt_price: spot - spot / U256::from(25u8),
            max_slippage_bps: 5_000,
            zero_for_one: true,
            fee_amount: fee,
            fee_token: self.token1,
        }
    }

    pub fn assert_supply_invariants(&self) {
        assert_eq!(self.vault.sum_of_balances(), self.vault.total_supply());
        if !self.vault.total_supply().is_zero() {
            assert!(self.vault.liquidity().unwrap() > 0 || !self.vault.idle().is_zero());
        }
    }
}
