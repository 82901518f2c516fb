use primitive_types::U256;
use std::sync::Arc;
use swapsweep_domain::clock::ManualClock;
use swapsweep_domain::token::Address;
use swapsweep_protocols::token::TokenLedger;
use swapsweep_simulation::ledger::InMemoryLedger;
use swapsweep_simulation::oracle::FeeVolatilityOracle;
use swapsweep_simulation::pool::{InMemoryPool, PoolConfig};

use crate::config::VaultConfig;
use crate::roles::RoleConfig;
use crate::vault::{Collaborators, Vault};

pub(crate) const START: u64 = 1_700_000_000;

pub(crate) fn e18() -> U256 {
    U256::exp10(18)
}

pub(crate) fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// Two "TOKEN" tokens, a price-1 pool and three funded accounts.
pub(crate) struct Harness {
    pub clock: ManualClock,
    pub ledger: InMemoryLedger,
    pub pool: InMemoryPool,
    pub token0: Address,
    pub token1: Address,
    pub vault: Address,
    pub alice: Address,
    pub bob: Address,
    pub trader: Address,
    pub keeper: Address,
    pub manager: Address,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new(START);
        let ledger = InMemoryLedger::new();
        let (token0, token1) = (addr(0x10), addr(0x11));
        ledger.register(token0, "TOKEN");
        ledger.register(token1, "TOKEN");

        let pool = InMemoryPool::new(
            PoolConfig::new(addr(0x20), token0, token1),
            Arc::new(ledger.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();

        let h = Self {
            clock,
            ledger,
            pool,
            token0,
            token1,
            vault: addr(0x30),
            alice: addr(1),
            bob: addr(2),
            trader: addr(3),
            keeper: addr(4),
            manager: addr(5),
        };
        for account in [h.alice, h.bob, h.trader] {
            h.ledger.mint(token0, account, e18() * U256::from(100u8)).unwrap();
            h.ledger.mint(token1, account, e18() * U256::from(100u8)).unwrap();
        }
        h
    }

    /// Vault over this harness with the default configuration.
    pub fn deploy(&self) -> Vault {
        Vault::new(
            self.vault,
            RoleConfig::new(self.manager, self.keeper),
            Collaborators {
                pool: Arc::new(self.pool.clone()),
                tokens: Arc::new(self.ledger.clone()),
                oracle: Arc::new(FeeVolatilityOracle::new(self.pool.clone())),
                clock: Arc::new(self.clock.clone()),
            },
            &VaultConfig::default(),
        )
        .unwrap()
    }

    /// Alternating swaps of 5e13 by the trader.
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
}
