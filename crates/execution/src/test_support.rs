use primitive_types::U256;
use std::sync::Arc;
use swapsweep_domain::clock::ManualClock;
use swapsweep_domain::token::Address;
use swapsweep_simulation::prelude::*;
use swapsweep_vault::prelude::*;

pub(crate) fn e18() -> U256 {
    U256::exp10(18)
}

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// A vault over an in-memory pool with one funded depositor and trader.
pub(crate) struct World {
    pub clock: ManualClock,
    pub pool: InMemoryPool,
    pub vault: Vault,
    pub depositor: Address,
    pub trader: Address,
    pub keeper: Address,
}

impl World {
    pub fn new() -> Self {
        Self::build(VaultConfig::default())
    }

    pub fn with_range(lower: i32, upper: i32) -> Self {
        Self::build(VaultConfig::default().with_initial_range(lower, upper))
    }

    fn build(config: VaultConfig) -> Self {
        let clock = ManualClock::new(1_700_000_000);
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
        let (depositor, trader, keeper, manager) = (addr(1), addr(3), addr(4), addr(5));
        for account in [depositor, trader] {
            ledger.mint(token0, account, e18() * U256::from(100u8)).unwrap();
            ledger.mint(token1, account, e18() * U256::from(100u8)).unwrap();
        }
        let vault = Vault::new(
            addr(0x30),
            RoleConfig::new(manager, keeper),
            Collaborators {
                pool: Arc::new(pool.clone()),
                tokens: Arc::new(ledger),
                oracle: Arc::new(FeeVolatilityOracle::new(pool.clone())),
                clock: Arc::new(clock.clone()),
            },
            &config,
        )
        .unwrap();
        Self {
            clock,
            pool,
            vault,
            depositor,
            trader,
            keeper,
        }
    }

    pub fn deposit(&mut self, amount: U256) {
        let quote = self.vault.quote_mint(amount, amount).unwrap();
        self.vault
            .mint(self.depositor, quote.shares, self.depositor)
            .unwrap();
    }

    pub fn trade(&self, rounds: usize) {
        self.pool
            .wash_trade(self.trader, U256::from(50_000_000_000_000u64), rounds)
            .unwrap();
    }
}
