use crate::error::PoolError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::tick_range::TickRange;

/// Current pool price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSlot {
    /// Q64.96 square root of the token1/token0 price.
    pub sqrt_price_x96: U256,
    /// Greatest tick whose sqrt ratio is at or below `sqrt_price_x96`.
    pub tick: i32,
}

/// Snapshot of a position held in the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Token0 owed to the owner: burned principal plus earned fees.
    pub tokens_owed0: U256,
    /// Token1 owed to the owner: burned principal plus earned fees.
    pub tokens_owed1: U256,
}

/// A concentrated liquidity pool.
///
/// Positions are keyed by `(owner, range)`. `mint` pulls tokens from the
/// owner, `burn` moves principal into the position's owed balances and
/// `collect` pays owed balances out.
pub trait ConcentratedPool: Send + Sync + Debug {
    fn token0(&self) -> Address;

    fn token1(&self) -> Address;

    /// Fee tier in hundredths of a basis point.
    fn fee_pips(&self) -> u32;

    fn tick_spacing(&self) -> i32;

    fn slot0(&self) -> Result<PoolSlot, PoolError>;

    /// Liquidity active at the current tick.
    fn liquidity(&self) -> Result<u128, PoolError>;

    fn position(&self, owner: Address, range: TickRange) -> Result<PositionInfo, PoolError>;

    /// Adds `liquidity` to the position and returns the amounts charged.
    fn mint(
        &self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<(U256, U256), PoolError>;

    /// Removes `liquidity` from the position and returns the principal
    /// credited to its owed balances. Burning zero only settles fees.
    fn burn(
        &self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> Result<(U256, U256), PoolError>;

    /// Pays up to the requested owed amounts to `recipient`.
    fn collect(
        &self,
        owner: Address,
        range: TickRange,
        recipient: Address,
        amount0_requested: U256,
        amount1_requested: U256,
    ) -> Result<(U256, U256), PoolError>;

    /// Tick cumulatives for each entry of `seconds_agos`.
    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, PoolError>;
}
