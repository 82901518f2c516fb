//! In-memory collaborators for the SwapSweep vault.
//!
//! Everything the vault needs from the outside world, implemented in
//! process so the vault can be driven end-to-end from tests and the CLI:
//! - [`InMemoryLedger`](ledger::InMemoryLedger): balances of any number of tokens
//! - [`InMemoryPool`](pool::InMemoryPool): a concentrated liquidity pool with
//!   tick crossing, pro-rata fee accrual and a price observation ring
//! - [`FeeVolatilityOracle`](oracle::FeeVolatilityOracle): volatility inputs
//!   derived from the fees the pool earned over a trailing window
//! - [`TradeFlow`](trade_flow::TradeFlow) generators that produce swap
//!   orders to push the pool around

/// Token balances.
pub mod ledger;
/// Time-indexed pool observations.
pub mod observation;
/// Fee-derived volatility oracle.
pub mod oracle;
/// Concentrated liquidity pool.
pub mod pool;
/// Swap order generators.
pub mod trade_flow;

/// Prelude module for convenient imports.
pub mod prelude;
