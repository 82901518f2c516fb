//! Keeper automation for SwapSweep vaults.
//!
//! - [`KeeperResolver`](resolver::KeeperResolver) inspects a vault and its
//!   pool and decides between recentering, reinvesting and doing nothing
//! - [`Keeper`](keeper::Keeper) runs the resolver on a `tokio` interval

/// Prelude module for convenient imports.
pub mod prelude;

/// Keeper settings.
pub mod config;
/// Keeper error type.
pub mod error;
/// Periodic keeper loop.
pub mod keeper;
/// Action selection.
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;
