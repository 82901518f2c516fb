//! The SwapSweep vault.
//!
//! A single-range concentrated liquidity vault:
//! - [`ShareLedger`](shares::ShareLedger) issues and redeems fungible shares
//!   against the vault's position and idle funds
//! - [`PositionManager`](position::PositionManager) owns the pool position
//! - [`RebalanceEngine`](engine::RebalanceEngine) runs keeper-only fee
//!   reinvestment and range recentering
//! - [`ManagerParamsStore`](params::ManagerParamsStore) holds time-locked
//!   risk and fee parameters
//! - [`Vault`](vault::Vault) ties them together and commits each operation
//!   atomically

/// Deployment settings.
pub mod config;
/// Reinvest and recenter orchestration.
pub mod engine;
/// Vault error types.
pub mod error;
/// Events emitted by committed operations.
pub mod events;
/// Time-locked manager parameters.
pub mod params;
/// Pool position adapter.
pub mod position;
/// Privileged identities.
pub mod roles;
/// Share accounting.
pub mod shares;
/// Serialized shared handle.
pub mod shared;
/// Vault facade.
pub mod vault;

/// Prelude module for convenient imports.
pub mod prelude;

#[cfg(test)]
pub(crate) mod test_support;
