//! Collaborator interfaces for the SwapSweep vault.
//!
//! The vault never talks to a concrete AMM or token implementation. It is
//! handed trait objects for:
//! - the concentrated liquidity pool holding its single position
//! - the ledger of the two underlying tokens
//! - the volatility oracle used to size recentered ranges

/// Error types raised by collaborators.
pub mod error;
/// Volatility oracle interface.
pub mod oracle;
/// Concentrated liquidity pool interface.
pub mod pool;
/// Fungible token ledger interface.
pub mod token;

pub use error::{OracleError, PoolError, TokenError};
pub use oracle::{VolatilityEstimate, VolatilityOracle};
pub use pool::{ConcentratedPool, PoolSlot, PositionInfo};
pub use token::TokenLedger;
