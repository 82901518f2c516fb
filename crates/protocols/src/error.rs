use primitive_types::U256;
use swapsweep_domain::error::MathError;
use swapsweep_domain::token::Address;
use thiserror::Error;

/// Errors raised by a token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance of {token:?} held by {owner:?}: needed {needed}, available {available}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        needed: U256,
        available: U256,
    },
    #[error("unknown token {0:?}")]
    UnknownToken(Address),
}

/// Errors raised by a concentrated liquidity pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool has no observation old enough to serve the query.
    #[error("OLD: no observation {0} seconds ago")]
    ObservationTooOld(u32),
    #[error("insufficient position liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },
    #[error("swap amount must be non-zero")]
    ZeroAmount,
    #[error("invalid price limit")]
    InvalidPriceLimit,
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Errors raised by a volatility oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle window must be non-zero")]
    EmptyWindow,
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}
