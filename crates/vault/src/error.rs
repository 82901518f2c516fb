use crate::roles::Role;
use primitive_types::U256;
use swapsweep_domain::error::MathError;
use swapsweep_domain::token::Address;
use swapsweep_protocols::error::{OracleError, PoolError, TokenError};
use thiserror::Error;

/// Why a reinvest limit price was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StaleReason {
    /// The pool cannot serve a TWAP over the configured interval.
    #[error("OLD: no observation {interval} seconds ago")]
    ObservationTooOld { interval: u32 },
    #[error("limit price deviates from spot by more than {max_slippage_bps} bps")]
    SpotDeviation { max_slippage_bps: u16 },
    #[error("limit price outside the {slippage_bps} bps band around the TWAP")]
    TwapBand { slippage_bps: u16 },
}

/// Errors returned by vault operations. An error leaves shares, roles and
/// parameters unchanged. Idle and manager balances always match what the
/// pool and token ledger actually settled, so a failure after funds moved
/// keeps those funds on the vault's books.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("caller {caller:?} is not the {role}")]
    Unauthorized { role: Role, caller: Address },
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: U256, available: U256 },
    #[error("insufficient allowance: requested {requested}, available {available}")]
    InsufficientAllowance { requested: U256, available: U256 },
    #[error("high fee: {fee} exceeds {rebalance_bps} bps of leftover {leftover}")]
    FeeTooHigh {
        fee: U256,
        leftover: U256,
        rebalance_bps: u16,
    },
    #[error("stale price: {0}")]
    StalePrice(StaleReason),
    /// The oracle's fee/liquidity denominator is zero.
    #[error("Denom != 0: oracle has no in-range liquidity to measure")]
    OracleNotReady,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown token {0:?}")]
    UnknownToken(Address),
    #[error("vault is already executing an operation")]
    Reentrant,
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
