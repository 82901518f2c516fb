//! Events emitted by committed vault operations.

use crate::params::{ManagerParameters, PendingParameters};
use crate::position::TokenAmounts;
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::tick_range::TickRange;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEventKind {
    Mint {
        receiver: Address,
        shares: U256,
        amount0: U256,
        amount1: U256,
        liquidity_added: u128,
    },
    Burn {
        owner: Address,
        receiver: Address,
        shares: U256,
        amount0: U256,
        amount1: U256,
        liquidity_burned: u128,
    },
    Reinvest {
        fees: TokenAmounts,
        manager_fee: TokenAmounts,
        keeper_fee: U256,
        fee_token: Address,
        liquidity_after: u128,
    },
    Recenter {
        old_range: TickRange,
        new_range: TickRange,
        liquidity_removed: u128,
        liquidity_added: u128,
    },
    ParamsProposed(PendingParameters),
    ParamsActivated(ManagerParameters),
    ManagerBalanceWithdrawn {
        recipient: Address,
        amounts: TokenAmounts,
    },
    OwnershipTransferStarted {
        manager: Address,
        pending_manager: Address,
    },
    OwnershipTransferred {
        previous: Option<Address>,
        manager: Option<Address>,
    },
    /// Share movement; `None` on either side is a mint or a burn.
    Transfer {
        from: Option<Address>,
        to: Option<Address>,
        amount: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: U256,
    },
}

impl VaultEventKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "Mint",
            Self::Burn { .. } => "Burn",
            Self::Reinvest { .. } => "Reinvest",
            Self::Recenter { .. } => "Recenter",
            Self::ParamsProposed(_) => "ParamsProposed",
            Self::ParamsActivated(_) => "ParamsActivated",
            Self::ManagerBalanceWithdrawn { .. } => "ManagerBalanceWithdrawn",
            Self::OwnershipTransferStarted { .. } => "OwnershipTransferStarted",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
        }
    }
}

/// An event with its identity and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: VaultEventKind,
}

impl VaultEvent {
    /// Stamps `kind` with a fresh id and the given unix time.
    pub fn new(kind: VaultEventKind, unix_seconds: u64) -> Self {
        let timestamp = i64::try_from(unix_seconds)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            timestamp,
            kind,
        }
    }
}
