//! Time-locked manager parameters.
//!
//! The store keeps the active parameters and at most one pending update.
//! A pending update becomes visible once `now >= effective_at`; until then
//! every read returns the active set. Resolution is a pure function of the
//! store and the time, and committing it is a separate step.

use crate::error::VaultError;
use crate::roles::RoleConfig;
use serde::{Deserialize, Serialize};
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::bps::Bps;

/// Default time lock on parameter updates.
pub const DEFAULT_TIMELOCK_SECONDS: u64 = 300;

/// Risk and fee parameters tuned by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerParameters {
    /// Cap on keeper fee (and manager withdrawals) relative to the leftover
    /// balance of the paid token.
    pub rebalance_bps: Bps,
    /// Receiver of the manager fee. Falls back to the manager when unset.
    pub fee_recipient: Option<Address>,
    /// Share of harvested fees accrued to the manager.
    pub manager_fee_bps: Bps,
    /// Width of the TWAP band a reinvest limit price must fall in.
    pub slippage_bps: Bps,
    /// TWAP lookback in seconds.
    pub slippage_interval: u32,
}

impl Default for ManagerParameters {
    fn default() -> Self {
        Self {
            rebalance_bps: Bps::saturating(200),
            fee_recipient: None,
            manager_fee_bps: Bps::ZERO,
            slippage_bps: Bps::saturating(500),
            slippage_interval: 300,
        }
    }
}

/// Change to the fee recipient carried by a [`ParamsUpdate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientUpdate {
    #[default]
    Keep,
    Set(Address),
    /// Route manager fees back to the manager.
    Clear,
}

impl RecipientUpdate {
    fn apply(self, current: Option<Address>) -> Option<Address> {
        match self {
            Self::Keep => current,
            Self::Set(recipient) => Some(recipient),
            Self::Clear => None,
        }
    }
}

/// A partial update: `None` keeps the currently effective value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsUpdate {
    pub rebalance_bps: Option<u16>,
    pub fee_recipient: RecipientUpdate,
    pub manager_fee_bps: Option<u16>,
    pub slippage_bps: Option<u16>,
    pub slippage_interval: Option<u32>,
}

impl ParamsUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rebalance_bps(mut self, bps: u16) -> Self {
        self.rebalance_bps = Some(bps);
        self
    }

    #[must_use]
    pub fn with_fee_recipient(mut self, recipient: Address) -> Self {
        self.fee_recipient = RecipientUpdate::Set(recipient);
        self
    }

    #[must_use]
    pub fn clear_fee_recipient(mut self) -> Self {
        self.fee_recipient = RecipientUpdate::Clear;
        self
    }

    #[must_use]
    pub fn with_manager_fee_bps(mut self, bps: u16) -> Self {
        self.manager_fee_bps = Some(bps);
        self
    }

    #[must_use]
    pub fn with_slippage_bps(mut self, bps: u16) -> Self {
        self.slippage_bps = Some(bps);
        self
    }

    #[must_use]
    pub fn with_slippage_interval(mut self, seconds: u32) -> Self {
        self.slippage_interval = Some(seconds);
        self
    }

    /// Merges the update over `base`, validating every supplied field.
    pub fn apply(&self, base: &ManagerParameters) -> Result<ManagerParameters, VaultError> {
        let bps = |value: Option<u16>, current: Bps, field: &str| match value {
            Some(raw) => Bps::new(raw)
                .map_err(|err| VaultError::InvalidParameter(format!("{field}: {err}"))),
            None => Ok(current),
        };
        let slippage_interval = self.slippage_interval.unwrap_or(base.slippage_interval);
        if slippage_interval == 0 {
            return Err(VaultError::InvalidParameter(
                "slippage_interval must be non-zero".to_string(),
            ));
        }
        Ok(ManagerParameters {
            rebalance_bps: bps(self.rebalance_bps, base.rebalance_bps, "rebalance_bps")?,
            fee_recipient: self.fee_recipient.apply(base.fee_recipient),
            manager_fee_bps: bps(self.manager_fee_bps, base.manager_fee_bps, "manager_fee_bps")?,
            slippage_bps: bps(self.slippage_bps, base.slippage_bps, "slippage_bps")?,
            slippage_interval,
        })
    }
}

/// A proposed parameter set and the time it takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingParameters {
    pub params: ManagerParameters,
    pub effective_at: u64,
}

/// Active parameters, one pending update and the fixed time lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerParamsStore {
    active: ManagerParameters,
    pending: Option<PendingParameters>,
    delay: u64,
}

impl ManagerParamsStore {
    #[must_use]
    pub fn new(initial: ManagerParameters, delay: u64) -> Self {
        Self {
            active: initial,
            pending: None,
            delay,
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn pending(&self) -> Option<&PendingParameters> {
        self.pending.as_ref()
    }

    /// Parameters in force at `now`, without committing anything.
    pub fn resolve(&self, now: u64) -> &ManagerParameters {
        match &self.pending {
            Some(pending) if now >= pending.effective_at => &pending.params,
            _ => &self.active,
        }
    }

    /// Promotes a matured pending update into the active slot. Returns the
    /// effective parameters and whether a promotion happened.
    pub fn effective(&mut self, now: u64) -> (ManagerParameters, bool) {
        let matured = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.effective_at);
        if matured && let Some(pending) = self.pending.take() {
            self.active = pending.params;
            return (self.active.clone(), true);
        }
        (self.active.clone(), false)
    }

    /// Queues `update` on top of the currently effective parameters,
    /// replacing any update that has not matured yet.
    pub fn propose(
        &mut self,
        roles: &RoleConfig,
        caller: Address,
        update: &ParamsUpdate,
        now: u64,
    ) -> Result<PendingParameters, VaultError> {
        roles.ensure_manager(caller)?;
        let params = update.apply(self.resolve(now))?;
        self.effective(now);
        let pending = PendingParameters {
            params,
            effective_at: now.saturating_add(self.delay),
        };
        self.pending = Some(pending.clone());
        Ok(pending)
    }
}
