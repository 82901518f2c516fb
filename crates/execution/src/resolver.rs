//! Decides what the keeper should do next.

use crate::config::{FeeSide, KeeperConfig};
use crate::error::KeeperError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use swapsweep_domain::math::full_math::mul_div;
use swapsweep_domain::value_objects::bps::{BPS_SCALE, Bps};
use swapsweep_vault::engine::ReinvestArgs;
use swapsweep_vault::error::{StaleReason, VaultError};
use swapsweep_vault::vault::Vault;
use tracing::debug;

/// Why a recenter is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecenterReason {
    /// The current tick left the active range.
    OutOfRange,
    /// The current tick is inside the edge buffer of a bound.
    NearEdge,
}

/// Next step for the keeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperAction {
    Recenter(RecenterReason),
    Reinvest(ReinvestArgs),
    Idle,
}

/// Reads vault and pool state and produces keeper calls.
#[derive(Debug, Clone)]
pub struct KeeperResolver {
    config: KeeperConfig,
}

impl KeeperResolver {
    pub fn new(config: KeeperConfig) -> Result<Self, KeeperError> {
        for (field, value) in [
            ("fee_bps", config.fee_bps),
            ("limit_margin_bps", config.limit_margin_bps),
            ("max_slippage_bps", config.max_slippage_bps),
        ] {
            if value > BPS_SCALE {
                return Err(KeeperError::InvalidConfig(format!(
                    "{field} {value} exceeds {BPS_SCALE}"
                )));
            }
        }
        if config.edge_buffer_ticks < 0 {
            return Err(KeeperError::InvalidConfig(
                "edge_buffer_ticks must not be negative".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Recenter takes precedence over reinvest.
    pub fn resolve(&self, vault: &Vault) -> Result<KeeperAction, VaultError> {
        if let Some(reason) = self.recenter_reason(vault)? {
            return Ok(KeeperAction::Recenter(reason));
        }
        Ok(match self.reinvest_args(vault)? {
            Some(args) => KeeperAction::Reinvest(args),
            None => KeeperAction::Idle,
        })
    }

    pub fn recenter_reason(&self, vault: &Vault) -> Result<Option<RecenterReason>, VaultError> {
        if vault.liquidity()? == 0 {
            return Ok(None);
        }
        let tick = vault.slot0()?.tick;
        let range = vault.range();
        if !range.contains(tick) {
            return Ok(Some(RecenterReason::OutOfRange));
        }
        let buffer = self.config.edge_buffer_ticks;
        if tick - range.lower < buffer || range.upper - tick <= buffer {
            return Ok(Some(RecenterReason::NearEdge));
        }
        Ok(None)
    }

    /// Reinvest arguments, or `None` when the fee would be below the
    /// minimum or the pool lacks price history.
    pub fn reinvest_args(&self, vault: &Vault) -> Result<Option<ReinvestArgs>, VaultError> {
        let params = vault.manager_params();
        let pending = vault.pending_fees()?;
        let idle = vault.idle();
        let (fee_token, pending_fee, idle_amount) = match self.config.fee_side {
            FeeSide::Token0 => (vault.token0(), pending.amount0, idle.amount0),
            FeeSide::Token1 => (vault.token1(), pending.amount1, idle.amount1),
        };

        let manager_cut = params.manager_fee_bps.apply(pending_fee)?;
        let leftover = idle_amount
            .saturating_add(pending_fee)
            .saturating_sub(manager_cut);
        let wanted = bps_of(pending_fee, self.config.fee_bps)?;
        let cap = bps_of(leftover, params.rebalance_bps.get())?;
        let fee_amount = wanted.min(cap);
        if fee_amount < self.config.min_fee {
            debug!(
                fee = %fee_amount,
                min_fee = %self.config.min_fee,
                "Keeper fee below minimum, skipping reinvest"
            );
            return Ok(None);
        }

        let twap = match vault.twap_sqrt_price(params.slippage_interval) {
            Ok(twap) => twap,
            Err(VaultError::StalePrice(StaleReason::ObservationTooOld { interval })) => {
                debug!(interval, "Not enough price history, skipping reinvest");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let shift = bps_of(twap, self.config.limit_margin_bps)?;
        let limit_sqrt_price = if self.config.zero_for_one {
            twap.saturating_sub(shift)
        } else {
            twap.saturating_add(shift)
        };

        Ok(Some(ReinvestArgs {
            limit_sqrt_price,
            max_slippage_bps: self.config.max_slippage_bps,
            zero_for_one: self.config.zero_for_one,
            fee_amount,
            fee_token,
        }))
    }
}

fn bps_of(amount: U256, bps: u16) -> Result<U256, VaultError> {
    let bps = Bps::new(bps).map_err(|err| VaultError::InvalidParameter(err.to_string()))?;
    Ok(mul_div(amount, U256::from(bps.get()), U256::from(BPS_SCALE))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{World, e18};

    #[test]
    fn test_rejects_bad_config() {
        let config = KeeperConfig {
            fee_bps: 10_001,
            ..KeeperConfig::default()
        };
        assert!(matches!(
            KeeperResolver::new(config),
            Err(KeeperError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_idle_without_deposits() {
        let w = World::new();
        let resolver = KeeperResolver::new(KeeperConfig::default()).unwrap();
        assert_eq!(resolver.resolve(&w.vault).unwrap(), KeeperAction::Idle);
    }

    #[test]
    fn test_waits_for_price_history() {
        let mut w = World::new();
        w.deposit(e18());
        w.trade(4);
        let resolver = KeeperResolver::new(KeeperConfig::default()).unwrap();
        assert_eq!(resolver.reinvest_args(&w.vault).unwrap(), None);

        w.clock.advance(300);
        let args = resolver.reinvest_args(&w.vault).unwrap().unwrap();
        let twap = w.vault.twap_sqrt_price(300).unwrap();
        assert_eq!(args.limit_sqrt_price, twap - twap / U256::from(100u8));
        assert_eq!(args.fee_token, w.vault.token1());
        let pending = w.vault.pending_fees().unwrap().amount1;
        assert_eq!(args.fee_amount, pending / U256::from(100u8));
    }

    #[test]
    fn test_fee_below_minimum_skips() {
        let mut w = World::new();
        w.deposit(e18());
        w.trade(2);
        w.clock.advance(300);
        let config = KeeperConfig::default().with_fee(FeeSide::Token0, 100, e18());
        let resolver = KeeperResolver::new(config).unwrap();
        assert_eq!(resolver.resolve(&w.vault).unwrap(), KeeperAction::Idle);
    }

    #[test]
    fn test_recenter_near_edge() {
        let mut w = World::with_range(-120, 600);
        w.deposit(e18());
        let resolver = KeeperResolver::new(KeeperConfig::default().with_edge_buffer(60)).unwrap();
        // tick 0 sits 120 ticks above the lower bound
        assert_eq!(resolver.recenter_reason(&w.vault).unwrap(), None);

        let resolver = KeeperResolver::new(KeeperConfig::default().with_edge_buffer(180)).unwrap();
        assert_eq!(
            resolver.resolve(&w.vault).unwrap(),
            KeeperAction::Recenter(RecenterReason::NearEdge)
        );
    }

    #[test]
    fn test_recenter_out_of_range() {
        let mut w = World::with_range(-600, 600);
        w.deposit(e18());
        // push the price well below the range
        w.pool
            .swap(w.trader, true, e18() * U256::from(50u8), None)
            .unwrap();
        let resolver = KeeperResolver::new(KeeperConfig::default()).unwrap();
        assert_eq!(
            resolver.recenter_reason(&w.vault).unwrap(),
            Some(RecenterReason::OutOfRange)
        );
    }
}
