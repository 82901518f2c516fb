//! The vault facade.
//!
//! Every public operation runs against a staged copy of the vault state;
//! the copy replaces the live state, and its events are published, only
//! when the whole operation succeeds.

use crate::config::VaultConfig;
use crate::engine::{
    self, ManagerWithdrawal, RebalanceEngine, RecenterOutcome, ReinvestArgs, ReinvestOutcome,
};
use crate::error::VaultError;
use crate::events::{VaultEvent, VaultEventKind};
use crate::params::{ManagerParameters, ManagerParamsStore, ParamsUpdate, PendingParameters};
use crate::position::{PositionManager, TokenAmounts};
use crate::roles::RoleConfig;
use crate::shares::{BurnOutcome, MintOutcome, MintQuote, ShareLedger};
use primitive_types::U256;
use std::sync::Arc;
use swapsweep_domain::clock::Clock;
use swapsweep_domain::token::Address;
use swapsweep_domain::value_objects::tick_range::TickRange;
use swapsweep_protocols::oracle::VolatilityOracle;
use swapsweep_protocols::pool::{ConcentratedPool, PoolSlot};
use swapsweep_protocols::token::TokenLedger;
use tracing::{debug, info, warn};

/// External systems a vault is wired to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub pool: Arc<dyn ConcentratedPool>,
    pub tokens: Arc<dyn TokenLedger>,
    pub oracle: Arc<dyn VolatilityOracle>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone)]
struct VaultState {
    roles: RoleConfig,
    params: ManagerParamsStore,
    shares: ShareLedger,
    positions: PositionManager,
}

/// A single-range liquidity vault.
#[derive(Debug)]
pub struct Vault {
    address: Address,
    state: VaultState,
    engine: RebalanceEngine,
    oracle: Arc<dyn VolatilityOracle>,
    clock: Arc<dyn Clock>,
    events: Vec<VaultEvent>,
}

impl Vault {
    /// Deploys a vault holding its tokens at `address`.
    pub fn new(
        address: Address,
        roles: RoleConfig,
        collaborators: Collaborators,
        config: &VaultConfig,
    ) -> Result<Self, VaultError> {
        let Collaborators {
            pool,
            tokens,
            oracle,
            clock,
        } = collaborators;
        if config.params.slippage_interval == 0 {
            return Err(VaultError::InvalidParameter(
                "slippage_interval must be non-zero".to_string(),
            ));
        }

        let (symbol0, symbol1) = match &config.token_symbols {
            Some(symbols) => symbols.clone(),
            None => (tokens.symbol(pool.token0())?, tokens.symbol(pool.token1())?),
        };
        let spacing = pool.tick_spacing();
        let range = match config.initial_range {
            Some((lower, upper)) => TickRange::new(lower, upper, spacing)?,
            None => TickRange::full_range(spacing)?,
        };
        let positions = PositionManager::new(address, pool, tokens, range)?;
        let shares = ShareLedger::new(config.version, &symbol0, &symbol1);
        info!(
            vault = ?address,
            name = shares.name(),
            %range,
            "Vault deployed"
        );

        Ok(Self {
            address,
            state: VaultState {
                roles,
                params: ManagerParamsStore::new(config.params.clone(), config.timelock_seconds),
                shares,
                positions,
            },
            engine: RebalanceEngine::new(config.recenter.clone()),
            oracle,
            clock,
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        self.state.shares.name()
    }

    pub fn symbol(&self) -> &str {
        self.state.shares.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.state.shares.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.state.shares.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.state.shares.balance_of(owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.shares.allowance(owner, spender)
    }

    pub fn sum_of_balances(&self) -> U256 {
        self.state.shares.sum_of_balances()
    }

    pub fn roles(&self) -> &RoleConfig {
        &self.state.roles
    }

    pub fn range(&self) -> TickRange {
        self.state.positions.range()
    }

    pub fn idle(&self) -> TokenAmounts {
        self.state.positions.idle()
    }

    pub fn manager_balance(&self) -> TokenAmounts {
        self.state.positions.manager_balance()
    }

    pub fn liquidity(&self) -> Result<u128, VaultError> {
        self.state.positions.liquidity()
    }

    pub fn current_price(&self) -> Result<U256, VaultError> {
        self.state.positions.current_price()
    }

    pub fn slot0(&self) -> Result<PoolSlot, VaultError> {
        self.state.positions.slot0()
    }

    /// Sqrt price at the average tick of the last `interval` seconds.
    pub fn twap_sqrt_price(&self, interval: u32) -> Result<U256, VaultError> {
        engine::twap_sqrt_price(&self.state.positions, interval)
    }

    pub fn pending_fees(&self) -> Result<TokenAmounts, VaultError> {
        self.state.positions.pending_fees()
    }

    pub fn token0(&self) -> Address {
        self.state.positions.token0()
    }

    pub fn token1(&self) -> Address {
        self.state.positions.token1()
    }

    /// Parameters in force now, including a matured pending update.
    pub fn manager_params(&self) -> ManagerParameters {
        self.state.params.resolve(self.clock.now()).clone()
    }

    pub fn pending_params(&self) -> Option<&PendingParameters> {
        self.state.params.pending()
    }

    /// Depositor-owned value at the current price.
    pub fn underlying_balances(&self) -> Result<TokenAmounts, VaultError> {
        let params = self.manager_params();
        self.state
            .positions
            .underlying_balances(params.manager_fee_bps)
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Removes and returns every event published so far.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn quote_mint(&self, amount0_max: U256, amount1_max: U256) -> Result<MintQuote, VaultError> {
        let params = self.manager_params();
        self.state.shares.quote_mint(
            &self.state.positions,
            params.manager_fee_bps,
            amount0_max,
            amount1_max,
        )
    }

    /// Charges `caller` for `shares` and credits them to `receiver`.
    pub fn mint(
        &mut self,
        caller: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<MintOutcome, VaultError> {
        self.transact(|state, params, events| {
            let outcome = state.shares.mint(
                &mut state.positions,
                params.manager_fee_bps,
                caller,
                shares,
                receiver,
            )?;
            events.push(VaultEventKind::Transfer {
                from: None,
                to: Some(receiver),
                amount: shares,
            });
            events.push(VaultEventKind::Mint {
                receiver,
                shares,
                amount0: outcome.amount0,
                amount1: outcome.amount1,
                liquidity_added: outcome.liquidity_added,
            });
            Ok(outcome)
        })
    }

    /// Redeems `caller`'s `shares` and pays `receiver`.
    pub fn burn(
        &mut self,
        caller: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<BurnOutcome, VaultError> {
        self.transact(|state, params, events| {
            let outcome = state.shares.burn(
                &mut state.positions,
                params.manager_fee_bps,
                caller,
                shares,
                receiver,
            )?;
            events.push(VaultEventKind::Transfer {
                from: Some(caller),
                to: None,
                amount: shares,
            });
            events.push(VaultEventKind::Burn {
                owner: caller,
                receiver,
                shares,
                amount0: outcome.amount0,
                amount1: outcome.amount1,
                liquidity_burned: outcome.liquidity_burned,
            });
            Ok(outcome)
        })
    }

    pub fn reinvest(
        &mut self,
        caller: Address,
        args: &ReinvestArgs,
    ) -> Result<ReinvestOutcome, VaultError> {
        let engine = self.engine.clone();
        self.transact(|state, params, events| {
            let outcome =
                engine.reinvest(&state.roles, params, &mut state.positions, caller, args)?;
            events.push(VaultEventKind::Reinvest {
                fees: outcome.fees,
                manager_fee: outcome.manager_fee,
                keeper_fee: outcome.keeper_fee,
                fee_token: outcome.fee_token,
                liquidity_after: outcome.liquidity_after,
            });
            Ok(outcome)
        })
    }

    pub fn recenter(&mut self, caller: Address) -> Result<RecenterOutcome, VaultError> {
        let engine = self.engine.clone();
        let oracle = Arc::clone(&self.oracle);
        self.transact(|state, params, events| {
            let outcome = engine.recenter(
                &state.roles,
                params,
                &mut state.positions,
                oracle.as_ref(),
                caller,
            )?;
            events.push(VaultEventKind::Recenter {
                old_range: outcome.old_range,
                new_range: outcome.new_range,
                liquidity_removed: outcome.liquidity_removed,
                liquidity_added: outcome.liquidity_added,
            });
            Ok(outcome)
        })
    }

    /// Schedules new parameters, effective after the timelock.
    pub fn update_manager_params(
        &mut self,
        caller: Address,
        update: &ParamsUpdate,
    ) -> Result<PendingParameters, VaultError> {
        let now = self.clock.now();
        self.transact(|state, _, events| {
            let pending = state.params.propose(&state.roles, caller, update, now)?;
            events.push(VaultEventKind::ParamsProposed(pending.clone()));
            Ok(pending)
        })
    }

    pub fn withdraw_manager_balance(
        &mut self,
        caller: Address,
    ) -> Result<ManagerWithdrawal, VaultError> {
        let engine = self.engine.clone();
        self.transact(|state, params, events| {
            let withdrawal =
                engine.withdraw_manager_balance(&state.roles, params, &mut state.positions, caller)?;
            events.push(VaultEventKind::ManagerBalanceWithdrawn {
                recipient: withdrawal.recipient,
                amounts: withdrawal.amounts,
            });
            Ok(withdrawal)
        })
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_manager: Address,
    ) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            state.roles.transfer_ownership(caller, new_manager)?;
            events.push(VaultEventKind::OwnershipTransferStarted {
                manager: caller,
                pending_manager: new_manager,
            });
            Ok(())
        })
    }

    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            let previous = state.roles.accept_ownership(caller)?;
            events.push(VaultEventKind::OwnershipTransferred {
                previous,
                manager: Some(caller),
            });
            Ok(())
        })
    }

    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            state.roles.renounce_ownership(caller)?;
            events.push(VaultEventKind::OwnershipTransferred {
                previous: Some(caller),
                manager: None,
            });
            Ok(())
        })
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            state.shares.transfer(caller, to, amount)?;
            events.push(VaultEventKind::Transfer {
                from: Some(caller),
                to: Some(to),
                amount,
            });
            Ok(())
        })
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            state.shares.approve(caller, spender, amount);
            events.push(VaultEventKind::Approval {
                owner: caller,
                spender,
                amount,
            });
            Ok(())
        })
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.transact(|state, _, events| {
            state.shares.transfer_from(caller, from, to, amount)?;
            events.push(VaultEventKind::Transfer {
                from: Some(from),
                to: Some(to),
                amount,
            });
            Ok(())
        })
    }

    fn transact<T>(
        &mut self,
        operation: impl FnOnce(&mut VaultState, &ManagerParameters, &mut Vec<VaultEventKind>) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let now = self.clock.now();
        let mut staged = self.state.clone();
        let mut pending_events = Vec::new();

        let (params, activated) = staged.params.effective(now);
        if activated {
            pending_events.push(VaultEventKind::ParamsActivated(params.clone()));
        }
        let output = match operation(&mut staged, &params, &mut pending_events) {
            Ok(output) => output,
            Err(err) => {
                // Pool and ledger effects cannot be staged; keep the books
                // that track them and drop everything else.
                if staged.positions.interactions() != self.state.positions.interactions() {
                    warn!(
                        vault = ?self.address,
                        error = %err,
                        "Operation failed after moving funds, keeping position books"
                    );
                    self.state.positions = staged.positions;
                }
                return Err(err);
            }
        };

        self.state = staged;
        for kind in pending_events {
            self.publish(kind, now);
        }
        Ok(output)
    }

    fn publish(&mut self, kind: VaultEventKind, now: u64) {
        let event = VaultEvent::new(kind, now);
        info!(
            vault = ?self.address,
            event = event.kind.name(),
            id = %event.id,
            "Vault event"
        );
        debug!(?event, "Vault event detail");
        self.events.push(event);
    }
}
