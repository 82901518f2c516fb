//! Periodic keeper loop.

use crate::config::KeeperConfig;
use crate::error::KeeperError;
use crate::resolver::{KeeperAction, KeeperResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use swapsweep_domain::token::Address;
use swapsweep_vault::engine::{RecenterOutcome, ReinvestOutcome};
use swapsweep_vault::error::VaultError;
use swapsweep_vault::shared::SharedVault;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// What a single evaluation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperOutcome {
    Reinvested(ReinvestOutcome),
    Recentered(RecenterOutcome),
    Idle,
}

/// Counters over a keeper run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperReport {
    pub ticks: u64,
    pub reinvests: u64,
    pub recenters: u64,
    pub idle: u64,
    pub failures: u64,
    /// Vault events drained after each evaluation.
    pub events: u64,
}

impl KeeperReport {
    fn record(&mut self, outcome: &KeeperOutcome) {
        match outcome {
            KeeperOutcome::Reinvested(_) => self.reinvests += 1,
            KeeperOutcome::Recentered(_) => self.recenters += 1,
            KeeperOutcome::Idle => self.idle += 1,
        }
    }
}

/// Drives reinvest and recenter on a shared vault.
#[derive(Debug)]
pub struct Keeper {
    vault: SharedVault,
    caller: Address,
    resolver: KeeperResolver,
    running: Arc<AtomicBool>,
}

impl Keeper {
    /// `caller` must be the vault's keeper.
    pub fn new(vault: SharedVault, caller: Address, config: KeeperConfig) -> Result<Self, KeeperError> {
        if config.interval_ms == 0 {
            return Err(KeeperError::InvalidConfig(
                "interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            vault,
            caller,
            resolver: KeeperResolver::new(config)?,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn config(&self) -> &KeeperConfig {
        self.resolver.config()
    }

    /// Flag that stops [`Keeper::run`] when cleared. A keeper starts armed;
    /// once stopped it stays stopped.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Resolves and executes one action.
    pub fn evaluate(&self) -> Result<KeeperOutcome, VaultError> {
        self.vault.with(|vault| match self.resolver.resolve(vault)? {
            KeeperAction::Recenter(reason) => {
                info!(?reason, "Recentering vault");
                vault.recenter(self.caller).map(KeeperOutcome::Recentered)
            }
            KeeperAction::Reinvest(args) => {
                debug!(fee = %args.fee_amount, "Reinvesting fees");
                vault.reinvest(self.caller, &args).map(KeeperOutcome::Reinvested)
            }
            KeeperAction::Idle => Ok(KeeperOutcome::Idle),
        })
    }

    /// Evaluates on every interval tick until stopped, `max_ticks` is
    /// reached or too many evaluations fail in a row.
    pub async fn run(&self) -> Result<KeeperReport, KeeperError> {
        let config = self.resolver.config().clone();
        let mut ticker = interval(Duration::from_millis(config.interval_ms));
        let mut report = KeeperReport::default();
        let mut streak = 0u32;

        info!(
            interval_ms = config.interval_ms,
            max_ticks = ?config.max_ticks,
            "Starting keeper"
        );

        while self.is_running() {
            ticker.tick().await;
            if !self.is_running() {
                break;
            }
            report.ticks += 1;

            match self.evaluate() {
                Ok(outcome) => {
                    streak = 0;
                    report.record(&outcome);
                }
                Err(err) => {
                    streak += 1;
                    report.failures += 1;
                    warn!(error = %err, streak, "Keeper evaluation failed");
                    if streak >= config.max_consecutive_failures {
                        self.stop();
                        return Err(KeeperError::TooManyFailures(streak));
                    }
                }
            }

            match self.vault.with(|vault| Ok(vault.drain_events())) {
                Ok(events) => {
                    report.events += u64::try_from(events.len()).unwrap_or(u64::MAX);
                    debug!(count = events.len(), "Drained vault events");
                }
                Err(err) => warn!(error = %err, "Could not drain vault events"),
            }

            if config.max_ticks.is_some_and(|max| report.ticks >= max) {
                break;
            }
        }

        self.stop();
        info!(
            ticks = report.ticks,
            reinvests = report.reinvests,
            recenters = report.recenters,
            failures = report.failures,
            "Keeper stopped"
        );
        Ok(report)
    }
}
