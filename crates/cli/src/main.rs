//! Command line interface for the SwapSweep vault.
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swapsweep_domain::prelude::*;
use swapsweep_execution::prelude::*;
use swapsweep_simulation::prelude::*;
use swapsweep_vault::prelude::*;
use tracing::{info, warn};

const TOKEN_DECIMALS: u32 = 18;

#[derive(Parser)]
#[command(name = "swapsweep")]
#[command(about = "SwapSweep concentrated liquidity vault CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a keeper-driven vault against a simulated trade flow
    Simulate {
        /// Vault configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keeper configuration (JSON)
        #[arg(long)]
        keeper_config: Option<PathBuf>,

        /// Number of keeper evaluations
        #[arg(short, long, default_value_t = 48)]
        steps: usize,

        /// Swaps executed between evaluations
        #[arg(short, long, default_value_t = 20)]
        trades_per_step: usize,

        /// Simulated seconds between evaluations
        #[arg(long, default_value_t = 300)]
        step_seconds: u64,

        /// Tokens of each side offered by the depositor
        #[arg(short, long, default_value = "100")]
        deposit: Decimal,

        /// Smallest swap, in tokens
        #[arg(long, default_value = "0.01")]
        min_trade: Decimal,

        /// Largest swap, in tokens
        #[arg(long, default_value = "0.5")]
        max_trade: Decimal,

        /// Trade flow seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the default vault and keeper configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Simulate {
            config,
            keeper_config,
            steps,
            trades_per_step,
            step_seconds,
            deposit,
            min_trade,
            max_trade,
            seed,
        } => {
            let vault_config: VaultConfig = load_json(config.as_deref())?;
            let keeper_config: KeeperConfig = load_json(keeper_config.as_deref())?;
            let run = SimulationRun {
                steps: *steps,
                trades_per_step: *trades_per_step,
                step_seconds: *step_seconds,
                deposit: to_wei(*deposit)?,
                min_trade: to_wei(*min_trade)?.low_u128(),
                max_trade: to_wei(*max_trade)?.low_u128(),
                seed: *seed,
            };
            if run.min_trade == 0 || run.min_trade > run.max_trade {
                return Err(anyhow!("trade bounds must satisfy 0 < min <= max"));
            }
            simulate(&vault_config, keeper_config, &run)?;
        }
        Commands::Config => {
            println!("📄 Vault configuration");
            println!("{}", serde_json::to_string_pretty(&VaultConfig::default())?);
            println!("\n📄 Keeper configuration");
            println!("{}", serde_json::to_string_pretty(&KeeperConfig::default())?);
        }
    }

    Ok(())
}

struct SimulationRun {
    steps: usize,
    trades_per_step: usize,
    step_seconds: u64,
    deposit: U256,
    min_trade: u128,
    max_trade: u128,
    seed: u64,
}

#[derive(Default)]
struct Tally {
    swaps: usize,
    volume0: U256,
    volume1: U256,
    report: KeeperReport,
}

fn simulate(config: &VaultConfig, keeper_config: KeeperConfig, run: &SimulationRun) -> Result<()> {
    let clock = ManualClock::new(SystemClock.now());
    let ledger = InMemoryLedger::new();
    let (token0, token1) = (account(0x10), account(0x11));
    let (symbol0, symbol1) = config
        .token_symbols
        .clone()
        .unwrap_or_else(|| ("TOKEN0".to_string(), "TOKEN1".to_string()));
    ledger.register(token0, symbol0);
    ledger.register(token1, symbol1);

    let pool = InMemoryPool::new(
        PoolConfig::new(account(0x20), token0, token1),
        Arc::new(ledger.clone()),
        Arc::new(clock.clone()),
    )?;

    let (depositor, trader, keeper, manager) = (account(1), account(2), account(3), account(4));
    let trader_funds = run.deposit.saturating_mul(U256::from(1_000u32));
    for token in [token0, token1] {
        ledger.mint(token, depositor, run.deposit)?;
        ledger.mint(token, trader, trader_funds)?;
    }

    let vault = Vault::new(
        account(0x30),
        RoleConfig::new(manager, keeper),
        Collaborators {
            pool: Arc::new(pool.clone()),
            tokens: Arc::new(ledger.clone()),
            oracle: Arc::new(FeeVolatilityOracle::new(pool.clone())),
            clock: Arc::new(clock.clone()),
        },
        config,
    )?;
    println!("🏦 Deployed {} ({})", vault.name(), vault.symbol());

    let shared = SharedVault::new(vault);
    let (shares, minted) = shared.with(|vault| {
        let quote = vault.quote_mint(run.deposit, run.deposit)?;
        let outcome = vault.mint(depositor, quote.shares, depositor)?;
        Ok((quote.shares, outcome))
    })?;
    println!(
        "💧 Deposited {} / {} for {} shares",
        format_tokens(minted.amount0),
        format_tokens(minted.amount1),
        format_tokens(shares)
    );

    let keeper = Keeper::new(shared.clone(), keeper, keeper_config)?;
    let mut flow = RandomTradeFlow::new(run.seed, run.min_trade, run.max_trade);
    let mut tally = Tally::default();

    println!(
        "🚀 Running {} steps of {} swaps...",
        run.steps, run.trades_per_step
    );
    for step in 0..run.steps {
        clock.advance(run.step_seconds);
        let summary = run_trades(&pool, trader, &mut flow, run.trades_per_step)?;
        tally.swaps += summary.swaps;
        tally.volume0 = tally.volume0.saturating_add(summary.volume0);
        tally.volume1 = tally.volume1.saturating_add(summary.volume1);

        tally.report.ticks += 1;
        match keeper.evaluate() {
            Ok(KeeperOutcome::Reinvested(outcome)) => {
                tally.report.reinvests += 1;
                info!(step, liquidity = outcome.liquidity_after, "Reinvested");
            }
            Ok(KeeperOutcome::Recentered(outcome)) => {
                tally.report.recenters += 1;
                info!(step, range = %outcome.new_range, "Recentered");
            }
            Ok(KeeperOutcome::Idle) => tally.report.idle += 1,
            Err(err) => {
                tally.report.failures += 1;
                warn!(step, error = %err, "Keeper evaluation failed");
            }
        }
    }

    let events = shared.with(|vault| Ok(vault.drain_events()))?;
    let mut event_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in &events {
        *event_counts.entry(event.kind.name()).or_default() += 1;
    }

    print_vault_summary(&shared, &tally)?;

    let withdrawal = shared.with(|vault| vault.withdraw_manager_balance(manager));
    let burned = shared.with(|vault| {
        let shares = vault.balance_of(depositor);
        vault.burn(depositor, shares, depositor)
    })?;

    let mut table = Table::new();
    table.add_row(row!["Exit", "Token0", "Token1"]);
    table.add_row(row![
        "Deposited",
        format_tokens(minted.amount0),
        format_tokens(minted.amount1)
    ]);
    table.add_row(row![
        "Withdrawn",
        format_tokens(burned.amount0),
        format_tokens(burned.amount1)
    ]);
    match withdrawal {
        Ok(paid) => {
            table.add_row(row![
                "Manager fees",
                format_tokens(paid.amounts.amount0),
                format_tokens(paid.amounts.amount1)
            ]);
        }
        Err(err) => println!("⚠️  Manager withdrawal skipped: {err}"),
    }
    println!("\n💸 Depositor exit");
    table.printstd();

    let mut table = Table::new();
    table.add_row(row!["Event", "Count"]);
    for (name, count) in event_counts {
        table.add_row(row![name, count]);
    }
    println!("\n📜 Events during the run");
    table.printstd();

    Ok(())
}

fn print_vault_summary(shared: &SharedVault, tally: &Tally) -> Result<()> {
    let (range, slot, liquidity, underlying, manager_balance, supply) = shared.with(|vault| {
        Ok((
            vault.range(),
            vault.slot0()?,
            vault.liquidity()?,
            vault.underlying_balances()?,
            vault.manager_balance(),
            vault.total_supply(),
        ))
    })?;
    let price = Price::from_sqrt_price_x96(slot.sqrt_price_x96)?;
    let (price_lower, price_upper) = (tick_price(range.lower), tick_price(range.upper));

    let mut table = Table::new();
    table.add_row(row!["Metric", "Value"]);
    table.add_row(row!["Swaps", tally.swaps]);
    table.add_row(row!["Volume token0", format_tokens(tally.volume0)]);
    table.add_row(row!["Volume token1", format_tokens(tally.volume1)]);
    table.add_row(row!["Keeper ticks", tally.report.ticks]);
    table.add_row(row!["Reinvests", tally.report.reinvests]);
    table.add_row(row!["Recenters", tally.report.recenters]);
    table.add_row(row!["Idle", tally.report.idle]);
    table.add_row(row!["Failures", tally.report.failures]);
    table.add_row(row!["Range", range]);
    table.add_row(row!["Range prices", format!("{price_lower} - {price_upper}")]);
    table.add_row(row!["Pool tick", slot.tick]);
    table.add_row(row!["Price", price]);
    table.add_row(row!["Inverse price", price.invert()]);
    table.add_row(row!["Liquidity", liquidity]);
    table.add_row(row!["Total supply", format_tokens(supply)]);
    table.add_row(row!["Underlying token0", format_tokens(underlying.amount0)]);
    table.add_row(row!["Underlying token1", format_tokens(underlying.amount1)]);
    table.add_row(row!["Manager token0", format_tokens(manager_balance.amount0)]);
    table.add_row(row!["Manager token1", format_tokens(manager_balance.amount1)]);

    println!("\n📊 Vault after {} steps", tally.report.ticks);
    table.printstd();
    Ok(())
}

/// Price at `tick`, or "unbounded" where it does not fit a decimal.
fn tick_price(tick: i32) -> String {
    Price::from_tick(tick)
        .map(|price| price.to_string())
        .unwrap_or_else(|_| "unbounded".to_string())
}

fn account(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn load_json<T>(path: Option<&Path>) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Whole tokens to base units.
fn to_wei(tokens: Decimal) -> Result<U256> {
    if tokens.is_sign_negative() {
        return Err(anyhow!("token amounts must not be negative"));
    }
    let scaled = tokens
        .checked_mul(Decimal::from(10u64.pow(TOKEN_DECIMALS)))
        .and_then(|value| value.trunc().to_u128())
        .ok_or_else(|| anyhow!("token amount {tokens} is too large"))?;
    Ok(U256::from(scaled))
}

/// Base units to whole tokens, falling back to the raw integer when it does
/// not fit a decimal.
fn format_tokens(amount: U256) -> String {
    if amount > U256::from(i128::MAX as u128) {
        return amount.to_string();
    }
    match Decimal::try_from_i128_with_scale(amount.low_u128() as i128, TOKEN_DECIMALS) {
        Ok(value) => value.round_dp(6).normalize().to_string(),
        Err(_) => amount.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_wei() {
        assert_eq!(to_wei(dec!(1)).unwrap(), U256::exp10(18));
        assert_eq!(to_wei(dec!(0.5)).unwrap(), U256::exp10(17) * U256::from(5u8));
        assert!(to_wei(dec!(-1)).is_err());
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(U256::exp10(18)), "1");
        assert_eq!(format_tokens(U256::exp10(15) * U256::from(1_500u32)), "1.5");
        assert_eq!(format_tokens(U256::zero()), "0");
        assert_eq!(format_tokens(U256::MAX), U256::MAX.to_string());
    }

    #[test]
    fn test_tick_price() {
        assert_eq!(tick_price(0), "1");
        assert_eq!(tick_price(887_220), "unbounded");
    }

    #[test]
    fn test_load_json_defaults_without_path() {
        let config: KeeperConfig = load_json(None).unwrap();
        assert_eq!(config, KeeperConfig::default());
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from(["swapsweep", "simulate", "--steps", "3", "--deposit", "10"])
            .unwrap();
        match cli.command {
            Commands::Simulate { steps, deposit, .. } => {
                assert_eq!(steps, 3);
                assert_eq!(deposit, dec!(10));
            }
            Commands::Config => panic!("expected simulate"),
        }
    }
}
