//! Leverage Projector CLI
//!
//! Command-line interface for loop, max-safe, comparison and stress projections

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use leverage_projector::market::{load_quote, MarketQuote, ResolvedMarket, FALLBACK_RATES};
use leverage_projector::projection::{
    risk_warnings, LoopResult, ProjectionConfig, StressComparison, YearSimulationResult,
    DEFAULT_INITIAL_AMOUNT, DEFAULT_LIQUIDATION_BONUS, DEFAULT_LOOPS, DEFAULT_MAX_SAFE_LTV,
    DEFAULT_MIN_BORROW, DEFAULT_SIMULATION_DAYS,
};
use leverage_projector::scenario::{ComparisonGenerator, DEFAULT_LTV_STEPS};
use leverage_projector::stress::{
    default_high_borrow_periods, load_periods, StressSchedule, DEFAULT_DAYS_PER_PERIOD,
    DEFAULT_NUM_PERIODS,
};

/// Borrow APR assumed during stress periods when none is given
const DEFAULT_HIGH_BORROW_APR: f64 = 0.25;

#[derive(Parser)]
#[command(
    name = "leverage-projector",
    version,
    about = "Yield and liquidation-risk projections for looped lending positions",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    market: MarketArgs,

    /// Initial deposit, in collateral units
    #[arg(long, global = true, default_value_t = DEFAULT_INITIAL_AMOUNT)]
    amount: f64,

    /// Smallest borrow increment worth another loop
    #[arg(long, global = true, default_value_t = DEFAULT_MIN_BORROW)]
    min_borrow: f64,

    /// Liquidation bonus as a decimal
    #[arg(long, global = true, default_value_t = DEFAULT_LIQUIDATION_BONUS)]
    liq_bonus: f64,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Also write the result rows to this CSV file
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MarketArgs {
    /// Market record produced by the rate collaborator (JSON).
    /// Fallback rates are used when omitted or unreadable.
    #[arg(long, global = true)]
    market: Option<PathBuf>,

    /// Override supply APY (percent)
    #[arg(long, global = true)]
    supply_apy: Option<f64>,

    /// Override borrow APY (percent)
    #[arg(long, global = true)]
    borrow_apy: Option<f64>,

    /// Override e-Mode LTV (ratio)
    #[arg(long, global = true)]
    ltv: Option<f64>,

    /// Override liquidation threshold (ratio)
    #[arg(long, global = true)]
    liquidation_threshold: Option<f64>,

    /// Override collateral price (USD)
    #[arg(long, global = true)]
    price: Option<f64>,
}

#[derive(Args)]
struct StressArgs {
    /// CSV schedule with columns start_day,end_day,borrow_apy
    #[arg(long)]
    schedule: Option<PathBuf>,

    /// Borrow APR during generated stress periods (decimal)
    #[arg(long)]
    high_borrow_apr: Option<f64>,

    /// Number of generated stress periods
    #[arg(long, default_value_t = DEFAULT_NUM_PERIODS)]
    periods: u32,

    /// Length of each generated stress period, in days
    #[arg(long, default_value_t = DEFAULT_DAYS_PER_PERIOD)]
    period_days: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Project 1..=N loops at the market LTV
    Loops {
        #[arg(long, default_value_t = DEFAULT_LOOPS)]
        loops: u32,

        /// Safety ceiling used to mark the max-safe loop count
        #[arg(long, default_value_t = DEFAULT_MAX_SAFE_LTV)]
        max_safe_ltv: f64,
    },
    /// Find the deepest loop count under a safety LTV
    MaxSafe {
        #[arg(long, default_value_t = DEFAULT_MAX_SAFE_LTV)]
        max_safe_ltv: f64,
    },
    /// Compare closed-form leverage across LTV steps
    Compare {
        /// Comma-separated LTV steps
        #[arg(long, value_delimiter = ',')]
        ltv_steps: Vec<f64>,
    },
    /// Simulate one position day by day
    Simulate {
        /// Target LTV (defaults to the market LTV)
        #[arg(long)]
        ltv_target: Option<f64>,

        #[arg(long, default_value_t = DEFAULT_SIMULATION_DAYS)]
        days: u32,

        #[command(flatten)]
        stress: StressArgs,
    },
    /// Optimistic vs stressed year across LTV steps
    Stress {
        /// Comma-separated LTV steps
        #[arg(long, value_delimiter = ',')]
        ltv_steps: Vec<f64>,

        #[command(flatten)]
        stress: StressArgs,
    },
}

impl MarketArgs {
    fn resolve(&self) -> ResolvedMarket {
        let quote = match &self.market {
            Some(path) => load_quote(path),
            None => MarketQuote::Fallback(FALLBACK_RATES),
        };
        let mut resolved = quote.resolve();

        let rates = &mut resolved.rates;
        if let Some(v) = self.supply_apy {
            rates.supply_apy = v;
        }
        if let Some(v) = self.borrow_apy {
            rates.borrow_apy = v;
        }
        if let Some(v) = self.ltv {
            rates.ltv = v;
        }
        if let Some(v) = self.liquidation_threshold {
            rates.liquidation_threshold = v;
        }
        if let Some(v) = self.price {
            rates.price = v;
        }
        resolved
    }
}

impl StressArgs {
    /// Schedule from file, generated periods, or `default_apr` periods
    fn schedule(&self, default_apr: Option<f64>) -> Result<StressSchedule> {
        if let Some(path) = &self.schedule {
            return load_periods(path)
                .with_context(|| format!("Failed to load stress schedule {}", path.display()));
        }
        match self.high_borrow_apr.or(default_apr) {
            Some(apr) => Ok(default_high_borrow_periods(apr, self.periods, self.period_days)?),
            None => Ok(StressSchedule::none()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let market = cli.market.resolve();
    log::info!("using {:?} market rates: {:?}", market.source, market.rates);

    let config = ProjectionConfig {
        initial_amount: cli.amount,
        min_borrow: cli.min_borrow,
        liquidation_bonus: cli.liq_bonus,
        ..Default::default()
    };
    let generator = ComparisonGenerator::new(market.rates, config)
        .context("Invalid market rates or projection inputs")?;

    if !cli.json {
        print_market_header(&market);
    }

    match &cli.command {
        Commands::Loops { loops, max_safe_ltv } => {
            let rows = generator.loop_comparison(*loops)?;
            let max_safe = generator.projector().project_max_safe(*max_safe_ltv)?;
            if cli.json {
                print_json(&serde_json::json!({ "loops": rows, "maxSafe": max_safe }))?;
            } else {
                print_loop_table(&rows, Some(max_safe.loops));
                println!();
                print_max_safe(&max_safe, *max_safe_ltv);
                print_warnings(&rows);
            }
            write_csv_if_requested(cli.csv.as_deref(), &rows)?;
        }
        Commands::MaxSafe { max_safe_ltv } => {
            let max_safe = generator.projector().project_max_safe(*max_safe_ltv)?;
            if cli.json {
                print_json(&max_safe)?;
            } else {
                print_max_safe(&max_safe, *max_safe_ltv);
            }
            write_csv_if_requested(cli.csv.as_deref(), &[max_safe])?;
        }
        Commands::Compare { ltv_steps } => {
            let steps = steps_or_default(ltv_steps);
            let rows = generator.ltv_comparison(&steps)?;
            if cli.json {
                print_json(&rows)?;
            } else {
                print_loop_table(&rows, None);
                print_warnings(&rows);
            }
            write_csv_if_requested(cli.csv.as_deref(), &rows)?;
        }
        Commands::Simulate {
            ltv_target,
            days,
            stress,
        } => {
            let ltv_target = ltv_target.unwrap_or(market.rates.ltv);
            let schedule = stress.schedule(None)?;
            let result = generator.projector().simulate(ltv_target, schedule, *days)?;
            if cli.json {
                print_json(&result)?;
            } else {
                print_simulation(&result);
            }
            write_csv_if_requested(cli.csv.as_deref(), &result.points)?;
        }
        Commands::Stress { ltv_steps, stress } => {
            let steps = steps_or_default(ltv_steps);
            let schedule = stress.schedule(Some(DEFAULT_HIGH_BORROW_APR))?;
            let table = generator.stress_table(&steps, &schedule)?;
            if cli.json {
                print_json(&table)?;
            } else {
                println!(
                    "Stress periods: {} ({} days stressed)",
                    schedule.periods().len(),
                    schedule.stressed_days(DEFAULT_SIMULATION_DAYS)
                );
                println!("{:>7} {:>9} {:>14} {:>14} {:>10} {:>12}",
                    "LTV", "Leverage", "Optimistic %", "Stressed %", "Drag pp", "Min Net");
                println!("{}", "-".repeat(72));
                for row in &table {
                    println!("{:>6.1}% {:>8.2}x {:>14.2} {:>14.2} {:>10.2} {:>12.2}",
                        row.stressed.eff_ltv * 100.0,
                        row.stressed.leverage,
                        row.optimistic.effective_net_apy,
                        row.stressed.effective_net_apy,
                        row.apy_drag,
                        row.stressed.min_net_position(),
                    );
                }
            }
            let rows: Vec<_> = table.iter().map(StressComparison::summary_row).collect();
            write_csv_if_requested(cli.csv.as_deref(), &rows)?;
        }
    }

    Ok(())
}

fn steps_or_default(steps: &[f64]) -> Vec<f64> {
    if steps.is_empty() {
        DEFAULT_LTV_STEPS.to_vec()
    } else {
        steps.to_vec()
    }
}

fn print_market_header(market: &ResolvedMarket) {
    let rates = &market.rates;
    println!("Leverage Projector v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    println!("Market ({:?}, {}):", market.source, market.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Supply APY: {:.2}%", rates.supply_apy);
    println!("  Borrow APY: {:.2}%", rates.borrow_apy);
    println!("  LTV: {:.3}  Liq. Threshold: {:.3}", rates.ltv, rates.liquidation_threshold);
    println!("  Price: ${:.2}", rates.price);
    println!();
}

fn print_loop_table(rows: &[LoopResult], max_safe_loops: Option<u32>) {
    println!("{:>5} {:>7} {:>9} {:>9} {:>9} {:>12} {:>12} {:>12}",
        "Loops", "LTV", "Leverage", "Net APY", "Depeg", "Final", "Annual", "Annual $");
    println!("{}", "-".repeat(84));

    for row in rows {
        let marker = match max_safe_loops {
            Some(n) if row.loops > n => " !",
            _ => "",
        };
        println!("{:>5} {:>6.1}% {:>8.2}x {:>8.2}% {:>8.2}% {:>12.2} {:>12.2} {:>12.0}{}",
            row.loops,
            row.eff_ltv * 100.0,
            row.leverage,
            row.net_apy,
            row.depeg_to_liq,
            row.final_position,
            row.annual_yield,
            row.annual_usd,
            marker,
        );
    }
}

fn print_max_safe(result: &LoopResult, max_safe_ltv: f64) {
    println!("Max Safe Loops: {}", result.loops);
    println!("  Effective LTV stays below {:.0}% (assuming no depeg)", max_safe_ltv * 100.0);
    println!("  Leverage: {:.2}x", result.leverage);
    println!("  Net APY: {:.2}%", result.net_apy);
    println!("  Depeg to liquidation: {:.2}%", result.depeg_to_liq);
    println!("  Liquidation loss at full liquidation: {:.2}", result.liquidation_loss);
}

fn print_warnings(rows: &[LoopResult]) {
    for warning in risk_warnings(rows) {
        println!("WARNING: {}", warning);
    }
}

fn print_simulation(result: &YearSimulationResult) {
    println!("{:>5} {:>14} {:>14} {:>14}", "Day", "Collateral", "Debt", "Net");
    println!("{}", "-".repeat(50));
    for point in &result.points {
        println!("{:>5} {:>14.4} {:>14.4} {:>14.4}",
            point.day, point.collateral, point.debt, point.net_position);
    }

    println!("\nSummary:");
    println!("  Leverage: {:.2}x at LTV {:.3}", result.leverage, result.eff_ltv);
    println!("  Final net position: {:.4}", result.final_net_position);
    println!("  Effective net APY: {:.2}%", result.effective_net_apy);
    println!("  Supply earned: {:.4}", result.total_supply_earned);
    println!("  Borrow paid: {:.4}", result.total_borrow_paid);
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_csv_if_requested<T: Serialize>(path: Option<&Path>, rows: &[T]) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    eprintln!("Results written to: {}", path.display());
    Ok(())
}
