//! Sweep stress scenarios across LTV targets and stress borrow rates
//!
//! Every (LTV, stress APR) cell is an independent year simulation run in
//! parallel. Accepts config via environment variables:
//!   SWEEP_INITIAL_AMOUNT, SWEEP_HIGH_BORROW_APRS (comma-separated),
//!   SWEEP_DAYS, SWEEP_OUTPUT
//! Market rates come from SWEEP_MARKET (JSON record) or fall back.

use anyhow::{Context, Result};
use leverage_projector::{
    market::{load_quote, MarketQuote, FALLBACK_RATES},
    projection::{ProjectionConfig, DEFAULT_SIMULATION_DAYS},
    scenario::{ComparisonGenerator, DEFAULT_LTV_STEPS},
    stress::{default_high_borrow_periods, DEFAULT_DAYS_PER_PERIOD, DEFAULT_NUM_PERIODS},
    StressSchedule,
};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

/// One cell of the sweep grid
#[derive(Debug, Clone, Serialize)]
struct SweepRow {
    ltv: f64,
    leverage: f64,
    high_borrow_apr: f64,
    optimistic_apy: f64,
    stressed_apy: f64,
    apy_drag: f64,
    min_net_position: f64,
    final_net_position: f64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[f64]) -> Vec<f64> {
    env::var(key)
        .ok()
        .map(|s| s.split(',').filter_map(|v| v.trim().parse().ok()).collect::<Vec<f64>>())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_vec())
}

fn main() -> Result<()> {
    env_logger::init();

    let start = Instant::now();

    let initial_amount: f64 = env_or("SWEEP_INITIAL_AMOUNT", 1000.0);
    let days: u32 = env_or("SWEEP_DAYS", DEFAULT_SIMULATION_DAYS);
    let output_path: String = env_or("SWEEP_OUTPUT", "stress_sweep_output.csv".to_string());
    let high_aprs = env_list("SWEEP_HIGH_BORROW_APRS", &[0.10, 0.15, 0.25, 0.40]);

    let quote = match env::var("SWEEP_MARKET") {
        Ok(path) => load_quote(Path::new(&path)),
        Err(_) => MarketQuote::Fallback(FALLBACK_RATES),
    };
    let market = quote.resolve();
    println!("Market source: {:?}", market.source);

    let config = ProjectionConfig {
        initial_amount,
        ..Default::default()
    };
    let generator = ComparisonGenerator::new(market.rates, config)?;

    let schedules: Vec<(f64, StressSchedule)> = high_aprs
        .iter()
        .map(|&apr| {
            default_high_borrow_periods(apr, DEFAULT_NUM_PERIODS, DEFAULT_DAYS_PER_PERIOD)
                .map(|s| (apr, s))
        })
        .collect::<Result<_, _>>()?;

    let grid: Vec<(f64, &(f64, StressSchedule))> = DEFAULT_LTV_STEPS
        .iter()
        .flat_map(|&ltv| schedules.iter().map(move |s| (ltv, s)))
        .collect();

    println!("Running {} simulations...", grid.len());
    let sim_start = Instant::now();

    // Run simulations in parallel
    let rows: Vec<SweepRow> = grid
        .par_iter()
        .map(|(ltv, (apr, schedule))| {
            generator.stress_comparison(*ltv, schedule, days).map(|cmp| SweepRow {
                ltv: *ltv,
                leverage: cmp.stressed.leverage,
                high_borrow_apr: *apr,
                optimistic_apy: cmp.optimistic.effective_net_apy,
                stressed_apy: cmp.stressed.effective_net_apy,
                apy_drag: cmp.apy_drag,
                min_net_position: cmp.stressed.min_net_position(),
                final_net_position: cmp.stressed.final_net_position,
            })
        })
        .collect::<Result<_, _>>()?;

    println!("Simulations complete in {:?}", sim_start.elapsed());

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Failed to create output file {}", output_path))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Output written to {}", output_path);

    // Worst cell per stress rate
    println!("\nWorst stressed APY by stress rate:");
    for (apr, _) in &schedules {
        if let Some(worst) = rows
            .iter()
            .filter(|r| r.high_borrow_apr == *apr)
            .min_by(|a, b| a.stressed_apy.total_cmp(&b.stressed_apy))
        {
            println!("  {:>5.1}% stress APR: {:>7.2}% at LTV {:.3}",
                apr * 100.0, worst.stressed_apy, worst.ltv);
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
