//! Day-by-day simulation of a leveraged position under a borrow-rate schedule

use super::rates::daily_rate;
use super::results::{SimulationPoint, YearSimulationResult};
use super::state::LoopPosition;
use crate::error::{check, CalcError, CalcResult};
use crate::stress::StressSchedule;

/// Default simulation horizon
pub const DEFAULT_SIMULATION_DAYS: u32 = 365;

/// Longest accepted horizon (ten years)
pub const MAX_SIMULATION_DAYS: u32 = 10 * 365;

/// Trajectory snapshot cadence
pub const SNAPSHOT_INTERVAL_DAYS: u32 = 7;

/// Inputs for one year simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Initial deposit, in collateral units
    pub initial_amount: f64,

    /// LTV the position is levered to via `1 / (1 - ltv)`
    pub ltv_target: f64,

    /// Annual supply rate as a decimal
    pub supply_apr: f64,

    /// Annual borrow rate outside stress periods, as a decimal
    pub borrow_apr: f64,

    /// Borrow-rate overrides
    pub schedule: StressSchedule,

    /// Horizon in days
    pub days: u32,
}

impl SimulationConfig {
    /// One-year simulation with no stress periods
    pub fn new(initial_amount: f64, ltv_target: f64, supply_apr: f64, borrow_apr: f64) -> Self {
        Self {
            initial_amount,
            ltv_target,
            supply_apr,
            borrow_apr,
            schedule: StressSchedule::none(),
            days: DEFAULT_SIMULATION_DAYS,
        }
    }

    pub fn with_schedule(mut self, schedule: StressSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        check::positive_amount("initial_amount", self.initial_amount)?;
        check::ltv("ltv_target", self.ltv_target)?;
        check::annual_rate("supply_apr", self.supply_apr)?;
        check::annual_rate("borrow_apr", self.borrow_apr)?;
        if self.days == 0 {
            return Err(CalcError::invalid("days", 0.0, "must be at least one day"));
        }
        if self.days > MAX_SIMULATION_DAYS {
            return Err(CalcError::invalid(
                "days",
                self.days as f64,
                "exceeds the ten-year simulation limit",
            ));
        }
        for period in self.schedule.periods() {
            period.validate()?;
        }
        Ok(())
    }
}

/// Simulates daily compounding of supply and borrow balances
pub struct YearSimulator {
    config: SimulationConfig,
}

impl YearSimulator {
    pub fn new(config: SimulationConfig) -> CalcResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the simulation
    ///
    /// Snapshots are taken at day 0, after every 7th day, and after the last
    /// day. A point's `day` is the number of days elapsed.
    pub fn run(&self) -> YearSimulationResult {
        let config = &self.config;
        let position = LoopPosition::at_target_ltv(config.initial_amount, config.ltv_target);

        let supply_daily = daily_rate(config.supply_apr);

        let mut supply = position.collateral;
        let mut borrow = position.debt;
        let mut total_supply_earned = 0.0;
        let mut total_borrow_paid = 0.0;

        let mut points = Vec::with_capacity((config.days / SNAPSHOT_INTERVAL_DAYS + 2) as usize);
        points.push(snapshot(0, supply, borrow));

        for day in 0..config.days {
            let borrow_daily = daily_rate(config.schedule.rate_for_day(day, config.borrow_apr));

            let supply_before = supply;
            let borrow_before = borrow;

            supply *= 1.0 + supply_daily;
            borrow *= 1.0 + borrow_daily;

            total_supply_earned += supply - supply_before;
            total_borrow_paid += borrow - borrow_before;

            let elapsed = day + 1;
            if elapsed % SNAPSHOT_INTERVAL_DAYS == 0 || elapsed == config.days {
                points.push(snapshot(elapsed, supply, borrow));
            }
        }

        let final_net_position = supply - borrow;
        let effective_net_apy = (final_net_position / config.initial_amount - 1.0) * 100.0;

        log::info!(
            "simulated {} days at ltv {:.4} ({} stress periods): net apy {:.2}%",
            config.days,
            config.ltv_target,
            config.schedule.periods().len(),
            effective_net_apy
        );

        YearSimulationResult {
            points,
            final_net_position,
            effective_net_apy,
            total_supply_earned,
            total_borrow_paid,
            leverage: position.leverage(),
            eff_ltv: config.ltv_target,
        }
    }
}

fn snapshot(day: u32, supply: f64, borrow: f64) -> SimulationPoint {
    SimulationPoint {
        day,
        net_position: supply - borrow,
        collateral: supply,
        debt: borrow,
    }
}

/// Validate `config` and run it
pub fn simulate_year(config: SimulationConfig) -> CalcResult<YearSimulationResult> {
    Ok(YearSimulator::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stress::{default_high_borrow_periods, HighBorrowPeriod};
    use approx::assert_relative_eq;

    fn base_config() -> SimulationConfig {
        SimulationConfig::new(100.0, 0.925, 0.0609, 0.0453)
    }

    #[test]
    fn test_reference_scenario() {
        let result = simulate_year(base_config()).unwrap();

        assert_relative_eq!(result.leverage, 13.3333, epsilon = 1e-3);
        assert_eq!(result.eff_ltv, 0.925);
        assert!(result.effective_net_apy > 0.0);
        assert!(
            result.effective_net_apy > 20.0 && result.effective_net_apy < 35.0,
            "net apy {}",
            result.effective_net_apy
        );
        assert_relative_eq!(
            result.final_net_position,
            100.0 + result.net_interest(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_snapshot_cadence() {
        let result = simulate_year(base_config()).unwrap();
        let days: Vec<u32> = result.points.iter().map(|p| p.day).collect();

        assert_eq!(days[0], 0);
        assert_eq!(days[1], 7);
        assert_eq!(*days.last().unwrap(), 365);
        // 0, 7..=364 (52 points), 365
        assert_eq!(days.len(), 54);
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_final_day_on_week_boundary_not_duplicated() {
        let result = simulate_year(base_config().with_days(14)).unwrap();
        let days: Vec<u32> = result.points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![0, 7, 14]);
    }

    #[test]
    fn test_idempotent() {
        let a = simulate_year(base_config()).unwrap();
        let b = simulate_year(base_config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.final_net_position.to_bits(), b.final_net_position.to_bits());
    }

    #[test]
    fn test_net_position_grows_with_positive_spread() {
        let result = simulate_year(base_config()).unwrap();
        assert!(result
            .points
            .windows(2)
            .all(|w| w[1].net_position > w[0].net_position));
    }

    #[test]
    fn test_out_of_range_period_is_noop() {
        let plain = simulate_year(base_config()).unwrap();
        let schedule = StressSchedule::new(vec![HighBorrowPeriod::new(400, 420, 0.9).unwrap()]).unwrap();
        let with_noop = simulate_year(base_config().with_schedule(schedule)).unwrap();
        assert_eq!(plain, with_noop);
    }

    #[test]
    fn test_stress_periods_reduce_yield() {
        let plain = simulate_year(base_config()).unwrap();
        let schedule = default_high_borrow_periods(0.25, 3, 15).unwrap();
        let stressed = simulate_year(base_config().with_schedule(schedule)).unwrap();

        assert!(stressed.effective_net_apy < plain.effective_net_apy);
        assert!(stressed.total_borrow_paid > plain.total_borrow_paid);
        assert_relative_eq!(
            stressed.total_supply_earned,
            plain.total_supply_earned,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(simulate_year(base_config().with_days(0)).is_err());
        assert!(simulate_year(SimulationConfig::new(100.0, 1.0, 0.06, 0.04)).is_err());
        assert!(simulate_year(SimulationConfig::new(-1.0, 0.5, 0.06, 0.04)).is_err());
    }

    #[test]
    fn test_horizon_limit() {
        let err = simulate_year(base_config().with_days(u32::MAX)).unwrap_err();
        assert!(matches!(err, CalcError::InvalidArgument { name: "days", .. }));
        assert!(simulate_year(base_config().with_days(MAX_SIMULATION_DAYS + 1)).is_err());

        let longest = simulate_year(base_config().with_days(MAX_SIMULATION_DAYS)).unwrap();
        assert_eq!(longest.points.last().unwrap().day, MAX_SIMULATION_DAYS);
    }

    #[test]
    fn test_overlapping_periods_use_first_rate() {
        let first = StressSchedule::new(vec![
            HighBorrowPeriod::new(30, 60, 0.30).unwrap(),
            HighBorrowPeriod::new(30, 60, 0.90).unwrap(),
        ])
        .unwrap();
        let only_first =
            StressSchedule::new(vec![HighBorrowPeriod::new(30, 60, 0.30).unwrap()]).unwrap();

        let a = simulate_year(base_config().with_schedule(first)).unwrap();
        let b = simulate_year(base_config().with_schedule(only_first)).unwrap();
        assert_eq!(a.final_net_position.to_bits(), b.final_net_position.to_bits());
    }
}
