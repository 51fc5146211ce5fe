//! Leverage projector: one entry point for every projection mode

use serde::Serialize;

use super::loops::{LoopBuilder, MaxSafeLoopSearch, DEFAULT_MIN_BORROW};
use super::results::{LoopResult, YearSimulationResult};
use super::simulation::{SimulationConfig, YearSimulator, DEFAULT_SIMULATION_DAYS};
use super::yield_projection::{project_iterative, project_target_ltv, YieldParams, DEFAULT_LIQUIDATION_BONUS};
use crate::error::{check, CalcResult};
use crate::market::MarketRates;
use crate::stress::StressSchedule;

/// Default initial deposit, in collateral units
pub const DEFAULT_INITIAL_AMOUNT: f64 = 1000.0;

/// Default number of loops shown
pub const DEFAULT_LOOPS: u32 = 5;

/// Default safety ceiling for the max-safe search
pub const DEFAULT_MAX_SAFE_LTV: f64 = 0.92;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Initial deposit, in collateral units
    pub initial_amount: f64,

    /// Smallest borrow increment worth another loop
    pub min_borrow: f64,

    /// Liquidation bonus as a decimal
    pub liquidation_bonus: f64,

    /// What to project
    pub mode: ProjectionMode,
}

/// How the leveraged position is built and projected
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionMode {
    /// Fixed number of loops at the market LTV, compounded monthly
    LoopCount { loops: u32 },

    /// As many loops as fit under a safety LTV, compounded monthly
    MaxSafe { max_safe_ltv: f64 },

    /// Closed-form leverage at a target LTV, compounded daily
    TargetLtv { ltv_target: f64 },

    /// Daily simulation at a target LTV under a borrow-rate schedule
    Stress {
        ltv_target: f64,
        schedule: StressSchedule,
        days: u32,
    },
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            min_borrow: DEFAULT_MIN_BORROW,
            liquidation_bonus: DEFAULT_LIQUIDATION_BONUS,
            mode: ProjectionMode::LoopCount { loops: DEFAULT_LOOPS },
        }
    }
}

impl ProjectionConfig {
    pub fn with_mode(&self, mode: ProjectionMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

/// Output of a projection run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum Projection {
    Loop(LoopResult),
    Year(YearSimulationResult),
}

/// Main projection engine
#[derive(Debug, Clone)]
pub struct LeverageProjector {
    rates: MarketRates,
    config: ProjectionConfig,
}

impl LeverageProjector {
    /// Create a projector, validating market rates and amounts up front
    pub fn new(rates: MarketRates, config: ProjectionConfig) -> CalcResult<Self> {
        rates.validate()?;
        check::positive_amount("initial_amount", config.initial_amount)?;
        check::non_negative("liquidation_bonus", config.liquidation_bonus)?;
        Ok(Self { rates, config })
    }

    pub fn rates(&self) -> &MarketRates {
        &self.rates
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Run the configured mode
    pub fn project(&self) -> CalcResult<Projection> {
        match &self.config.mode {
            ProjectionMode::LoopCount { loops } => self.project_loops(*loops).map(Projection::Loop),
            ProjectionMode::MaxSafe { max_safe_ltv } => {
                self.project_max_safe(*max_safe_ltv).map(Projection::Loop)
            }
            ProjectionMode::TargetLtv { ltv_target } => {
                self.project_target_ltv(*ltv_target).map(Projection::Loop)
            }
            ProjectionMode::Stress {
                ltv_target,
                schedule,
                days,
            } => self
                .simulate(*ltv_target, schedule.clone(), *days)
                .map(Projection::Year),
        }
    }

    /// Project `loops` cycles at the market LTV
    pub fn project_loops(&self, loops: u32) -> CalcResult<LoopResult> {
        let position = LoopBuilder::new(self.rates.ltv, self.config.min_borrow)?
            .build(self.config.initial_amount, loops)?;
        Ok(project_iterative(&position, &self.yield_params()?))
    }

    /// Project the deepest loop count whose effective LTV stays under
    /// `max_safe_ltv`
    pub fn project_max_safe(&self, max_safe_ltv: f64) -> CalcResult<LoopResult> {
        let position = MaxSafeLoopSearch::new(self.rates.ltv, max_safe_ltv, self.config.min_borrow)?
            .search(self.config.initial_amount)?;
        Ok(project_iterative(&position, &self.yield_params()?))
    }

    /// Project the closed-form position at `ltv_target`
    pub fn project_target_ltv(&self, ltv_target: f64) -> CalcResult<LoopResult> {
        project_target_ltv(
            self.config.initial_amount,
            ltv_target,
            &self.yield_params()?,
            self.config.min_borrow,
        )
    }

    /// Simulate `days` days at `ltv_target` under `schedule`
    pub fn simulate(
        &self,
        ltv_target: f64,
        schedule: StressSchedule,
        days: u32,
    ) -> CalcResult<YearSimulationResult> {
        let config = SimulationConfig::new(
            self.config.initial_amount,
            ltv_target,
            self.rates.supply_rate(),
            self.rates.borrow_rate(),
        )
        .with_schedule(schedule)
        .with_days(days);
        Ok(YearSimulator::new(config)?.run())
    }

    /// One-year simulation with no stress periods
    pub fn simulate_optimistic(&self, ltv_target: f64) -> CalcResult<YearSimulationResult> {
        self.simulate(ltv_target, StressSchedule::none(), DEFAULT_SIMULATION_DAYS)
    }

    fn yield_params(&self) -> CalcResult<YieldParams> {
        YieldParams::from_market(&self.rates, self.config.liquidation_bonus)
    }
}
