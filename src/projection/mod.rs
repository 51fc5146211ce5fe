//! Projection engine for looped lending positions

mod engine;
mod loops;
mod rates;
mod results;
mod simulation;
mod state;
mod yield_projection;

pub use engine::{
    LeverageProjector, Projection, ProjectionConfig, ProjectionMode, DEFAULT_INITIAL_AMOUNT,
    DEFAULT_LOOPS, DEFAULT_MAX_SAFE_LTV,
};
pub use loops::{
    LoopBuilder, MaxSafeLoopSearch, StopReason, DEFAULT_MIN_BORROW, MAX_LOOP_ITERATIONS,
    MIN_BORROW_FLOOR,
};
pub use rates::{compound, daily_rate, monthly_rate, DAYS_PER_YEAR, MONTHS_PER_YEAR};
pub use results::{
    risk_warnings, LoopResult, SimulationPoint, StressComparison, StressSummaryRow,
    YearSimulationResult,
    LOW_DEPEG_BUFFER_PCT,
};
pub use simulation::{
    simulate_year, SimulationConfig, YearSimulator, DEFAULT_SIMULATION_DAYS,
    MAX_SIMULATION_DAYS, SNAPSHOT_INTERVAL_DAYS,
};
pub use state::LoopPosition;
pub use yield_projection::{
    project_iterative, project_target_ltv, YieldParams, DEFAULT_LIQUIDATION_BONUS,
};
