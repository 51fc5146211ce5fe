//! Leverage Projector - yield and risk projections for looped lending positions
//!
//! This library provides:
//! - Iterative borrow-swap-redeposit loop construction and max-safe searches
//! - One-year yield projections by loop count or by target LTV
//! - Day-by-day simulations under borrow-rate stress schedules
//! - Comparison tables across LTV steps, loop counts and stress scenarios
//! - The market-data contract with fallback substitution

pub mod error;
pub mod market;
pub mod projection;
pub mod scenario;
pub mod stress;

// Re-export commonly used types
pub use error::{CalcError, CalcResult};
pub use market::{MarketQuote, MarketRates, MarketSource, FALLBACK_RATES};
pub use projection::{LeverageProjector, LoopResult, Projection, ProjectionConfig, ProjectionMode, YearSimulationResult};
pub use scenario::ComparisonGenerator;
pub use stress::{HighBorrowPeriod, StressSchedule};
