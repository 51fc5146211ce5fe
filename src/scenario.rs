//! Comparison tables over LTV steps, loop counts and stress scenarios
//!
//! Each entry is an independent projection from the same base rates and
//! config; nothing is shared between entries.

use crate::error::{CalcError, CalcResult};
use crate::market::MarketRates;
use crate::projection::{
    LeverageProjector, LoopResult, ProjectionConfig, StressComparison, DEFAULT_SIMULATION_DAYS,
};
use crate::stress::StressSchedule;

/// LTV steps shown in the default comparison table
pub const DEFAULT_LTV_STEPS: [f64; 8] = [0.5, 0.6, 0.7, 0.8, 0.85, 0.9, 0.92, 0.925];

/// Longest loop table a caller may request
pub const MAX_TABLE_LOOPS: u32 = 200;

/// Loops past the max-safe count shown in chart series
const CHART_EXTRA_LOOPS: u32 = 2;

/// Generates ordered comparison tables from one set of market rates
///
/// # Example
/// ```ignore
/// let generator = ComparisonGenerator::new(FALLBACK_RATES, ProjectionConfig::default())?;
/// for row in generator.ltv_comparison(&DEFAULT_LTV_STEPS)? {
///     println!("{:.3} -> {:.2}%", row.eff_ltv, row.net_apy);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ComparisonGenerator {
    projector: LeverageProjector,
}

impl ComparisonGenerator {
    pub fn new(rates: MarketRates, config: ProjectionConfig) -> CalcResult<Self> {
        Ok(Self {
            projector: LeverageProjector::new(rates, config)?,
        })
    }

    pub fn with_projector(projector: LeverageProjector) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &LeverageProjector {
        &self.projector
    }

    /// Closed-form projections, one per LTV step, in input order
    pub fn ltv_comparison(&self, ltv_steps: &[f64]) -> CalcResult<Vec<LoopResult>> {
        ltv_steps
            .iter()
            .map(|&ltv| self.projector.project_target_ltv(ltv))
            .collect()
    }

    /// Iterative projections for 1..=max_loops loops
    pub fn loop_comparison(&self, max_loops: u32) -> CalcResult<Vec<LoopResult>> {
        if max_loops > MAX_TABLE_LOOPS {
            return Err(CalcError::invalid(
                "max_loops",
                max_loops as f64,
                "loop table is limited to 200 rows",
            ));
        }
        (1..=max_loops)
            .map(|n| self.projector.project_loops(n))
            .collect()
    }

    /// Loop series wide enough to show the max-safe point plus a margin
    ///
    /// Covers `1..=max(max_safe.loops + 2, max_loops)`. The max-safe margin is
    /// cut at [`MAX_TABLE_LOOPS`]; an explicit `max_loops` above it is an error.
    pub fn chart_series(&self, max_loops: u32, max_safe_ltv: f64) -> CalcResult<Vec<LoopResult>> {
        let max_safe = self.projector.project_max_safe(max_safe_ltv)?;
        let span = (max_safe.loops + CHART_EXTRA_LOOPS).min(MAX_TABLE_LOOPS);
        self.loop_comparison(span.max(max_loops))
    }

    /// Optimistic (no stress) and stressed one-year runs of the same position
    pub fn stress_comparison(
        &self,
        ltv_target: f64,
        schedule: &StressSchedule,
        days: u32,
    ) -> CalcResult<StressComparison> {
        let optimistic = self.projector.simulate(ltv_target, StressSchedule::none(), days)?;
        let stressed = self.projector.simulate(ltv_target, schedule.clone(), days)?;
        Ok(StressComparison::new(optimistic, stressed))
    }

    /// Stress comparison per LTV step over a one-year horizon
    pub fn stress_table(
        &self,
        ltv_steps: &[f64],
        schedule: &StressSchedule,
    ) -> CalcResult<Vec<StressComparison>> {
        ltv_steps
            .iter()
            .map(|&ltv| self.stress_comparison(ltv, schedule, DEFAULT_SIMULATION_DAYS))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::FALLBACK_RATES;
    use crate::stress::default_high_borrow_periods;

    fn generator() -> ComparisonGenerator {
        ComparisonGenerator::new(FALLBACK_RATES, ProjectionConfig::default()).unwrap()
    }

    #[test]
    fn test_ltv_comparison_order_and_monotonicity() {
        let rows = generator().ltv_comparison(&DEFAULT_LTV_STEPS).unwrap();
        assert_eq!(rows.len(), DEFAULT_LTV_STEPS.len());

        for (row, &ltv) in rows.iter().zip(DEFAULT_LTV_STEPS.iter()) {
            assert!((row.eff_ltv - ltv).abs() < 1e-12);
        }
        // Positive spread: more leverage, more yield, less depeg buffer
        assert!(rows.windows(2).all(|w| w[1].net_apy > w[0].net_apy));
        assert!(rows.windows(2).all(|w| w[1].depeg_to_liq < w[0].depeg_to_liq));
    }

    #[test]
    fn test_ltv_comparison_rejects_bad_step() {
        assert!(generator().ltv_comparison(&[0.5, 1.0]).is_err());
    }

    #[test]
    fn test_loop_comparison() {
        let rows = generator().loop_comparison(5).unwrap();
        let loops: Vec<u32> = rows.iter().map(|r| r.loops).collect();
        assert_eq!(loops, vec![1, 2, 3, 4, 5]);
        assert!(generator().loop_comparison(0).unwrap().is_empty());
    }

    #[test]
    fn test_loop_comparison_limit() {
        let generator = generator();
        let err = generator.loop_comparison(u32::MAX).unwrap_err();
        assert!(matches!(err, CalcError::InvalidArgument { name: "max_loops", .. }));
        assert!(generator.chart_series(MAX_TABLE_LOOPS + 1, 0.92).is_err());
        assert_eq!(
            generator.loop_comparison(MAX_TABLE_LOOPS).unwrap().len() as u32,
            MAX_TABLE_LOOPS
        );
    }

    #[test]
    fn test_chart_series_margin_is_capped() {
        // Floor-clamped min borrow and a loose ceiling: max safe runs past 300 loops
        let config = ProjectionConfig {
            min_borrow: 0.0,
            ..Default::default()
        };
        let generator = ComparisonGenerator::new(FALLBACK_RATES, config).unwrap();
        let max_safe = generator.projector().project_max_safe(0.99).unwrap();
        assert!(max_safe.loops > MAX_TABLE_LOOPS);

        let series = generator.chart_series(5, 0.99).unwrap();
        assert_eq!(series.len() as u32, MAX_TABLE_LOOPS);
    }

    #[test]
    fn test_chart_series_covers_max_safe() {
        let generator = generator();
        let max_safe = generator.projector().project_max_safe(0.92).unwrap();
        let series = generator.chart_series(5, 0.92).unwrap();
        assert_eq!(series.len() as u32, (max_safe.loops + 2).max(5));
    }

    #[test]
    fn test_stress_table() {
        let schedule = default_high_borrow_periods(0.25, 3, 15).unwrap();
        let table = generator().stress_table(&[0.8, 0.925], &schedule).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|c| c.apy_drag > 0.0));
        // Higher leverage feels the stress more
        assert!(table[1].apy_drag > table[0].apy_drag);
    }
}
