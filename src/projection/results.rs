//! Output records for loop projections and year simulations

use serde::{Deserialize, Serialize};

/// Depeg buffer (percent) below which a configuration is flagged as risky
pub const LOW_DEPEG_BUFFER_PCT: f64 = 10.0;

/// Yield and risk summary for one looped configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopResult {
    /// Borrow-swap-redeposit cycles performed
    pub loops: u32,

    /// Net APY on the initial amount, in percent
    pub net_apy: f64,

    /// Collateral / initial amount
    pub leverage: f64,

    /// Debt / collateral
    pub eff_ltv: f64,

    /// Collateral price drop (percent) that triggers liquidation
    pub depeg_to_liq: f64,

    /// Net yield over one year, in collateral units
    pub annual_yield: f64,

    /// Net yield over one year, in USD
    pub annual_usd: f64,

    /// Net position after one year, in collateral units
    pub final_position: f64,

    /// Collateral forfeited to the liquidation bonus if the whole debt were
    /// liquidated, in collateral units
    pub liquidation_loss: f64,
}

impl LoopResult {
    pub fn is_negative_yield(&self) -> bool {
        self.net_apy < 0.0
    }

    pub fn is_low_depeg_buffer(&self) -> bool {
        self.depeg_to_liq < LOW_DEPEG_BUFFER_PCT
    }
}

/// Human-readable warnings for a set of loop results
pub fn risk_warnings(results: &[LoopResult]) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if results.iter().any(LoopResult::is_negative_yield) {
        warnings.push("Some configurations result in negative APY.");
    }
    if results.iter().any(LoopResult::is_low_depeg_buffer) {
        warnings.push("Low depeg buffer detected (<10%). Consider fewer loops for safety.");
    }
    warnings
}

/// Snapshot of a simulated position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPoint {
    /// Days elapsed since the start of the simulation
    pub day: u32,
    pub net_position: f64,
    pub collateral: f64,
    pub debt: f64,
}

/// Complete year simulation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSimulationResult {
    /// Weekly trajectory plus the first and last day
    pub points: Vec<SimulationPoint>,

    pub final_net_position: f64,

    /// Growth of the net position over the horizon, in percent
    pub effective_net_apy: f64,

    pub total_supply_earned: f64,
    pub total_borrow_paid: f64,
    pub leverage: f64,
    pub eff_ltv: f64,
}

impl YearSimulationResult {
    /// Lowest net position seen at any snapshot
    pub fn min_net_position(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.net_position)
            .fold(self.final_net_position, f64::min)
    }

    /// Supply earned minus borrow interest paid
    pub fn net_interest(&self) -> f64 {
        self.total_supply_earned - self.total_borrow_paid
    }
}

/// Optimistic and stressed simulations of the same position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressComparison {
    pub optimistic: YearSimulationResult,
    pub stressed: YearSimulationResult,

    /// APY lost to the stress periods, in percentage points
    pub apy_drag: f64,
}

impl StressComparison {
    pub fn new(optimistic: YearSimulationResult, stressed: YearSimulationResult) -> Self {
        let apy_drag = optimistic.effective_net_apy - stressed.effective_net_apy;
        Self {
            optimistic,
            stressed,
            apy_drag,
        }
    }

    /// One flat record for tabular export
    pub fn summary_row(&self) -> StressSummaryRow {
        StressSummaryRow {
            ltv: self.stressed.eff_ltv,
            leverage: self.stressed.leverage,
            optimistic_apy: self.optimistic.effective_net_apy,
            stressed_apy: self.stressed.effective_net_apy,
            apy_drag: self.apy_drag,
            min_net_position: self.stressed.min_net_position(),
        }
    }
}

/// Flattened [`StressComparison`], one per LTV step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressSummaryRow {
    pub ltv: f64,
    pub leverage: f64,
    pub optimistic_apy: f64,
    pub stressed_apy: f64,
    pub apy_drag: f64,
    pub min_net_position: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(net_apy: f64, depeg_to_liq: f64) -> LoopResult {
        LoopResult {
            loops: 1,
            net_apy,
            leverage: 1.8,
            eff_ltv: 0.44,
            depeg_to_liq,
            annual_yield: 0.0,
            annual_usd: 0.0,
            final_position: 0.0,
            liquidation_loss: 0.0,
        }
    }

    #[test]
    fn test_risk_warnings() {
        assert!(risk_warnings(&[result(5.0, 50.0)]).is_empty());

        let warnings = risk_warnings(&[result(5.0, 50.0), result(-1.0, 4.0)]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("negative APY"));
        assert!(warnings[1].contains("depeg"));
    }

    #[test]
    fn test_camel_case_serialization() {
        let json = serde_json::to_string(&result(5.0, 50.0)).unwrap();
        assert!(json.contains("\"netApy\":5.0"));
        assert!(json.contains("\"depegToLiq\":50.0"));
    }

    #[test]
    fn test_min_net_position() {
        let point = |day, net_position| SimulationPoint {
            day,
            net_position,
            collateral: 0.0,
            debt: 0.0,
        };
        let sim = YearSimulationResult {
            points: vec![point(0, 100.0), point(7, 98.0), point(14, 101.0)],
            final_net_position: 101.0,
            effective_net_apy: 1.0,
            total_supply_earned: 3.0,
            total_borrow_paid: 2.0,
            leverage: 2.0,
            eff_ltv: 0.5,
        };
        assert_eq!(sim.min_net_position(), 98.0);
        assert_eq!(sim.net_interest(), 1.0);
    }

    #[test]
    fn test_stress_summary_row() {
        let sim = |net_apy, final_net_position| YearSimulationResult {
            points: vec![],
            final_net_position,
            effective_net_apy: net_apy,
            total_supply_earned: 0.0,
            total_borrow_paid: 0.0,
            leverage: 10.0,
            eff_ltv: 0.9,
        };
        let row = StressComparison::new(sim(30.0, 130.0), sim(22.5, 122.5)).summary_row();

        assert_eq!(row.ltv, 0.9);
        assert_eq!(row.leverage, 10.0);
        assert_eq!(row.optimistic_apy, 30.0);
        assert_eq!(row.stressed_apy, 22.5);
        assert_eq!(row.apy_drag, 7.5);
        assert_eq!(row.min_net_position, 122.5);

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("ltv,leverage,optimisticApy,stressedApy,apyDrag,minNetPosition\n"));
    }
}
