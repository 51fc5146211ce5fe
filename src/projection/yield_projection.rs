//! One-year yield projection for looped positions
//!
//! Two projection modes are supported:
//! - **Iterative**: a position built by a finite number of loops, compounded
//!   monthly over 12 periods.
//! - **Target LTV**: the closed-form fully-leveraged position
//!   `leverage = 1 / (1 - ltv)`, compounded daily over 365 days.

use super::loops::LoopBuilder;
use super::rates::{compound, daily_rate, monthly_rate, DAYS_PER_YEAR, MONTHS_PER_YEAR};
use super::results::LoopResult;
use super::state::LoopPosition;
use crate::error::{check, CalcResult};
use crate::market::MarketRates;

/// Default liquidation bonus paid to liquidators (15%)
pub const DEFAULT_LIQUIDATION_BONUS: f64 = 0.15;

/// Rates and risk parameters shared by both projection modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldParams {
    /// Annual supply rate as a decimal
    pub supply_rate: f64,

    /// Annual borrow rate as a decimal
    pub borrow_rate: f64,

    pub liquidation_threshold: f64,

    /// USD per collateral unit
    pub price: f64,

    /// Share of repaid debt a liquidator receives on top, as a decimal
    pub liquidation_bonus: f64,
}

impl YieldParams {
    pub fn new(
        supply_rate: f64,
        borrow_rate: f64,
        liquidation_threshold: f64,
        price: f64,
        liquidation_bonus: f64,
    ) -> CalcResult<Self> {
        Ok(Self {
            supply_rate: check::annual_rate("supply_rate", supply_rate)?,
            borrow_rate: check::annual_rate("borrow_rate", borrow_rate)?,
            liquidation_threshold: check::liquidation_threshold(liquidation_threshold)?,
            price: check::non_negative("price", price)?,
            liquidation_bonus: check::non_negative("liquidation_bonus", liquidation_bonus)?,
        })
    }

    /// Build from percent-denominated market rates
    pub fn from_market(rates: &MarketRates, liquidation_bonus: f64) -> CalcResult<Self> {
        Self::new(
            rates.supply_rate(),
            rates.borrow_rate(),
            rates.liquidation_threshold,
            rates.price,
            liquidation_bonus,
        )
    }
}

/// Project one year of a position built by [`LoopBuilder`] or
/// [`MaxSafeLoopSearch`](super::loops::MaxSafeLoopSearch)
///
/// Supply yield accrues on total collateral and borrow cost on total debt,
/// each compounded monthly for 12 periods.
pub fn project_iterative(position: &LoopPosition, params: &YieldParams) -> LoopResult {
    let gross_yield = position.collateral * compound(monthly_rate(params.supply_rate), MONTHS_PER_YEAR);
    let borrow_cost = position.debt * compound(monthly_rate(params.borrow_rate), MONTHS_PER_YEAR);
    let net_yield = gross_yield - borrow_cost;

    build_result(
        position,
        position.loops,
        net_yield,
        position.net_position() + net_yield,
        params,
    )
}

/// Project one year of the closed-form position at `ltv_target`
///
/// `loops` reports how many real cycles at `ltv_target` it takes for the
/// borrow increment to fall below `min_borrow`.
pub fn project_target_ltv(
    initial_amount: f64,
    ltv_target: f64,
    params: &YieldParams,
    min_borrow: f64,
) -> CalcResult<LoopResult> {
    let initial_amount = check::positive_amount("initial_amount", initial_amount)?;
    let builder = LoopBuilder::new(ltv_target, min_borrow)?;
    let loops = builder.converge(initial_amount)?.loops;

    let position = LoopPosition::at_target_ltv(initial_amount, ltv_target);
    let supply_daily = daily_rate(params.supply_rate);
    let borrow_daily = daily_rate(params.borrow_rate);

    let mut supply = position.collateral;
    let mut borrow = position.debt;
    for _ in 0..DAYS_PER_YEAR {
        supply *= 1.0 + supply_daily;
        borrow *= 1.0 + borrow_daily;
    }

    let final_position = supply - borrow;
    let net_yield = final_position - initial_amount;

    Ok(build_result(&position, loops, net_yield, final_position, params))
}

fn build_result(
    position: &LoopPosition,
    loops: u32,
    net_yield: f64,
    final_position: f64,
    params: &YieldParams,
) -> LoopResult {
    LoopResult {
        loops,
        net_apy: net_yield / position.initial_amount * 100.0,
        leverage: position.leverage(),
        eff_ltv: position.effective_ltv(),
        depeg_to_liq: position.depeg_to_liquidation(params.liquidation_threshold),
        annual_yield: net_yield,
        annual_usd: net_yield * params.price,
        final_position,
        liquidation_loss: position.debt * params.liquidation_bonus,
    }
}
