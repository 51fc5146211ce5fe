//! Position state tracked while building a looped position

/// Collateral and debt of a looped position, in collateral units
///
/// The swap between debt and collateral assets is assumed to be 1:1 (perfect
/// peg), so both sides share a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPosition {
    /// Amount deposited before any looping
    pub initial_amount: f64,

    /// Total supplied collateral
    pub collateral: f64,

    /// Total borrowed debt
    pub debt: f64,

    /// Borrow-swap-redeposit cycles committed so far
    pub loops: u32,
}

impl LoopPosition {
    /// Unlevered position: all collateral, no debt
    pub fn new(initial_amount: f64) -> Self {
        Self {
            initial_amount,
            collateral: initial_amount,
            debt: 0.0,
            loops: 0,
        }
    }

    /// Position implied by the closed-form leverage `1 / (1 - ltv)`
    ///
    /// This is the limit the iterative builder converges to; `loops` stays 0
    /// because no cycles were actually simulated.
    pub fn at_target_ltv(initial_amount: f64, ltv_target: f64) -> Self {
        let leverage = 1.0 / (1.0 - ltv_target);
        Self {
            initial_amount,
            collateral: initial_amount * leverage,
            debt: initial_amount * (leverage - 1.0),
            loops: 0,
        }
    }

    /// Room left to borrow against current collateral at `ltv`
    pub fn available_borrow(&self, ltv: f64) -> f64 {
        ltv * self.collateral - self.debt
    }

    /// Position after borrowing `amount` and redepositing it
    pub fn with_borrow(&self, amount: f64) -> Self {
        Self {
            initial_amount: self.initial_amount,
            collateral: self.collateral + amount,
            debt: self.debt + amount,
            loops: self.loops + 1,
        }
    }

    pub fn leverage(&self) -> f64 {
        if self.initial_amount <= 0.0 {
            1.0
        } else {
            self.collateral / self.initial_amount
        }
    }

    /// Debt / collateral
    pub fn effective_ltv(&self) -> f64 {
        if self.collateral <= 0.0 {
            0.0
        } else {
            self.debt / self.collateral
        }
    }

    pub fn net_position(&self) -> f64 {
        self.collateral - self.debt
    }

    /// Collateral price drop (in percent) that pushes effective LTV up to
    /// `liquidation_threshold`. Zero when already at or past it.
    pub fn depeg_to_liquidation(&self, liquidation_threshold: f64) -> f64 {
        if liquidation_threshold <= 0.0 {
            return 0.0;
        }
        ((1.0 - self.effective_ltv() / liquidation_threshold) * 100.0).max(0.0)
    }
}
